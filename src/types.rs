//! Common types used throughout the room service

use serde::{Deserialize, Serialize};

/// Client-supplied numeric room identifier
pub type RoomCode = i32;

/// Status annotation given to every newly admitted song
pub const DEFAULT_SONG_STATUS: &str = "NA";

/// One entry in a room's song queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub name: String,
    pub artist: String,
    #[serde(rename = "artwork")]
    pub artwork_url: String,
    /// Unique external identifier, also the dedup key
    #[serde(rename = "uri")]
    pub track_uri: String,
    pub status: String,
    pub vote_count: i64,
}

impl Song {
    /// Build a freshly admitted song with no votes
    pub fn admitted(incoming: &IncomingSong) -> Self {
        Self {
            name: incoming.name.clone(),
            artist: incoming.artist.clone(),
            artwork_url: incoming.artwork.clone(),
            track_uri: incoming.uri.clone(),
            status: DEFAULT_SONG_STATUS.to_string(),
            vote_count: 0,
        }
    }
}

/// A song as reported by a client's local playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingSong {
    pub name: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub artwork: String,
    pub uri: String,
}

/// A member of a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub display_name: String,
    pub is_host: bool,
}

impl Participant {
    pub fn host(name: impl Into<String>) -> Self {
        Self {
            display_name: name.into(),
            is_host: true,
        }
    }

    pub fn guest(name: impl Into<String>) -> Self {
        Self {
            display_name: name.into(),
            is_host: false,
        }
    }
}

/// Which rooms share a dedup key set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupScope {
    /// One process-wide key set for every room
    Shared,
    /// Each room tracks its own keys
    PerRoom,
}

impl std::fmt::Display for DedupScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DedupScope::Shared => write!(f, "shared"),
            DedupScope::PerRoom => write!(f, "per_room"),
        }
    }
}

impl std::str::FromStr for DedupScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shared" => Ok(DedupScope::Shared),
            "per_room" | "per-room" => Ok(DedupScope::PerRoom),
            other => Err(format!("unknown dedup scope: {}", other)),
        }
    }
}

/// Direction of the vote-ranked queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteOrder {
    /// Highest vote count first
    Descending,
    /// Lowest vote count first
    Ascending,
}

impl std::str::FromStr for VoteOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "descending" | "desc" => Ok(VoteOrder::Descending),
            "ascending" | "asc" => Ok(VoteOrder::Ascending),
            other => Err(format!("unknown vote order: {}", other)),
        }
    }
}

impl std::fmt::Display for VoteOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoteOrder::Descending => write!(f, "descending"),
            VoteOrder::Ascending => write!(f, "ascending"),
        }
    }
}

/// Direction of a single vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn from_increase(is_increase: bool) -> Self {
        if is_increase {
            VoteDirection::Up
        } else {
            VoteDirection::Down
        }
    }

    pub fn delta(self) -> i64 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VoteDirection::Up => "up",
            VoteDirection::Down => "down",
        }
    }
}

/// Queue and roster of a room after an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub code: RoomCode,
    pub songs: Vec<Song>,
    pub participants: Vec<Participant>,
}

/// Occupancy and activity of one room, for monitoring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub code: RoomCode,
    pub host: Option<String>,
    pub participants: usize,
    pub songs: usize,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_activity: chrono::DateTime<chrono::Utc>,
}

/// Result of admitting a guest into a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSnapshot {
    /// Whether the room already had a song queue when the guest arrived
    pub queue_exists: bool,
    pub room: RoomSnapshot,
}

/// Ranked queue after a vote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteOutcome {
    pub songs: Vec<Song>,
    /// Name that was voted on, echoed for client-side highlighting
    pub song_name: String,
    /// Number of queue entries whose score changed
    pub matched: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_wire_field_names() {
        let song = Song {
            name: "Song1".to_string(),
            artist: "Artist".to_string(),
            artwork_url: "http://img".to_string(),
            track_uri: "spotify:track:1".to_string(),
            status: DEFAULT_SONG_STATUS.to_string(),
            vote_count: 3,
        };

        let value = serde_json::to_value(&song).unwrap();
        assert_eq!(value["artwork"], "http://img");
        assert_eq!(value["uri"], "spotify:track:1");
        assert_eq!(value["voteCount"], 3);
        assert_eq!(value["status"], "NA");
    }

    #[test]
    fn test_admitted_song_defaults() {
        let incoming = IncomingSong {
            name: "Song1".to_string(),
            artist: "A".to_string(),
            artwork: "art".to_string(),
            uri: "u1".to_string(),
        };
        let song = Song::admitted(&incoming);
        assert_eq!(song.vote_count, 0);
        assert_eq!(song.status, "NA");
        assert_eq!(song.artwork_url, "art");
    }

    #[test]
    fn test_dedup_scope_parsing() {
        assert_eq!("shared".parse::<DedupScope>().unwrap(), DedupScope::Shared);
        assert_eq!("Per-Room".parse::<DedupScope>().unwrap(), DedupScope::PerRoom);
        assert!("global".parse::<DedupScope>().is_err());
    }

    #[test]
    fn test_vote_order_parsing() {
        assert_eq!("desc".parse::<VoteOrder>().unwrap(), VoteOrder::Descending);
        assert_eq!("Ascending".parse::<VoteOrder>().unwrap(), VoteOrder::Ascending);
        assert_eq!(
            VoteOrder::Ascending.to_string().parse::<VoteOrder>().unwrap(),
            VoteOrder::Ascending
        );
        assert!("random".parse::<VoteOrder>().is_err());
    }

    #[test]
    fn test_participant_json() {
        let value = serde_json::to_value(Participant::host("Alice")).unwrap();
        assert_eq!(value["displayName"], "Alice");
        assert_eq!(value["isHost"], true);
    }
}
