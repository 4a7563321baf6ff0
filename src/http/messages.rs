//! Wire schemas for the room API
//!
//! Field names match what existing clients send and read, so most structs
//! rename to camelCase. Unknown request fields are ignored.

use crate::error::RoomError;
use crate::types::{
    IncomingSong, JoinSnapshot, Participant, RoomCode, RoomSnapshot, Song, VoteDirection,
    VoteOutcome,
};
use crate::utils::{parse_flag, parse_room_code};
use serde::{Deserialize, Serialize};

/// A room code as sent by a client: normally a decimal string, but some
/// clients send a bare JSON number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WireCode {
    Number(i64),
    Text(String),
    /// Fractions, booleans, objects: never a valid code
    Other(serde_json::Value),
}

impl WireCode {
    pub fn parse(&self) -> Result<RoomCode, RoomError> {
        match self {
            WireCode::Text(text) => parse_room_code(text),
            WireCode::Number(n) => RoomCode::try_from(*n).map_err(|_| {
                RoomError::InvalidCodeFormat {
                    value: n.to_string(),
                }
            }),
            WireCode::Other(value) => Err(RoomError::InvalidCodeFormat {
                value: value.to_string(),
            }),
        }
    }
}

/// A boolean that may arrive as `true` or as the string `"true"`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WireFlag {
    Bool(bool),
    Text(String),
}

impl WireFlag {
    pub fn value(&self) -> bool {
        match self {
            WireFlag::Bool(b) => *b,
            WireFlag::Text(text) => parse_flag(text),
        }
    }
}

/// `POST /setup`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupRequest {
    pub room_code: WireCode,
    pub host_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupResponse {
    /// Always the empty string; the new queue is empty
    pub song_list: String,
    pub name: String,
    pub user_list: Vec<Participant>,
}

impl From<RoomSnapshot> for SetupResponse {
    fn from(snapshot: RoomSnapshot) -> Self {
        Self {
            song_list: String::new(),
            name: String::new(),
            user_list: snapshot.participants,
        }
    }
}

/// `POST /join`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    /// Room code to join
    pub query: WireCode,
    pub guest_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub name: String,
    /// 1 if the room has a song queue, else 0
    pub exists: u8,
    pub backend_songs: Option<Vec<Song>>,
    pub code: RoomCode,
    pub user_list: Vec<Participant>,
}

impl From<JoinSnapshot> for JoinResponse {
    fn from(joined: JoinSnapshot) -> Self {
        let JoinSnapshot { queue_exists, room } = joined;
        Self {
            name: String::new(),
            exists: u8::from(queue_exists),
            backend_songs: queue_exists.then_some(room.songs),
            code: room.code,
            user_list: room.participants,
        }
    }
}

/// `POST /queue`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRequest {
    #[serde(default)]
    pub songs: Vec<IncomingSong>,
    pub room_code: WireCode,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueResponse {
    pub song_list: Vec<Song>,
    pub user_list: Vec<Participant>,
}

impl From<RoomSnapshot> for QueueResponse {
    fn from(snapshot: RoomSnapshot) -> Self {
        Self {
            song_list: snapshot.songs,
            user_list: snapshot.participants,
        }
    }
}

/// `POST /rankings`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingRequest {
    /// Display name of the song voted on
    pub to_change: String,
    pub r_code: WireCode,
    pub is_increase: WireFlag,
}

impl RankingRequest {
    pub fn direction(&self) -> VoteDirection {
        VoteDirection::from_increase(self.is_increase.value())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingResponse {
    pub song_list: Vec<Song>,
    pub name: String,
}

impl From<VoteOutcome> for RankingResponse {
    fn from(outcome: VoteOutcome) -> Self {
        Self {
            song_list: outcome.songs,
            name: outcome.song_name,
        }
    }
}

/// `POST /remove`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveRequest {
    pub song_uri: String,
    pub code: WireCode,
}

/// Carries the remaining dedup keys, not the queue
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveResponse {
    pub song_set: Vec<String>,
}

/// `POST /getBackQueue`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetQueueRequest {
    pub room_code: WireCode,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetQueueResponse {
    /// `null` when the room was never set up
    pub song_list: Option<Vec<Song>>,
}
