//! Room instance and its owned state
//!
//! A room owns one song queue, one participant roster and, when dedup keys
//! are scoped per room, its own set of known track identifiers.

use crate::room::reconcile::Merge;
use crate::types::{Participant, RoomCode, RoomSnapshot, RoomSummary, Song};
use crate::utils::current_timestamp;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// A single listening room
#[derive(Debug, Clone)]
pub struct Room {
    code: RoomCode,
    songs: Vec<Song>,
    participants: Vec<Participant>,
    /// Known track identifiers; only consulted under per-room dedup scope
    keys: HashSet<String>,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

impl Room {
    /// Create a room whose roster holds only the host
    pub fn new(code: RoomCode, host_name: impl Into<String>) -> Self {
        let now = current_timestamp();
        Self {
            code,
            songs: Vec::new(),
            participants: vec![Participant::host(host_name)],
            keys: HashSet::new(),
            created_at: now,
            last_activity: now,
        }
    }

    pub fn code(&self) -> RoomCode {
        self.code
    }

    /// Queue in its current order
    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    /// Roster in join order; the first entry is the host
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Track identifiers this room has seen
    pub fn keys(&self) -> &HashSet<String> {
        &self.keys
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn host(&self) -> Option<&Participant> {
        self.participants.iter().find(|p| p.is_host)
    }

    /// Append a guest to the roster. Display names need not be unique.
    pub fn admit_guest(&mut self, guest_name: impl Into<String>) {
        self.participants.push(Participant::guest(guest_name));
        self.touch();
    }

    /// Install a computed merge; `keys` receives the merge's new keys
    pub(crate) fn apply_merge(&mut self, merge: Merge, keys: Option<&mut HashSet<String>>) {
        match keys {
            Some(shared) => shared.extend(merge.new_keys),
            None => self.keys.extend(merge.new_keys),
        }
        self.songs = merge.songs;
        self.touch();
    }

    /// Mutable queue access for in-place ranking
    pub(crate) fn songs_mut(&mut self) -> &mut Vec<Song> {
        self.touch();
        &mut self.songs
    }

    /// Drop every queue entry with the given track identifier and forget the
    /// key locally. Returns how many entries were dropped.
    pub(crate) fn remove_track(&mut self, track_uri: &str) -> usize {
        let before = self.songs.len();
        self.songs.retain(|song| song.track_uri != track_uri);
        self.keys.remove(track_uri);
        self.touch();
        before - self.songs.len()
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            code: self.code(),
            host: self.host().map(|p| p.display_name.clone()),
            participants: self.participants.len(),
            songs: self.songs.len(),
            created_at: self.created_at(),
            last_activity: self.last_activity(),
        }
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            code: self.code,
            songs: self.songs.clone(),
            participants: self.participants.clone(),
        }
    }

    fn touch(&mut self) {
        self.last_activity = current_timestamp();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IncomingSong;

    fn song(name: &str, uri: &str) -> Song {
        Song::admitted(&IncomingSong {
            name: name.to_string(),
            artist: String::new(),
            artwork: String::new(),
            uri: uri.to_string(),
        })
    }

    #[test]
    fn test_new_room_has_host_only() {
        let room = Room::new(101, "Alice");
        assert_eq!(room.code(), 101);
        assert!(room.songs().is_empty());
        assert_eq!(room.participants(), &[Participant::host("Alice")]);
        assert_eq!(room.host().unwrap().display_name, "Alice");
    }

    #[test]
    fn test_guests_append_in_order() {
        let mut room = Room::new(1, "Alice");
        room.admit_guest("Bob");
        room.admit_guest("Bob");

        let names: Vec<_> = room
            .participants()
            .iter()
            .map(|p| (p.display_name.as_str(), p.is_host))
            .collect();
        assert_eq!(names, vec![("Alice", true), ("Bob", false), ("Bob", false)]);
    }

    #[test]
    fn test_apply_merge_to_own_keys() {
        let mut room = Room::new(1, "Alice");
        let merge = Merge {
            songs: vec![song("A", "u1")],
            new_keys: vec!["u1".to_string()],
            admitted: 1,
            collapsed: 0,
        };
        room.apply_merge(merge, None);

        assert_eq!(room.songs().len(), 1);
        assert!(room.keys().contains("u1"));
    }

    #[test]
    fn test_apply_merge_to_shared_keys() {
        let mut room = Room::new(1, "Alice");
        let mut shared = HashSet::new();
        let merge = Merge {
            songs: vec![song("A", "u1")],
            new_keys: vec!["u1".to_string()],
            admitted: 1,
            collapsed: 0,
        };
        room.apply_merge(merge, Some(&mut shared));

        assert!(shared.contains("u1"));
        assert!(room.keys().is_empty());
    }

    #[test]
    fn test_remove_track() {
        let mut room = Room::new(1, "Alice");
        let merge = Merge {
            songs: vec![song("A", "u1"), song("B", "u2")],
            new_keys: vec!["u1".to_string(), "u2".to_string()],
            admitted: 2,
            collapsed: 0,
        };
        room.apply_merge(merge, None);

        assert_eq!(room.remove_track("u1"), 1);
        assert_eq!(room.remove_track("missing"), 0);
        assert_eq!(room.songs().len(), 1);
        assert_eq!(room.songs()[0].track_uri, "u2");
        assert!(!room.keys().contains("u1"));
    }

    #[test]
    fn test_summary_tracks_activity() {
        let mut room = Room::new(7, "Alice");
        let created = room.summary();
        assert_eq!(created.code, 7);
        assert_eq!(created.host.as_deref(), Some("Alice"));
        assert_eq!(created.participants, 1);
        assert_eq!(created.songs, 0);
        assert_eq!(created.created_at, created.last_activity);

        std::thread::sleep(std::time::Duration::from_millis(5));
        room.admit_guest("Bob");

        let joined = room.summary();
        assert_eq!(joined.participants, 2);
        assert_eq!(joined.created_at, created.created_at);
        assert!(joined.last_activity > created.last_activity);
    }
}
