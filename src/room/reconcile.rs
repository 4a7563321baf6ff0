//! Merging a client's reported playlist into a room queue
//!
//! The merge is computed from borrowed state and returned as a [`Merge`];
//! callers commit it only once the whole computation has succeeded, so a
//! rejected request leaves both the queue and the key set untouched.
//!
//! Admission works on track identifiers: an incoming song is appended when
//! its identifier is missing from the known key set. Afterwards the whole
//! queue is collapsed by display name, keeping the earliest entry for each
//! name. The two passes are independent.

use crate::error::RoomError;
use crate::types::{IncomingSong, Song};
use std::collections::HashSet;

/// Outcome of a reconciliation, not yet applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merge {
    /// Queue after admission and name collapse
    pub songs: Vec<Song>,
    /// Identifiers to add to the known key set
    pub new_keys: Vec<String>,
    /// Songs appended by admission
    pub admitted: usize,
    /// Entries dropped by the name collapse
    pub collapsed: usize,
}

/// Compute the merged queue for `incoming` against `current` and `known`
pub fn merge(
    current: &[Song],
    known: &HashSet<String>,
    incoming: &[IncomingSong],
) -> Result<Merge, RoomError> {
    if let Some(position) = incoming.iter().position(|song| song.uri.is_empty()) {
        return Err(RoomError::PreconditionViolation {
            reason: format!("incoming song at position {} has an empty uri", position),
        });
    }

    let incoming_keys: HashSet<&str> = incoming.iter().map(|song| song.uri.as_str()).collect();

    // An incoming song is always in the incoming key set, so of the two
    // difference sets only the keys unknown to the server can admit it.
    let missing_from_known: HashSet<&str> = incoming_keys
        .iter()
        .copied()
        .filter(|uri| !known.contains(*uri))
        .collect();

    let mut songs = current.to_vec();
    let mut new_keys = Vec::new();
    let mut admitted_now: HashSet<&str> = HashSet::new();

    for song in incoming {
        let uri = song.uri.as_str();
        // A uri repeated within one batch is admitted once
        if missing_from_known.contains(uri) && admitted_now.insert(uri) {
            songs.push(Song::admitted(song));
            new_keys.push(song.uri.clone());
        }
    }
    let admitted = new_keys.len();

    let before = songs.len();
    let songs = collapse_by_name(songs);
    let collapsed = before - songs.len();

    Ok(Merge {
        songs,
        new_keys,
        admitted,
        collapsed,
    })
}

/// Keep the first entry for each display name, preserving order
pub fn collapse_by_name(songs: Vec<Song>) -> Vec<Song> {
    let mut seen: HashSet<String> = HashSet::new();
    songs
        .into_iter()
        .filter(|song| seen.insert(song.name.clone()))
        .collect()
}
