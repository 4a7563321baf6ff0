//! Shared builders and assertions for integration tests

#![allow(dead_code)]

use spothouse::config::{AppConfig, RoomSettings};
use spothouse::error::RoomError;
use spothouse::{DedupScope, IncomingSong, RoomStore, Song, VoteOrder};

/// Store with the default shared key scope
pub fn shared_store() -> RoomStore {
    RoomStore::new(RoomSettings::default())
}

/// Store where each room tracks its own keys
pub fn per_room_store() -> RoomStore {
    RoomStore::new(RoomSettings {
        dedup_scope: DedupScope::PerRoom,
        vote_order: VoteOrder::Descending,
    })
}

/// Configuration suitable for binding an ephemeral local port
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.http.host = "127.0.0.1".to_string();
    config.http.port = 0;
    config.service.shutdown_timeout_seconds = 5;
    config
}

/// A client-side song with placeholder metadata
pub fn song(name: &str, uri: &str) -> IncomingSong {
    IncomingSong {
        name: name.to_string(),
        artist: format!("{} Artist", name),
        artwork: format!("https://img.example/{}.jpg", uri),
        uri: uri.to_string(),
    }
}

/// A numbered playlist: `Track {prefix}-{i}` with uri `spotify:track:{prefix}-{i}`
pub fn playlist(prefix: &str, count: usize) -> Vec<IncomingSong> {
    (0..count)
        .map(|i| {
            song(
                &format!("Track {}-{}", prefix, i),
                &format!("spotify:track:{}-{}", prefix, i),
            )
        })
        .collect()
}

pub fn names(songs: &[Song]) -> Vec<&str> {
    songs.iter().map(|s| s.name.as_str()).collect()
}

pub fn scores(songs: &[Song]) -> Vec<i64> {
    songs.iter().map(|s| s.vote_count).collect()
}

/// Recover the typed room error behind an `anyhow::Error`
pub fn room_error(err: &anyhow::Error) -> &RoomError {
    err.downcast_ref::<RoomError>()
        .expect("operation should fail with a RoomError")
}
