//! Room state for the listening-party service
//!
//! This module owns the per-room song queues and rosters, the reconciliation
//! of client-reported playlists against server state, and vote ranking.

pub mod instance;
pub mod ranking;
pub mod reconcile;
pub mod store;

// Re-export commonly used types
pub use instance::Room;
pub use reconcile::Merge;
pub use store::{RoomStore, RoomStoreStats};
