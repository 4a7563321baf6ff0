//! Spothouse - collaborative listening-party backend
//!
//! Rooms hold a shared song queue and a participant roster. Clients submit
//! their local song lists, which are reconciled into the room queue with
//! track and name deduplication, and vote songs up or down to reorder it.

pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod room;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{Result, RoomError};
pub use types::*;

// Re-export key components
pub use room::{RoomStore, RoomStoreStats};
pub use service::{AppState, Service};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
