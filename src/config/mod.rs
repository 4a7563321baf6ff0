//! Configuration management for the spothouse service
//!
//! This module handles configuration loading from environment variables and
//! TOML files, validation, and default values for the room service.

pub mod app;
pub mod rooms;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, HttpSettings, ServiceSettings};
pub use rooms::RoomSettings;
