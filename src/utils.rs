//! Utility functions for the room service

use crate::error::RoomError;
use crate::types::RoomCode;
use chrono::{DateTime, Utc};

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Parse a client-supplied room code
///
/// Codes travel as decimal strings. Surrounding whitespace is not accepted.
pub fn parse_room_code(value: &str) -> Result<RoomCode, RoomError> {
    value
        .parse::<RoomCode>()
        .map_err(|_| RoomError::InvalidCodeFormat {
            value: value.to_string(),
        })
}

/// Lenient boolean parse: only a case-insensitive "true" is true
pub fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}
