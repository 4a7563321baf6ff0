//! Error types for the room service
//!
//! Core operations return `anyhow::Result` like the rest of the crate; the
//! typed `RoomError` variants are recovered at the HTTP boundary with
//! `downcast_ref` so each failure maps to a stable status and error code.

use crate::types::RoomCode;

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific room scenarios
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("Room not found: {code}")]
    RoomNotFound { code: RoomCode },

    #[error("Invalid room code format: {value:?}")]
    InvalidCodeFormat { value: String },

    #[error("Precondition violated: {reason}")]
    PreconditionViolation { reason: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}

impl RoomError {
    /// Short machine-readable name, used for error bodies and metric labels
    pub fn kind(&self) -> &'static str {
        match self {
            RoomError::RoomNotFound { .. } => "room_not_found",
            RoomError::InvalidCodeFormat { .. } => "invalid_code_format",
            RoomError::PreconditionViolation { .. } => "precondition_violation",
            RoomError::InternalError { .. } => "internal_error",
        }
    }

    pub(crate) fn lock_poisoned(what: &str) -> Self {
        RoomError::InternalError {
            message: format!("Failed to acquire {} lock", what),
        }
    }
}
