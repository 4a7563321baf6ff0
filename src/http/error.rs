//! HTTP error type and its response mapping

use crate::error::RoomError;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, error};

/// Errors surfaced by the room API handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Room(RoomError),

    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Internal error: {0}")]
    Internal(anyhow::Error),
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Room(RoomError::RoomNotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Room(RoomError::PreconditionViolation { .. }) => StatusCode::CONFLICT,
            ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            // Unparseable codes have always been reported as server errors
            ApiError::Room(RoomError::InvalidCodeFormat { .. })
            | ApiError::Room(RoomError::InternalError { .. })
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Room(room) => room.kind(),
            ApiError::MalformedBody(_) => "malformed_body",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl From<RoomError> for ApiError {
    fn from(err: RoomError) -> Self {
        ApiError::Room(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<RoomError>() {
            Ok(room) => ApiError::Room(room),
            Err(other) => ApiError::Internal(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            debug!("Request rejected: {}", self);
        }

        let body = json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        });

        (status, Json(body)).into_response()
    }
}
