//! HTTP transport for the room service
//!
//! JSON request/response schemas, axum handlers that delegate to the room
//! store, and the server that hosts them together with health and metrics
//! endpoints.

pub mod error;
pub mod handlers;
pub mod messages;
pub mod server;

pub use error::ApiError;
pub use server::{HttpServer, HttpServerState};
