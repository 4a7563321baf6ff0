//! HTTP server hosting the room API, health checks and Prometheus metrics
//!
//! One axum router serves the room operations as JSON POST routes alongside
//! the monitoring endpoints. CORS answers every origin when enabled, and an
//! optional static directory handles any path no route claims.

use crate::config::HttpSettings;
use crate::http::handlers;
use crate::service::app::AppState;
use crate::service::health::{HealthCheck, HealthStatus};
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Shared state for every route
#[derive(Clone)]
pub struct HttpServerState {
    pub app_state: AppState,
}

/// HTTP server for the room API and monitoring endpoints
pub struct HttpServer {
    config: HttpSettings,
    state: HttpServerState,
    shutdown_tx: broadcast::Sender<()>,
}

impl HttpServer {
    /// Create a new HTTP server
    pub fn new(config: HttpSettings, app_state: AppState) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            state: HttpServerState { app_state },
            shutdown_tx,
        }
    }

    /// Bind the configured address
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .context("Invalid HTTP server address")?;

        TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind HTTP server to {}", addr))
    }

    /// Bind and serve until stopped
    pub async fn start(&self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener until stopped
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let app = self.create_router();
        let addr = listener.local_addr()?;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        info!("HTTP server listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("HTTP server shutdown signal received");
            })
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Create the Axum router with all endpoints
    pub fn create_router(&self) -> Router {
        let mut router = Router::new()
            .route("/setup", post(handlers::setup))
            .route("/join", post(handlers::join))
            .route("/queue", post(handlers::submit_queue))
            .route("/rankings", post(handlers::rankings))
            .route("/remove", post(handlers::remove))
            .route("/getBackQueue", post(handlers::get_queue))
            .route("/health", get(health_handler))
            .route("/ready", get(ready_handler))
            .route("/alive", get(alive_handler))
            .route("/metrics", get(metrics_handler))
            .route("/stats", get(stats_handler))
            .with_state(self.state.clone());

        if let Some(dir) = &self.config.static_dir {
            router = router.fallback_service(ServeDir::new(dir));
        }

        if self.config.allow_any_origin {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        router.layer(TraceLayer::new_for_http())
    }

    /// Stop the server
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping HTTP server...");

        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal to HTTP server: {}", e);
        }

        Ok(())
    }
}

/// Lightweight health check endpoint handler
async fn health_handler(State(state): State<HttpServerState>) -> impl IntoResponse {
    debug!("Health check requested");

    let service = state.app_state.config().service.name.clone();
    let (status, label) = match HealthCheck::liveness_check(&state.app_state).await {
        HealthStatus::Healthy => (StatusCode::OK, "healthy"),
        HealthStatus::Degraded => (StatusCode::OK, "degraded"),
        HealthStatus::Unhealthy => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
    };

    (
        status,
        Json(json!({
            "status": label,
            "service": service,
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Readiness check endpoint handler
async fn ready_handler(State(state): State<HttpServerState>) -> impl IntoResponse {
    debug!("Readiness check requested");

    match HealthCheck::readiness_check(&state.app_state).await {
        HealthStatus::Healthy => (StatusCode::OK, "Ready"),
        HealthStatus::Degraded => (StatusCode::OK, "Degraded but ready"),
        HealthStatus::Unhealthy => (StatusCode::SERVICE_UNAVAILABLE, "Not ready"),
    }
}

/// Liveness check endpoint handler
async fn alive_handler(State(state): State<HttpServerState>) -> impl IntoResponse {
    match HealthCheck::liveness_check(&state.app_state).await {
        HealthStatus::Healthy => (StatusCode::OK, "Alive"),
        _ => (StatusCode::SERVICE_UNAVAILABLE, "Not alive"),
    }
}

/// Prometheus metrics endpoint handler
async fn metrics_handler(State(state): State<HttpServerState>) -> Response {
    let registry = state.app_state.metrics_collector().registry();
    let metric_families = registry.gather();
    let encoder = TextEncoder::new();

    match encoder.encode_to_string(&metric_families) {
        Ok(metrics_output) => {
            debug!("Serving {} metric families", metric_families.len());
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, encoder.format_type().to_string())],
                metrics_output,
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics".to_string(),
            )
                .into_response()
        }
    }
}

/// Detailed service statistics endpoint handler
async fn stats_handler(State(state): State<HttpServerState>) -> impl IntoResponse {
    let service = state.app_state.config().service.name.clone();
    let room_list = state
        .app_state
        .room_store()
        .room_summaries()
        .unwrap_or_else(|e| {
            warn!("Failed to list rooms for stats: {}", e);
            Vec::new()
        });

    match HealthCheck::check(&state.app_state).await {
        Ok(health) => (
            StatusCode::OK,
            Json(json!({
                "service": {
                    "name": service,
                    "version": env!("CARGO_PKG_VERSION"),
                    "status": health.status,
                    "uptime": health.stats.uptime_info
                },
                "rooms": {
                    "active": health.stats.active_rooms,
                    "created": health.stats.rooms_created,
                    "dedup_scope": state.app_state.config().rooms.dedup_scope,
                    "list": room_list,
                },
                "activity": {
                    "participants_joined": health.stats.participants_joined,
                    "songs_admitted": health.stats.songs_admitted,
                    "votes_cast": health.stats.votes_cast,
                    "songs_removed": health.stats.songs_removed
                },
                "components": health.checks,
                "timestamp": chrono::Utc::now()
            })),
        ),
        Err(e) => {
            error!("Failed to get stats: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "service": {
                        "name": service,
                        "version": env!("CARGO_PKG_VERSION"),
                        "status": "error"
                    },
                    "error": "Failed to get service stats",
                    "timestamp": chrono::Utc::now()
                })),
            )
        }
    }
}
