//! Application state and service coordination
//!
//! `AppState` is the cheaply cloned handle every request sees. `Service`
//! owns the HTTP server and the background tasks and drives startup and
//! graceful shutdown.

use crate::config::AppConfig;
use crate::http::HttpServer;
use crate::metrics::MetricsCollector;
use crate::room::RoomStore;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

/// Interval between metric refreshes from store statistics
const STATS_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("HTTP server error: {message}")]
    Http { message: String },

    #[error("Background task error: {message}")]
    BackgroundTask { message: String },
}

/// Shared application state handed to every request
#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    room_store: RoomStore,
    metrics_collector: Arc<MetricsCollector>,
    is_running: Arc<RwLock<bool>>,
    started_at: Instant,
}

impl AppState {
    /// Build the room store and metrics from configuration
    pub fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!("Initializing {} room service", config.service.name);
        info!(
            "Configuration: listen={}, dedup_scope={}, vote_order={:?}",
            config.listen_address(),
            config.rooms.dedup_scope,
            config.rooms.vote_order
        );

        let metrics_collector =
            Arc::new(
                MetricsCollector::new().map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create metrics collector: {}", e),
                })?,
            );

        let room_store = RoomStore::with_metrics(config.rooms.clone(), metrics_collector.clone());

        Ok(Self {
            config: Arc::new(config),
            room_store,
            metrics_collector,
            is_running: Arc::new(RwLock::new(false)),
            started_at: Instant::now(),
        })
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get the room store
    pub fn room_store(&self) -> &RoomStore {
        &self.room_store
    }

    /// Get the metrics collector
    pub fn metrics_collector(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Time since the state was built
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    async fn set_running(&self, running: bool) {
        *self.is_running.write().await = running;
    }
}

/// The running service: HTTP server plus background tasks
pub struct Service {
    app_state: AppState,
    http_server: Arc<HttpServer>,
    server_task: Option<JoinHandle<()>>,
    background_tasks: Vec<JoinHandle<()>>,
}

impl Service {
    pub fn new(config: AppConfig) -> Result<Self, ServiceError> {
        let http_config = config.http.clone();
        let app_state = AppState::new(config)?;
        let http_server = Arc::new(HttpServer::new(http_config, app_state.clone()));

        Ok(Self {
            app_state,
            http_server,
            server_task: None,
            background_tasks: Vec::new(),
        })
    }

    pub fn app_state(&self) -> &AppState {
        &self.app_state
    }

    /// Bind the listener and start serving; returns the bound address
    pub async fn start(&mut self) -> Result<SocketAddr, ServiceError> {
        info!("Starting {} room service", self.app_state.config().service.name);

        let listener = self
            .http_server
            .bind()
            .await
            .map_err(|e| ServiceError::Http {
                message: format!("{:#}", e),
            })?;
        let addr = listener.local_addr().map_err(|e| ServiceError::Http {
            message: format!("Failed to read bound address: {}", e),
        })?;

        self.app_state.set_running(true).await;

        let server = self.http_server.clone();
        self.server_task = Some(tokio::spawn(async move {
            if let Err(e) = server.serve(listener).await {
                error!("HTTP server failed: {}", e);
            }
        }));

        self.start_background_tasks();

        info!("✅ Room service listening on {}", addr);
        Ok(addr)
    }

    /// Graceful shutdown: stop accepting requests, drain, stop tasks
    pub async fn shutdown(&mut self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown");

        self.app_state.set_running(false).await;

        if let Err(e) = self.http_server.stop().await {
            warn!("Failed to signal HTTP server: {}", e);
        }

        if let Some(task) = self.server_task.take() {
            let timeout = self.app_state.config().shutdown_timeout();
            match tokio::time::timeout(timeout, task).await {
                Ok(Ok(())) => info!("✅ HTTP server drained"),
                Ok(Err(e)) => warn!("HTTP server task ended abnormally: {}", e),
                Err(_) => warn!(
                    "HTTP server did not drain within {}s",
                    timeout.as_secs()
                ),
            }
        }

        self.stop_background_tasks();

        let final_stats =
            self.app_state
                .room_store()
                .stats()
                .map_err(|e| ServiceError::BackgroundTask {
                    message: format!("Failed to get final stats: {}", e),
                })?;
        info!("Final room statistics: {:?}", final_stats);
        info!("✅ Room service shutdown completed");

        Ok(())
    }

    fn start_background_tasks(&mut self) {
        let store = self.app_state.room_store().clone();
        let metrics_collector = self.app_state.metrics_collector();
        let is_running = self.app_state.is_running.clone();

        let stats_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(STATS_REFRESH_INTERVAL);
            debug!("Metrics refresh task started");

            while *is_running.read().await {
                interval.tick().await;

                match store.stats() {
                    Ok(stats) => {
                        debug!(
                            "Refreshing metrics - rooms: {}, votes: {}",
                            stats.active_rooms, stats.votes_cast
                        );
                        metrics_collector.update_from_store_stats(&stats);
                    }
                    Err(e) => warn!("Failed to read store stats for metrics: {}", e),
                }
            }

            debug!("Metrics refresh task stopped");
        });

        self.background_tasks.push(stats_task);
    }

    fn stop_background_tasks(&mut self) {
        let task_count = self.background_tasks.len();
        for task in self.background_tasks.drain(..) {
            task.abort();
        }
        debug!("Stopped {} background tasks", task_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IncomingSong;

    fn ephemeral_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.http.host = "127.0.0.1".to_string();
        config.http.port = 0;
        config.service.shutdown_timeout_seconds = 5;
        config
    }

    #[test]
    fn test_app_state_shares_store() {
        let state = AppState::new(AppConfig::default()).unwrap();
        let clone = state.clone();

        state.room_store().create_room(7, "Host").unwrap();
        clone
            .room_store()
            .reconcile(
                7,
                &[IncomingSong {
                    name: "Song".to_string(),
                    artist: String::new(),
                    artwork: String::new(),
                    uri: "spotify:track:1".to_string(),
                }],
            )
            .unwrap();

        let queue = state.room_store().queue(7).unwrap().unwrap();
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_not_running_until_started() {
        let state = AppState::new(AppConfig::default()).unwrap();
        assert!(!state.is_running().await);
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let mut service = Service::new(ephemeral_config()).unwrap();

        let addr = service.start().await.unwrap();
        assert_ne!(addr.port(), 0);
        assert!(service.app_state().is_running().await);

        service.shutdown().await.unwrap();
        assert!(!service.app_state().is_running().await);
    }
}
