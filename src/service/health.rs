//! Health checks for readiness and liveness endpoints

use crate::service::app::AppState;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "✅ healthy"),
            HealthStatus::Degraded => write!(f, "⚠️  degraded"),
            HealthStatus::Unhealthy => write!(f, "❌ unhealthy"),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub checks: Vec<ComponentCheck>,
    pub stats: ServiceStats,
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    pub name: String,
    pub status: HealthStatus,
    /// Set when the component is not healthy
    pub message: Option<String>,
    pub duration_ms: u64,
}

/// Room statistics for health reporting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceStats {
    pub active_rooms: usize,
    pub rooms_created: u64,
    pub participants_joined: u64,
    pub songs_admitted: u64,
    pub votes_cast: u64,
    pub songs_removed: u64,
    pub uptime_info: String,
}

impl HealthCheck {
    /// Perform a full health check of the service
    pub async fn check(app_state: &AppState) -> Result<Self> {
        let mut checks = Vec::new();
        let mut overall_status = HealthStatus::Healthy;

        let service_check = Self::check_service_running(app_state).await;
        if service_check.status != HealthStatus::Healthy {
            overall_status = HealthStatus::Unhealthy;
        }
        checks.push(service_check);

        let store_check = Self::check_room_store(app_state);
        if store_check.status == HealthStatus::Unhealthy {
            overall_status = HealthStatus::Unhealthy;
        } else if store_check.status == HealthStatus::Degraded
            && overall_status == HealthStatus::Healthy
        {
            overall_status = HealthStatus::Degraded;
        }
        checks.push(store_check);

        let stats = Self::gather_service_stats(app_state);

        Ok(HealthCheck {
            status: overall_status,
            service: app_state.config().service.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now(),
            checks,
            stats,
        })
    }

    /// Liveness: the service has been started and not stopped
    pub async fn liveness_check(app_state: &AppState) -> HealthStatus {
        if app_state.is_running().await {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        }
    }

    /// Readiness: running and the room store is reachable
    pub async fn readiness_check(app_state: &AppState) -> HealthStatus {
        if !app_state.is_running().await {
            return HealthStatus::Unhealthy;
        }

        Self::check_room_store(app_state).status
    }

    async fn check_service_running(app_state: &AppState) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = if app_state.is_running().await {
            (HealthStatus::Healthy, None)
        } else {
            (
                HealthStatus::Unhealthy,
                Some("Service is not running".to_string()),
            )
        };

        ComponentCheck {
            name: "service_running".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// A poisoned store lock makes the store unusable
    fn check_room_store(app_state: &AppState) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = match app_state.room_store().stats() {
            Ok(_) => (HealthStatus::Healthy, None),
            Err(e) => {
                error!("Room store health check failed: {}", e);
                (
                    HealthStatus::Unhealthy,
                    Some(format!("Room store unavailable: {}", e)),
                )
            }
        };

        ComponentCheck {
            name: "room_store".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    fn gather_service_stats(app_state: &AppState) -> ServiceStats {
        let uptime_info = format!("Up {}s", app_state.uptime().as_secs());

        match app_state.room_store().stats() {
            Ok(stats) => ServiceStats {
                active_rooms: stats.active_rooms,
                rooms_created: stats.rooms_created,
                participants_joined: stats.participants_joined,
                songs_admitted: stats.songs_admitted,
                votes_cast: stats.votes_cast,
                songs_removed: stats.songs_removed,
                uptime_info,
            },
            Err(_) => ServiceStats {
                uptime_info,
                ..ServiceStats::default()
            },
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize health check: {}", e))
    }
}
