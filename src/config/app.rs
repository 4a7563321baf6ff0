//! Main application configuration
//!
//! This module defines the primary configuration structures for the spothouse
//! room service, including environment variable loading and validation.

use crate::config::rooms::RoomSettings;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub http: HttpSettings,
    pub rooms: RoomSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Interface to bind
    pub host: String,
    /// Port for the room API and health endpoints
    pub port: u16,
    /// Directory served for unmatched GET requests, if any
    pub static_dir: Option<PathBuf>,
    /// Answer every origin with `Access-Control-Allow-Origin: *`
    pub allow_any_origin: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "spothouse".to_string(),
            log_level: "info".to_string(),
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4567,
            static_dir: None,
            allow_any_origin: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&raw)?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Parse a TOML document; missing sections fall back to defaults
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Invalid TOML configuration")
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            self.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // HTTP settings; PORT is what hosting platforms assign
        if let Ok(host) = env::var("HTTP_HOST") {
            self.http.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            self.http.port = port
                .parse()
                .map_err(|_| anyhow!("Invalid PORT value: {}", port))?;
        }
        if let Ok(dir) = env::var("STATIC_DIR") {
            self.http.static_dir = if dir.is_empty() {
                None
            } else {
                Some(PathBuf::from(dir))
            };
        }
        if let Ok(allow) = env::var("CORS_ALLOW_ANY_ORIGIN") {
            self.http.allow_any_origin = allow
                .parse()
                .map_err(|_| anyhow!("Invalid CORS_ALLOW_ANY_ORIGIN value: {}", allow))?;
        }

        // Room settings
        if let Ok(scope) = env::var("DEDUP_SCOPE") {
            self.rooms.dedup_scope = scope
                .parse()
                .map_err(|e| anyhow!("Invalid DEDUP_SCOPE value: {}", e))?;
        }
        if let Ok(order) = env::var("VOTE_ORDER") {
            self.rooms.vote_order = order
                .parse()
                .map_err(|e| anyhow!("Invalid VOTE_ORDER value: {}", e))?;
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Socket address string for the HTTP listener
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.http.host, self.http.port)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.name.is_empty() {
        return Err(anyhow!("Service name cannot be empty"));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    if config.http.host.is_empty() {
        return Err(anyhow!("HTTP host cannot be empty"));
    }
    if config.http.port == 0 {
        return Err(anyhow!("HTTP port cannot be 0"));
    }
    if let Some(dir) = &config.http.static_dir {
        if !dir.is_dir() {
            return Err(anyhow!(
                "Static directory does not exist: {}",
                dir.display()
            ));
        }
    }

    Ok(())
}
