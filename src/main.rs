//! Entry point for the spothouse listening-party service
//!
//! Loads configuration, initializes logging, serves the room API and shuts
//! down gracefully on SIGINT/SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use spothouse::config::{validate_config, AppConfig};
use spothouse::service::{HealthCheck, Service};
use spothouse::{DedupScope, VoteOrder};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::signal;
use tracing::{error, info, warn};

/// Interval between health summaries in the log
const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Spothouse - shared song queues with voting for listening parties
#[derive(Parser)]
#[command(
    name = "spothouse",
    version,
    about = "Collaborative listening-party backend: shared rooms, song queues and voting",
    long_about = "Spothouse keeps in-memory listening rooms. Participants join a room by code, \
                 submit their local song lists, which are merged and deduplicated into one \
                 shared queue, and vote songs up or down to reorder it."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Check a running instance and exit
    #[arg(long, help = "Query the configured address and exit with status code")]
    health_check: bool,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// HTTP port override
    #[arg(short, long, value_name = "PORT", help = "Override HTTP listen port")]
    port: Option<u16>,

    /// HTTP host override
    #[arg(long, value_name = "HOST", help = "Override HTTP listen host")]
    host: Option<String>,

    /// Static file directory
    #[arg(
        long,
        value_name = "DIR",
        help = "Serve files from this directory for unmatched paths"
    )]
    static_dir: Option<PathBuf>,

    /// Dedup key scope override
    #[arg(
        long,
        value_name = "SCOPE",
        help = "Scope of known track identifiers (shared, per-room)"
    )]
    dedup_scope: Option<DedupScope>,

    /// Vote order override
    #[arg(
        long,
        value_name = "ORDER",
        help = "Queue order by vote count (descending, ascending)"
    )]
    vote_order: Option<VoteOrder>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and exit without starting service"
    )]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Request `/alive` from the configured address; true on a 200 response
async fn query_liveness(config: &AppConfig) -> Result<bool> {
    let host = match config.http.host.as_str() {
        "0.0.0.0" => "127.0.0.1",
        other => other,
    };
    let address = format!("{}:{}", host, config.http.port);

    let mut stream = tokio::time::timeout(Duration::from_secs(5), TcpStream::connect(&address))
        .await
        .context("Timed out connecting")?
        .with_context(|| format!("Failed to connect to {}", address))?;

    let request = format!(
        "GET /alive HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        address
    );
    stream.write_all(request.as_bytes()).await?;

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await?;
    let response = String::from_utf8_lossy(&response);

    let status_line = response.lines().next().unwrap_or_default();
    info!("Liveness request {} -> {}", address, status_line);
    Ok(status_line.split_whitespace().nth(1) == Some("200"))
}

/// Perform health check and return appropriate exit code
async fn perform_health_check(config: AppConfig) -> Result<()> {
    info!("Performing health check...");

    match query_liveness(&config).await {
        Ok(true) => {
            println!("Health Check: ✅ alive");
            std::process::exit(0);
        }
        Ok(false) => {
            println!("Health Check: ❌ not alive");
            std::process::exit(1);
        }
        Err(e) => {
            error!("Health check failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("🎵 Spothouse Listening Party Service");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   Listen: {}", config.listen_address());
    match &config.http.static_dir {
        Some(dir) => info!("   Static files: {}", dir.display()),
        None => info!("   Static files: disabled"),
    }
    info!("   CORS any origin: {}", config.http.allow_any_origin);
    info!("   Dedup scope: {}", config.rooms.dedup_scope);
    info!("   Vote order: {}", config.rooms.vote_order);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

/// Load configuration from file or environment, then apply CLI overrides
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(port) = args.port {
        config.http.port = port;
    }

    if let Some(host) = &args.host {
        config.http.host = host.clone();
    }

    if let Some(dir) = &args.static_dir {
        config.http.static_dir = Some(dir.clone());
    }

    if let Some(scope) = args.dedup_scope {
        config.rooms.dedup_scope = scope;
    }

    if let Some(order) = args.vote_order {
        config.rooms.vote_order = order;
    }

    validate_config(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if args.health_check {
        return perform_health_check(config).await;
    }

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    display_startup_banner(&config);

    let mut service = match Service::new(config.clone()) {
        Ok(service) => service,
        Err(e) => {
            error!("Failed to initialize service: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = service.start().await {
        error!("Failed to start service: {}", e);
        std::process::exit(1);
    }

    let health_task = {
        let app_state = service.app_state().clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(HEALTH_LOG_INTERVAL);
            interval.tick().await;

            while app_state.is_running().await {
                interval.tick().await;

                match HealthCheck::check(&app_state).await {
                    Ok(health) => info!(
                        "Health check: {} - {} active rooms, {} votes cast",
                        health.status, health.stats.active_rooms, health.stats.votes_cast
                    ),
                    Err(e) => warn!("Health check failed: {}", e),
                }
            }
        })
    };

    info!("✅ Spothouse is running");
    info!("Press Ctrl+C to shutdown gracefully...");

    wait_for_shutdown_signal().await;

    info!("🛑 Shutdown signal received, beginning graceful shutdown...");
    health_task.abort();

    if let Err(e) = service.shutdown().await {
        warn!("⚠️  Shutdown completed with errors: {}", e);
    }

    info!("🛑 Spothouse stopped");
    Ok(())
}
