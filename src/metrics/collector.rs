//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the spothouse room service
//! using Prometheus metrics.

use crate::room::store::RoomStoreStats;
use crate::types::VoteDirection;
use anyhow::Result;
use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the room service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Room lifecycle metrics
    room_metrics: RoomMetrics,

    /// Queue and vote metrics
    queue_metrics: QueueMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Room lifecycle metrics
#[derive(Clone)]
pub struct RoomMetrics {
    /// Rooms currently registered
    pub active_rooms: IntGauge,

    /// Total setup calls, including ones that overwrote an existing code
    pub rooms_created_total: IntCounter,

    /// Total participants admitted, hosts included
    pub participants_joined_total: IntCounterVec,
}

/// Queue and vote metrics
#[derive(Clone)]
pub struct QueueMetrics {
    /// Songs appended to a queue by reconciliation
    pub songs_admitted_total: IntCounter,

    /// Songs dropped by the display-name dedup pass
    pub songs_collapsed_total: IntCounter,

    /// Votes applied, by direction
    pub votes_total: IntCounterVec,

    /// Songs removed by track identifier
    pub songs_removed_total: IntCounter,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Room operation durations
    pub room_operation_duration: HistogramVec,

    /// Failed room operations by error kind
    pub room_errors_total: IntCounterVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let room_metrics = RoomMetrics::new(&registry)?;
        let queue_metrics = QueueMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            room_metrics,
            queue_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get room metrics
    pub fn room(&self) -> &RoomMetrics {
        &self.room_metrics
    }

    /// Get queue metrics
    pub fn queue(&self) -> &QueueMetrics {
        &self.queue_metrics
    }

    /// Get performance metrics
    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Set the current room count from store stats
    pub fn update_from_store_stats(&self, stats: &RoomStoreStats) {
        self.room_metrics
            .active_rooms
            .set(stats.active_rooms as i64);
    }

    /// Record a room being set up
    pub fn record_room_created(&self, active_rooms: usize) {
        self.room_metrics.rooms_created_total.inc();
        self.room_metrics
            .participants_joined_total
            .with_label_values(&["host"])
            .inc();
        self.room_metrics.active_rooms.set(active_rooms as i64);
    }

    /// Record a guest joining a room
    pub fn record_guest_joined(&self) {
        self.room_metrics
            .participants_joined_total
            .with_label_values(&["guest"])
            .inc();
    }

    /// Record the outcome of one reconciliation
    pub fn record_reconcile(&self, admitted: usize, collapsed: usize) {
        self.queue_metrics
            .songs_admitted_total
            .inc_by(admitted as u64);
        self.queue_metrics
            .songs_collapsed_total
            .inc_by(collapsed as u64);
    }

    /// Record a vote
    pub fn record_vote(&self, direction: VoteDirection) {
        self.queue_metrics
            .votes_total
            .with_label_values(&[direction.as_str()])
            .inc();
    }

    /// Record songs removed from a queue
    pub fn record_songs_removed(&self, count: usize) {
        self.queue_metrics.songs_removed_total.inc_by(count as u64);
    }

    /// Record room operation duration
    pub fn record_room_operation(&self, operation: &str, duration: Duration) {
        self.performance_metrics
            .room_operation_duration
            .with_label_values(&[operation])
            .observe(duration.as_secs_f64());
    }

    /// Record a failed room operation
    pub fn record_room_error(&self, operation: &str, kind: &str) {
        self.performance_metrics
            .room_errors_total
            .with_label_values(&[operation, kind])
            .inc();
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl RoomMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let active_rooms = IntGauge::new("spothouse_active_rooms", "Number of registered rooms")?;
        registry.register(Box::new(active_rooms.clone()))?;

        let rooms_created_total =
            IntCounter::new("spothouse_rooms_created_total", "Total rooms set up")?;
        registry.register(Box::new(rooms_created_total.clone()))?;

        let participants_joined_total = IntCounterVec::new(
            Opts::new(
                "spothouse_participants_joined_total",
                "Total participants admitted to rooms",
            ),
            &["role"],
        )?;
        registry.register(Box::new(participants_joined_total.clone()))?;

        Ok(Self {
            active_rooms,
            rooms_created_total,
            participants_joined_total,
        })
    }
}

impl QueueMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let songs_admitted_total = IntCounter::new(
            "spothouse_songs_admitted_total",
            "Songs admitted to room queues",
        )?;
        registry.register(Box::new(songs_admitted_total.clone()))?;

        let songs_collapsed_total = IntCounter::new(
            "spothouse_songs_collapsed_total",
            "Songs dropped as duplicate display names",
        )?;
        registry.register(Box::new(songs_collapsed_total.clone()))?;

        let votes_total = IntCounterVec::new(
            Opts::new("spothouse_votes_total", "Votes applied to songs"),
            &["direction"],
        )?;
        registry.register(Box::new(votes_total.clone()))?;

        let songs_removed_total = IntCounter::new(
            "spothouse_songs_removed_total",
            "Songs removed from room queues",
        )?;
        registry.register(Box::new(songs_removed_total.clone()))?;

        Ok(Self {
            songs_admitted_total,
            songs_collapsed_total,
            votes_total,
            songs_removed_total,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let room_operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "spothouse_room_operation_duration_seconds",
                "Room operation duration",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]),
            &["operation"],
        )?;
        registry.register(Box::new(room_operation_duration.clone()))?;

        let room_errors_total = IntCounterVec::new(
            Opts::new("spothouse_room_errors_total", "Failed room operations"),
            &["operation", "kind"],
        )?;
        registry.register(Box::new(room_errors_total.clone()))?;

        Ok(Self {
            room_operation_duration,
            room_errors_total,
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}
