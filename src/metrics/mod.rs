//! Metrics and monitoring for the spothouse room service
//!
//! Prometheus counters, gauges and histograms for room lifecycle, queue
//! reconciliation, voting and per-operation latency. The registry is served
//! as text by the `/metrics` route.

pub mod collector;

pub use collector::{
    MetricsCollector, MetricsTimer, PerformanceMetrics, QueueMetrics, RoomMetrics,
};
