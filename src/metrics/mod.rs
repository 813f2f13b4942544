//! Metrics for the elo-board service
//!
//! Counters and histograms describing recorded matches and player churn,
//! exported in the Prometheus text format by the HTTP API.

pub mod collector;

pub use collector::MetricsCollector;
