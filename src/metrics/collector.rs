//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the elo-board service using
//! Prometheus metrics.

use crate::types::Outcome;
use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

/// Main metrics collector for the leaderboard service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Matches recorded, by outcome
    pub matches_recorded_total: IntCounterVec,

    /// Match submissions rejected, by error kind
    pub match_failures_total: IntCounterVec,

    pub players_registered_total: IntCounter,

    pub players_removed_total: IntCounter,

    /// Players currently on the leaderboard
    pub players_active: IntGauge,

    /// Absolute rating change of player A per match
    pub rating_delta: Histogram,

    /// Time spent inside the pair lock recording a match
    pub record_duration_seconds: Histogram,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Arc::new(Registry::new()))
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let matches_recorded_total = IntCounterVec::new(
            Opts::new("elo_matches_recorded_total", "Total matches recorded"),
            &["outcome"],
        )?;
        let match_failures_total = IntCounterVec::new(
            Opts::new("elo_match_failures_total", "Total match submissions rejected"),
            &["reason"],
        )?;
        let players_registered_total = IntCounter::new(
            "elo_players_registered_total",
            "Total players registered",
        )?;
        let players_removed_total =
            IntCounter::new("elo_players_removed_total", "Total players removed")?;
        let players_active = IntGauge::new("elo_players_active", "Players on the leaderboard")?;
        let rating_delta = Histogram::with_opts(
            HistogramOpts::new("elo_rating_delta", "Absolute rating change per match")
                .buckets(vec![1.0, 2.0, 4.0, 8.0, 12.0, 16.0, 24.0, 32.0, 48.0, 64.0]),
        )?;
        let record_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "elo_record_duration_seconds",
            "Time taken to record a match",
        ))?;

        registry.register(Box::new(matches_recorded_total.clone()))?;
        registry.register(Box::new(match_failures_total.clone()))?;
        registry.register(Box::new(players_registered_total.clone()))?;
        registry.register(Box::new(players_removed_total.clone()))?;
        registry.register(Box::new(players_active.clone()))?;
        registry.register(Box::new(rating_delta.clone()))?;
        registry.register(Box::new(record_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            matches_recorded_total,
            match_failures_total,
            players_registered_total,
            players_removed_total,
            players_active,
            rating_delta,
            record_duration_seconds,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Record a successfully committed match
    pub fn record_match(&self, outcome: Outcome, delta_a: f64, duration: Duration) {
        self.matches_recorded_total
            .with_label_values(&[outcome.as_str()])
            .inc();
        self.rating_delta.observe(delta_a.abs());
        self.record_duration_seconds
            .observe(duration.as_secs_f64());
    }

    /// Record a rejected match submission
    pub fn record_match_failure(&self, reason: &str) {
        self.match_failures_total
            .with_label_values(&[reason])
            .inc();
    }

    pub fn record_player_registered(&self) {
        self.players_registered_total.inc();
        self.players_active.inc();
    }

    pub fn record_player_removed(&self) {
        self.players_removed_total.inc();
        self.players_active.dec();
    }

    /// Set the active player gauge from a full count
    pub fn set_active_players(&self, count: usize) {
        self.players_active.set(count as i64);
    }

    /// Render all metrics in the Prometheus text format
    pub fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
