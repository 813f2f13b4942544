//! Leaderboard service
//!
//! Coordinates the rating processor with a [`MatchLedger`]. Recording a match
//! reads both players fresh from the store, applies the result, and commits
//! the outcome while holding both players' locks, so two submissions for the
//! same player can never compute from the same stale rating.

use crate::config::{AppConfig, RatingConfig};
use crate::error::{LeaderboardError, Result};
use crate::metrics::MetricsCollector;
use crate::rating::elo::validate_score;
use crate::rating::{update_ratings, MatchResultProcessor};
use crate::service::pair_lock::PairLocks;
use crate::storage::MatchLedger;
use crate::types::{AppliedResult, GameResult, Outcome, PlayerRecord};
use crate::utils::{normalize_player_name, sort_by_rating_desc, MAX_PLAYER_NAME_LEN};
use std::cell::Cell;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Leaderboard operations over a shared ledger
pub struct Leaderboard {
    ledger: Arc<dyn MatchLedger>,
    processor: MatchResultProcessor,
    rating_config: RatingConfig,
    history_limit: usize,
    pair_locks: PairLocks,
    metrics: Option<Arc<MetricsCollector>>,
}

impl Leaderboard {
    /// Create a leaderboard using the rating and storage settings of `config`
    pub fn new(ledger: Arc<dyn MatchLedger>, config: &AppConfig) -> Result<Self> {
        let processor = MatchResultProcessor::new(&config.rating)?;

        Ok(Self {
            ledger,
            processor,
            rating_config: config.rating.clone(),
            history_limit: config.storage.history_limit,
            pair_locks: PairLocks::new(),
            metrics: None,
        })
    }

    /// Attach a metrics collector; the active player gauge is seeded from the store
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Result<Self> {
        metrics.set_active_players(self.ledger.list_all()?.len());
        self.metrics = Some(metrics);
        Ok(self)
    }

    pub fn metrics(&self) -> Option<Arc<MetricsCollector>> {
        self.metrics.clone()
    }

    pub fn rating_config(&self) -> &RatingConfig {
        &self.rating_config
    }

    /// Register a player. Without an explicit rating the configured initial
    /// rating is used; either way the precision policy is applied.
    pub fn register_player(&self, name: &str, rating: Option<f64>) -> Result<PlayerRecord> {
        let name = normalize_player_name(name).ok_or_else(|| LeaderboardError::InvalidRequest {
            reason: format!(
                "Player name must be 1 to {} characters",
                MAX_PLAYER_NAME_LEN
            ),
        })?;

        let rating = rating.unwrap_or(self.rating_config.initial_rating);
        if !rating.is_finite() {
            return Err(LeaderboardError::InvalidRequest {
                reason: format!("Rating must be a finite number, got {}", rating),
            }
            .into());
        }
        let rating = self.rating_config.precision.apply(rating);

        let player = self.ledger.create(&name, rating)?;
        info!("Registered player '{}' at {:.1}", player.name, player.rating);

        if let Some(metrics) = &self.metrics {
            metrics.record_player_registered();
        }

        Ok(player)
    }

    /// Remove a player. Their past games stay in the history.
    pub async fn remove_player(&self, name: &str) -> Result<()> {
        let name = name.trim();
        let guard = self.pair_locks.lock_one(name).await;
        let ledger = self.ledger.clone();
        let owned = name.to_string();
        let removed = tokio::task::spawn_blocking(move || ledger.delete(&owned)).await??;
        drop(guard);
        self.pair_locks.forget(name);

        if !removed {
            return Err(LeaderboardError::UnknownPlayer {
                name: name.to_string(),
            }
            .into());
        }

        info!("Removed player '{}'", name);
        if let Some(metrics) = &self.metrics {
            metrics.record_player_removed();
        }

        Ok(())
    }

    /// Record a match between two registered players.
    ///
    /// Either both players and the game record are stored, or nothing is.
    pub async fn record_result(
        &self,
        player_a: &str,
        player_b: &str,
        outcome: Outcome,
    ) -> Result<AppliedResult> {
        let (player_a, player_b) = (player_a.trim(), player_b.trim());

        let result = self.record_locked(player_a, player_b, outcome).await;

        if let Err(e) = &result {
            let reason = match LeaderboardError::from_anyhow(e) {
                Some(LeaderboardError::SamePlayer { .. }) => "same_player",
                Some(LeaderboardError::UnknownPlayer { .. }) => {
                    self.pair_locks.forget(player_a);
                    self.pair_locks.forget(player_b);
                    "unknown_player"
                }
                Some(LeaderboardError::InvalidOutcome { .. }) => "invalid_outcome",
                Some(LeaderboardError::StaleRecord { .. }) => "stale_record",
                Some(LeaderboardError::StoreUnavailable { .. }) => "store_unavailable",
                _ => "other",
            };
            warn!(
                "Failed to record {} between '{}' and '{}': {}",
                outcome, player_a, player_b, e
            );
            if let Some(metrics) = &self.metrics {
                metrics.record_match_failure(reason);
            }
        }

        result
    }

    async fn record_locked(
        &self,
        name_a: &str,
        name_b: &str,
        outcome: Outcome,
    ) -> Result<AppliedResult> {
        if name_a == name_b {
            return Err(LeaderboardError::SamePlayer {
                name: name_a.to_string(),
            }
            .into());
        }

        let _guard = self.pair_locks.lock_pair(name_a, name_b).await;
        let started = Instant::now();

        // The store reads, applies and commits in one step so writers in other
        // processes sharing the database cannot interleave.
        let ledger = self.ledger.clone();
        let processor = self.processor.clone();
        let (owned_a, owned_b) = (name_a.to_string(), name_b.to_string());
        let (applied, before_a, before_b) = tokio::task::spawn_blocking(move || {
            let before = Cell::new((0.0, 0.0));
            let apply = |current_a: &PlayerRecord, current_b: &PlayerRecord| {
                before.set((current_a.rating, current_b.rating));
                processor.apply_result(current_a, current_b, outcome)
            };
            let applied = ledger.record_match(&owned_a, &owned_b, &apply)?;
            let (before_a, before_b) = before.get();
            Ok::<_, anyhow::Error>((applied, before_a, before_b))
        })
        .await??;

        let delta_a = applied.player_a.rating - before_a;
        info!(
            "Recorded {}: '{}' {:.1} -> {:.1}, '{}' {:.1} -> {:.1}",
            outcome,
            name_a,
            before_a,
            applied.player_a.rating,
            name_b,
            before_b,
            applied.player_b.rating
        );

        if let Some(metrics) = &self.metrics {
            metrics.record_match(outcome, delta_a, started.elapsed());
        }

        Ok(applied)
    }

    /// All players, highest rating first
    pub fn standings(&self) -> Result<Vec<PlayerRecord>> {
        let mut players = self.ledger.list_all()?;
        sort_by_rating_desc(&mut players);
        Ok(players)
    }

    /// Look up one player
    pub fn player(&self, name: &str) -> Result<PlayerRecord> {
        self.ledger.get_by_name(name.trim())
    }

    /// Most recent games first; `None` uses the configured history limit
    pub fn recent_games(&self, limit: Option<usize>) -> Result<Vec<GameResult>> {
        let limit = limit.unwrap_or(self.history_limit);
        debug!("Fetching {} most recent games", limit);
        self.ledger.recent(limit)
    }

    /// Stateless rating preview: new ratings for A and B after A scored
    /// `score_a`, without touching the store or rounding.
    pub fn calculate(
        &self,
        rating_a: f64,
        rating_b: f64,
        score_a: f64,
        k: Option<f64>,
    ) -> Result<(f64, f64)> {
        validate_score(score_a)?;

        let k = k.unwrap_or(self.rating_config.k_factor);
        if !k.is_finite() || k <= 0.0 {
            return Err(LeaderboardError::InvalidRequest {
                reason: format!("K-factor must be positive, got {}", k),
            }
            .into());
        }
        if !rating_a.is_finite() || !rating_b.is_finite() {
            return Err(LeaderboardError::InvalidRequest {
                reason: "Ratings must be finite numbers".to_string(),
            }
            .into());
        }

        Ok(update_ratings(rating_a, rating_b, score_a, k))
    }
}
