//! Match result processing
//!
//! Turns two current player records and an outcome into the updated records
//! and the game-history entry. Nothing here touches storage; the caller commits
//! the returned [`AppliedResult`] as one unit.

use crate::config::{RatingConfig, RatingPrecision};
use crate::error::{LeaderboardError, Result};
use crate::rating::calculator::{EloRatingCalculator, RatingCalculator};
use crate::types::{AppliedResult, GameResult, Outcome, PlayerRecord};
use crate::utils::{current_timestamp, generate_game_id};
use std::sync::Arc;
use tracing::debug;

/// Applies match outcomes to player records
#[derive(Debug, Clone)]
pub struct MatchResultProcessor {
    calculator: Arc<dyn RatingCalculator>,
    precision: RatingPrecision,
    allow_draws: bool,
}

impl MatchResultProcessor {
    /// Create a processor using the Elo calculator described by `config`
    pub fn new(config: &RatingConfig) -> Result<Self> {
        config.validate()?;
        let calculator = EloRatingCalculator::new(config.k_factor)?;

        Ok(Self::with_calculator(
            Arc::new(calculator),
            config.precision,
            config.allow_draws,
        ))
    }

    /// Create a processor around any rating calculator
    pub fn with_calculator(
        calculator: Arc<dyn RatingCalculator>,
        precision: RatingPrecision,
        allow_draws: bool,
    ) -> Self {
        Self {
            calculator,
            precision,
            allow_draws,
        }
    }

    pub fn precision(&self) -> RatingPrecision {
        self.precision
    }

    pub fn allows_draws(&self) -> bool {
        self.allow_draws
    }

    pub fn calculator(&self) -> &dyn RatingCalculator {
        self.calculator.as_ref()
    }

    /// Apply `outcome` to the two players.
    ///
    /// Returns new copies of both records with updated rating and counters,
    /// plus the game record. Fails without producing anything when the
    /// players are the same identity or the outcome is a draw and draws are
    /// disabled.
    pub fn apply_result(
        &self,
        player_a: &PlayerRecord,
        player_b: &PlayerRecord,
        outcome: Outcome,
    ) -> Result<AppliedResult> {
        if player_a.same_identity(player_b) {
            return Err(LeaderboardError::SamePlayer {
                name: player_a.name.clone(),
            }
            .into());
        }

        if outcome == Outcome::Draw && !self.allow_draws {
            return Err(LeaderboardError::InvalidOutcome {
                value: outcome.to_string(),
            }
            .into());
        }

        let (rating_a, _) =
            self.calculator
                .update_ratings(player_a.rating, player_b.rating, outcome.score_a());

        // One rounded delta, added to A and taken from B, keeps every update
        // exactly zero-sum.
        let delta = self.precision.apply(rating_a - player_a.rating);
        let mut updated_a = player_a.clone();
        let mut updated_b = player_b.clone();
        updated_a.rating = player_a.rating + delta;
        updated_b.rating = player_b.rating - delta;

        updated_a.games_played += 1;
        updated_b.games_played += 1;

        let winner = match outcome {
            Outcome::AWins => {
                updated_a.wins += 1;
                updated_b.losses += 1;
                Some(player_a.name.clone())
            }
            Outcome::BWins => {
                updated_a.losses += 1;
                updated_b.wins += 1;
                Some(player_b.name.clone())
            }
            Outcome::Draw => {
                updated_a.draws += 1;
                updated_b.draws += 1;
                None
            }
        };

        debug!(
            "Applied {} between '{}' ({:.1} -> {:.1}) and '{}' ({:.1} -> {:.1})",
            outcome,
            player_a.name,
            player_a.rating,
            updated_a.rating,
            player_b.name,
            player_b.rating,
            updated_b.rating
        );

        let game = GameResult {
            id: generate_game_id(),
            timestamp: current_timestamp(),
            player1: player_a.name.clone(),
            player2: player_b.name.clone(),
            winner,
        };

        Ok(AppliedResult {
            player_a: updated_a,
            player_b: updated_b,
            game,
        })
    }
}

impl Default for MatchResultProcessor {
    fn default() -> Self {
        let config = RatingConfig::default();
        Self::with_calculator(
            Arc::new(EloRatingCalculator::default()),
            config.precision,
            config.allow_draws,
        )
    }
}
