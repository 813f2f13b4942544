//! Rating calculator trait and the Elo implementation
//!
//! This module defines the interface the match processor uses for rating
//! updates, so the rating system can be swapped without touching the
//! match bookkeeping.

use crate::error::{LeaderboardError, Result};
use crate::rating::elo;
use serde::{Deserialize, Serialize};

/// Trait for calculating rating changes after a two-player game
pub trait RatingCalculator: Send + Sync + std::fmt::Debug {
    /// Probability that a player rated `rating_a` beats one rated `rating_b`
    fn expected_score(&self, rating_a: f64, rating_b: f64) -> f64;

    /// New ratings for A and B after A scored `score_a` (1, 0.5 or 0).
    /// The match processor takes A's change and applies its negation to B.
    fn update_ratings(&self, rating_a: f64, rating_b: f64, score_a: f64) -> (f64, f64);

    /// Volatility constant in use
    fn k_factor(&self) -> f64;
}

/// Elo calculator with a fixed K-factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EloRatingCalculator {
    k_factor: f64,
}

impl EloRatingCalculator {
    /// Create a calculator; the K-factor must be finite and positive
    pub fn new(k_factor: f64) -> Result<Self> {
        if !k_factor.is_finite() || k_factor <= 0.0 {
            return Err(LeaderboardError::ConfigurationError {
                message: format!("K-factor must be positive, got {}", k_factor),
            }
            .into());
        }

        Ok(Self { k_factor })
    }
}

impl Default for EloRatingCalculator {
    fn default() -> Self {
        Self {
            k_factor: elo::DEFAULT_K_FACTOR,
        }
    }
}

impl RatingCalculator for EloRatingCalculator {
    fn expected_score(&self, rating_a: f64, rating_b: f64) -> f64 {
        elo::expected_score(rating_a, rating_b)
    }

    fn update_ratings(&self, rating_a: f64, rating_b: f64, score_a: f64) -> (f64, f64) {
        elo::update_ratings(rating_a, rating_b, score_a, self.k_factor)
    }

    fn k_factor(&self) -> f64 {
        self.k_factor
    }
}
