//! Elo rating formulas
//!
//! Expected score follows the logistic model
//! `E = 1 / (1 + 10^((rating_b - rating_a) / 400))` and ratings move by
//! `k * (actual - expected)`.

use crate::error::{LeaderboardError, Result};

/// K-factor used when none is configured
pub const DEFAULT_K_FACTOR: f64 = 32.0;

/// Rating difference that shifts the expected score by a factor of ten
const LOGISTIC_SCALE: f64 = 400.0;

/// Probability that a player rated `rating_a` beats one rated `rating_b`.
///
/// The result stays inside the open interval (0, 1) even for rating gaps large
/// enough to saturate `f64`.
pub fn expected_score(rating_a: f64, rating_b: f64) -> f64 {
    let expected = 1.0 / (1.0 + 10f64.powf((rating_b - rating_a) / LOGISTIC_SCALE));
    expected.clamp(f64::EPSILON, 1.0 - f64::EPSILON)
}

/// New ratings for A and B after a game where A scored `score_a`.
///
/// `score_a` is 1 for a win by A, 0 for a loss and 0.5 for a draw. Values
/// outside that set are not rejected here; see [`validate_score`].
///
/// B's expectation is the complement of A's, so the same delta is added to A
/// and subtracted from B and the update is exactly zero-sum.
pub fn update_ratings(rating_a: f64, rating_b: f64, score_a: f64, k: f64) -> (f64, f64) {
    let delta = k * (score_a - expected_score(rating_a, rating_b));
    (rating_a + delta, rating_b - delta)
}

/// [`update_ratings`] with the standard K-factor of 32
pub fn update_ratings_default(rating_a: f64, rating_b: f64, score_a: f64) -> (f64, f64) {
    update_ratings(rating_a, rating_b, score_a, DEFAULT_K_FACTOR)
}

/// Check that a raw score is one of 0, 0.5 or 1
pub fn validate_score(score_a: f64) -> Result<()> {
    if score_a == 0.0 || score_a == 0.5 || score_a == 1.0 {
        Ok(())
    } else {
        Err(LeaderboardError::InvalidOutcome {
            value: score_a.to_string(),
        }
        .into())
    }
}
