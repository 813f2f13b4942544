//! Elo rating engine
//!
//! This module provides the Elo formulas, the calculator interface used by
//! the match processor, and the processor that turns a match outcome into
//! updated player records.

pub mod calculator;
pub mod elo;
pub mod processor;

// Re-export commonly used types
pub use calculator::{EloRatingCalculator, RatingCalculator};
pub use elo::{expected_score, update_ratings, update_ratings_default, DEFAULT_K_FACTOR};
pub use processor::MatchResultProcessor;
