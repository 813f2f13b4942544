//! Elo Board - leaderboard service with Elo ratings
//!
//! This crate provides the Elo rating engine, match-result processing,
//! player and history storage, and an HTTP API for a small leaderboard.

pub mod config;
pub mod error;
pub mod metrics;
pub mod rating;
pub mod server;
pub mod service;
pub mod storage;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{LeaderboardError, Result};
pub use types::*;

// Re-export key components
pub use rating::{expected_score, update_ratings, MatchResultProcessor};
pub use service::Leaderboard;
pub use storage::{HistoryStore, InMemoryLedger, MatchLedger, PlayerStore, SqliteLedger};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
