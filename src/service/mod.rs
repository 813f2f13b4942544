//! Leaderboard service layer
//!
//! This module contains the leaderboard orchestration and the per-player
//! locking it relies on.

pub mod leaderboard;
pub mod pair_lock;

pub use leaderboard::Leaderboard;
pub use pair_lock::{PairGuard, PairLocks};
