//! Player and game-history storage
//!
//! This module defines the interfaces for persisting players and recorded
//! games, with in-memory and SQLite implementations.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryLedger;
pub use sqlite::SqliteLedger;

use crate::error::Result;
use crate::types::{AppliedResult, GameResult, PlayerRecord};

/// Trait for player record storage
pub trait PlayerStore: Send + Sync {
    /// Look up a player by name; fails with `UnknownPlayer` when absent
    fn get_by_name(&self, name: &str) -> Result<PlayerRecord>;

    /// Register a new player with zeroed counters and a store-assigned id.
    /// Fails with `DuplicatePlayer` if the name is taken.
    fn create(&self, name: &str, rating: f64) -> Result<PlayerRecord>;

    /// Insert or replace a player, keyed by name. An existing player keeps
    /// their id; an id already owned by another name is rejected with
    /// `InvalidRequest`.
    fn upsert(&self, record: PlayerRecord) -> Result<()>;

    /// Remove a player; returns whether one existed
    fn delete(&self, name: &str) -> Result<bool>;

    /// All players, in no particular order
    fn list_all(&self) -> Result<Vec<PlayerRecord>>;
}

/// Trait for game history storage
pub trait HistoryStore: Send + Sync {
    fn append(&self, result: GameResult) -> Result<()>;

    /// Up to `n` games, most recent first
    fn recent(&self, n: usize) -> Result<Vec<GameResult>>;
}

/// Computes the outcome of a match from the two current player records
pub type ApplyMatch<'a> = dyn Fn(&PlayerRecord, &PlayerRecord) -> Result<AppliedResult> + 'a;

/// A store holding both players and history that can commit a match atomically
pub trait MatchLedger: PlayerStore + HistoryStore {
    /// Write both updated players and the game record as one unit.
    ///
    /// Each player must still have the `games_played` it had before the match
    /// (one less than in `applied`); otherwise the call fails with
    /// `StaleRecord`. If either player no longer exists the call fails with
    /// `UnknownPlayer`. Either way nothing is written.
    fn commit_match(&self, applied: &AppliedResult) -> Result<()>;

    /// Read both players, apply `apply` and commit the result, with no other
    /// writer able to change either player in between.
    ///
    /// The default reads outside any lock and relies on the stale-record check
    /// in [`MatchLedger::commit_match`]; stores that can hold a write lock
    /// across the whole step override it.
    fn record_match(
        &self,
        name_a: &str,
        name_b: &str,
        apply: &ApplyMatch<'_>,
    ) -> Result<AppliedResult> {
        let current_a = self.get_by_name(name_a)?;
        let current_b = self.get_by_name(name_b)?;
        let applied = apply(&current_a, &current_b)?;
        self.commit_match(&applied)?;
        Ok(applied)
    }
}

/// Pre-match `games_played` a committed record must still have in the store
pub(crate) fn expected_games_before(player: &PlayerRecord) -> Result<u32> {
    player.games_played.checked_sub(1).ok_or_else(|| {
        crate::error::LeaderboardError::StaleRecord {
            name: player.name.clone(),
        }
        .into()
    })
}
