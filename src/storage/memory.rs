//! In-memory ledger
//!
//! Players and history share a single lock so a committed match is visible
//! all at once.

use super::{expected_games_before, ApplyMatch, HistoryStore, MatchLedger, PlayerStore};
use crate::error::{LeaderboardError, Result};
use crate::types::{AppliedResult, GameResult, PlayerId, PlayerRecord};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct LedgerState {
    players: HashMap<String, PlayerRecord>,
    /// Oldest first
    history: Vec<GameResult>,
    last_id: PlayerId,
}

impl LedgerState {
    fn player(&self, name: &str) -> Result<&PlayerRecord> {
        self.players.get(name).ok_or_else(|| {
            LeaderboardError::UnknownPlayer {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Check every player before writing any of them
    fn commit(&mut self, applied: &AppliedResult) -> Result<()> {
        for player in applied.players() {
            self.player(&player.name)?;
        }
        for player in applied.players() {
            let stored = self.player(&player.name)?;
            if stored.games_played != expected_games_before(player)? {
                return Err(LeaderboardError::StaleRecord {
                    name: player.name.clone(),
                }
                .into());
            }
        }

        for player in applied.players() {
            let mut updated = player.clone();
            if let Some(stored) = self.players.get(&player.name) {
                updated.id = stored.id;
            }
            self.players.insert(player.name.clone(), updated);
        }
        self.history.push(applied.game.clone());

        Ok(())
    }
}

/// In-memory player and history storage
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LedgerState>> {
        self.state.read().map_err(|_| {
            LeaderboardError::StoreUnavailable {
                message: "Failed to acquire ledger read lock".to_string(),
            }
            .into()
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, LedgerState>> {
        self.state.write().map_err(|_| {
            LeaderboardError::StoreUnavailable {
                message: "Failed to acquire ledger write lock".to_string(),
            }
            .into()
        })
    }

    /// Total number of recorded games
    pub fn game_count(&self) -> Result<usize> {
        Ok(self.read()?.history.len())
    }
}

impl PlayerStore for InMemoryLedger {
    fn get_by_name(&self, name: &str) -> Result<PlayerRecord> {
        self.read()?.player(name).cloned()
    }

    fn create(&self, name: &str, rating: f64) -> Result<PlayerRecord> {
        let mut state = self.write()?;

        if state.players.contains_key(name) {
            return Err(LeaderboardError::DuplicatePlayer {
                name: name.to_string(),
            }
            .into());
        }

        state.last_id += 1;
        let record = PlayerRecord::new(state.last_id, name, rating);
        state.players.insert(name.to_string(), record.clone());

        Ok(record)
    }

    fn upsert(&self, mut record: PlayerRecord) -> Result<()> {
        let mut state = self.write()?;

        if let Some(owner) = state
            .players
            .values()
            .find(|p| p.id == record.id && p.name != record.name)
        {
            return Err(LeaderboardError::InvalidRequest {
                reason: format!("Player id {} already belongs to '{}'", record.id, owner.name),
            }
            .into());
        }

        if let Some(existing) = state.players.get(&record.name) {
            record.id = existing.id;
        }
        state.last_id = state.last_id.max(record.id);
        state.players.insert(record.name.clone(), record);
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<bool> {
        Ok(self.write()?.players.remove(name).is_some())
    }

    fn list_all(&self) -> Result<Vec<PlayerRecord>> {
        Ok(self.read()?.players.values().cloned().collect())
    }
}

impl HistoryStore for InMemoryLedger {
    fn append(&self, result: GameResult) -> Result<()> {
        self.write()?.history.push(result);
        Ok(())
    }

    fn recent(&self, n: usize) -> Result<Vec<GameResult>> {
        Ok(self.read()?.history.iter().rev().take(n).cloned().collect())
    }
}

impl MatchLedger for InMemoryLedger {
    fn commit_match(&self, applied: &AppliedResult) -> Result<()> {
        self.write()?.commit(applied)
    }

    fn record_match(
        &self,
        name_a: &str,
        name_b: &str,
        apply: &ApplyMatch<'_>,
    ) -> Result<AppliedResult> {
        let mut state = self.write()?;

        let current_a = state.player(name_a)?.clone();
        let current_b = state.player(name_b)?.clone();
        let applied = apply(&current_a, &current_b)?;
        state.commit(&applied)?;

        Ok(applied)
    }
}
