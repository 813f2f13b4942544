//! Test fixtures and mock implementations for integration testing

#![allow(dead_code)]

use elo_board::config::AppConfig;
use elo_board::error::{LeaderboardError, Result};
use elo_board::storage::{HistoryStore, InMemoryLedger, MatchLedger, PlayerStore, SqliteLedger};
use elo_board::types::{AppliedResult, GameResult, PlayerRecord};
use elo_board::Leaderboard;
use mockall::mock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

mock! {
    pub Ledger {}

    impl PlayerStore for Ledger {
        fn get_by_name(&self, name: &str) -> Result<PlayerRecord>;
        fn create(&self, name: &str, rating: f64) -> Result<PlayerRecord>;
        fn upsert(&self, record: PlayerRecord) -> Result<()>;
        fn delete(&self, name: &str) -> Result<bool>;
        fn list_all(&self) -> Result<Vec<PlayerRecord>>;
    }

    impl HistoryStore for Ledger {
        fn append(&self, result: GameResult) -> Result<()>;
        fn recent(&self, n: usize) -> Result<Vec<GameResult>>;
    }

    impl MatchLedger for Ledger {
        fn commit_match(&self, applied: &AppliedResult) -> Result<()>;
    }
}

/// In-memory ledger that refuses to commit matches while `fail_commits` is set
#[derive(Default)]
pub struct FlakyLedger {
    inner: InMemoryLedger,
    fail_commits: AtomicBool,
    commit_attempts: AtomicUsize,
}

impl FlakyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_commits.store(failing, Ordering::SeqCst);
    }

    pub fn commit_attempts(&self) -> usize {
        self.commit_attempts.load(Ordering::SeqCst)
    }
}

impl PlayerStore for FlakyLedger {
    fn get_by_name(&self, name: &str) -> Result<PlayerRecord> {
        self.inner.get_by_name(name)
    }

    fn create(&self, name: &str, rating: f64) -> Result<PlayerRecord> {
        self.inner.create(name, rating)
    }

    fn upsert(&self, record: PlayerRecord) -> Result<()> {
        self.inner.upsert(record)
    }

    fn delete(&self, name: &str) -> Result<bool> {
        self.inner.delete(name)
    }

    fn list_all(&self) -> Result<Vec<PlayerRecord>> {
        self.inner.list_all()
    }
}

impl HistoryStore for FlakyLedger {
    fn append(&self, result: GameResult) -> Result<()> {
        self.inner.append(result)
    }

    fn recent(&self, n: usize) -> Result<Vec<GameResult>> {
        self.inner.recent(n)
    }
}

impl MatchLedger for FlakyLedger {
    fn commit_match(&self, applied: &AppliedResult) -> Result<()> {
        self.commit_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(store_unavailable());
        }
        self.inner.commit_match(applied)
    }
}

pub fn store_unavailable() -> anyhow::Error {
    LeaderboardError::StoreUnavailable {
        message: "database is locked".to_string(),
    }
    .into()
}

/// Recover the leaderboard error kind from a failed call
pub fn error_kind<T: std::fmt::Debug>(result: Result<T>) -> LeaderboardError {
    let err = result.expect_err("expected the call to fail");
    LeaderboardError::from_anyhow(&err)
        .cloned()
        .unwrap_or_else(|| panic!("not a leaderboard error: {:#}", err))
}

pub fn memory_leaderboard() -> Leaderboard {
    Leaderboard::new(Arc::new(InMemoryLedger::new()), &AppConfig::default()).unwrap()
}

pub fn sqlite_leaderboard() -> Leaderboard {
    Leaderboard::new(
        Arc::new(SqliteLedger::open_in_memory().unwrap()),
        &AppConfig::default(),
    )
    .unwrap()
}

/// Both storage backends, labelled for assertion messages
pub fn all_backends() -> Vec<(&'static str, Leaderboard)> {
    vec![
        ("memory", memory_leaderboard()),
        ("sqlite", sqlite_leaderboard()),
    ]
}

/// Register each name at the default initial rating
pub fn register_all(board: &Leaderboard, names: &[&str]) {
    for name in names {
        board.register_player(name, None).unwrap();
    }
}

pub fn rating_sum(board: &Leaderboard) -> f64 {
    board.standings().unwrap().iter().map(|p| p.rating).sum()
}
