//! Per-player locks
//!
//! Each player name maps to its own async mutex. Recording a match holds the
//! locks of both participants, taken in name order so two submissions for
//! the same pair can never deadlock. Matches between unrelated players do not
//! contend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Holds the lock of one or two players until dropped
#[derive(Debug)]
pub struct PairGuard {
    _first: OwnedMutexGuard<()>,
    _second: Option<OwnedMutexGuard<()>>,
}

/// Registry of per-player locks
#[derive(Debug, Default)]
pub struct PairLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl PairLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, name: &str) -> Arc<AsyncMutex<()>> {
        // The map only holds Arcs, so a poisoned lock cannot hold torn state
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Lock a single player
    pub async fn lock_one(&self, name: &str) -> PairGuard {
        let first = self.entry(name).lock_owned().await;
        PairGuard {
            _first: first,
            _second: None,
        }
    }

    /// Lock both players, in name order. Locking a name against itself takes
    /// the lock once.
    pub async fn lock_pair(&self, a: &str, b: &str) -> PairGuard {
        if a == b {
            return self.lock_one(a).await;
        }

        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let first = self.entry(low).lock_owned().await;
        let second = self.entry(high).lock_owned().await;

        PairGuard {
            _first: first,
            _second: Some(second),
        }
    }

    /// Drop the lock entry for `name` if no task holds or awaits it.
    ///
    /// Acquirers clone the entry under the map lock, so a strong count of one
    /// means the map is the only owner.
    pub fn forget(&self, name: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(name)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(name);
        }
    }

    /// Number of players with a lock entry
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
