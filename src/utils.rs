//! Utility functions for the leaderboard service

use crate::types::{GameId, PlayerRecord};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use uuid::Uuid;

/// Generate a new unique game ID
pub fn generate_game_id() -> GameId {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Sort players for display: highest rating first, ties broken by name
pub fn sort_by_rating_desc(players: &mut [PlayerRecord]) {
    players.sort_by(|a, b| {
        b.rating
            .partial_cmp(&a.rating)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Trim a player name and check it is usable as a unique key
pub fn normalize_player_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_PLAYER_NAME_LEN {
        return None;
    }
    Some(trimmed.to_string())
}

/// Longest accepted player name, in characters
pub const MAX_PLAYER_NAME_LEN: usize = 64;
