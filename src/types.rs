//! Common types used throughout the leaderboard service

use crate::error::LeaderboardError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Store-assigned identifier for players
pub type PlayerId = i64;

/// Unique identifier for recorded games
pub type GameId = Uuid;

/// Display text used for a drawn game's winner column
pub const DRAW_LABEL: &str = "draw";

/// A player on the leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub name: String,
    pub rating: f64,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl PlayerRecord {
    /// Create a freshly registered player with zeroed counters
    pub fn new(id: PlayerId, name: impl Into<String>, rating: f64) -> Self {
        Self {
            id,
            name: name.into(),
            rating,
            games_played: 0,
            wins: 0,
            losses: 0,
            draws: 0,
        }
    }

    /// Whether `games_played` equals the sum of the result counters
    pub fn counters_consistent(&self) -> bool {
        self.games_played == self.wins + self.losses + self.draws
    }

    /// Whether both records refer to the same identity
    pub fn same_identity(&self, other: &PlayerRecord) -> bool {
        self.id == other.id || self.name == other.name
    }
}

/// Result of a match from player A's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    AWins,
    BWins,
    Draw,
}

impl Outcome {
    /// Actual score for player A: 1 for a win, 0.5 for a draw, 0 for a loss
    pub fn score_a(self) -> f64 {
        match self {
            Outcome::AWins => 1.0,
            Outcome::BWins => 0.0,
            Outcome::Draw => 0.5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::AWins => "a_wins",
            Outcome::BWins => "b_wins",
            Outcome::Draw => "draw",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = LeaderboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "a_wins" | "p1_wins" => Ok(Outcome::AWins),
            "b_wins" | "p2_wins" => Ok(Outcome::BWins),
            "draw" => Ok(Outcome::Draw),
            _ => Err(LeaderboardError::InvalidOutcome {
                value: s.to_string(),
            }),
        }
    }
}

/// A recorded match, immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub id: GameId,
    pub timestamp: DateTime<Utc>,
    pub player1: String,
    pub player2: String,
    /// Winner's name, `None` for a draw
    pub winner: Option<String>,
}

impl GameResult {
    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }

    /// Winner's name, or [`DRAW_LABEL`] for a draw
    pub fn winner_label(&self) -> &str {
        self.winner.as_deref().unwrap_or(DRAW_LABEL)
    }
}

/// The records produced by applying one match result.
///
/// None of these are persisted yet; a store commits all three together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedResult {
    pub player_a: PlayerRecord,
    pub player_b: PlayerRecord,
    pub game: GameResult,
}

impl AppliedResult {
    pub fn players(&self) -> [&PlayerRecord; 2] {
        [&self.player_a, &self.player_b]
    }
}
