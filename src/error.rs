//! Error types for the leaderboard service
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application. Callers that need to branch on the failure kind
//! recover the [`LeaderboardError`] with `downcast_ref`.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific leaderboard scenarios
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LeaderboardError {
    #[error("Invalid outcome: {value}")]
    InvalidOutcome { value: String },

    #[error("A player cannot play against themselves: {name}")]
    SamePlayer { name: String },

    #[error("Player not found: {name}")]
    UnknownPlayer { name: String },

    #[error("Player already exists: {name}")]
    DuplicatePlayer { name: String },

    #[error("Player record changed concurrently: {name}")]
    StaleRecord { name: String },

    #[error("Store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },
}

impl LeaderboardError {
    /// Find the leaderboard error carried by an `anyhow::Error`, if any
    pub fn from_anyhow(error: &anyhow::Error) -> Option<&LeaderboardError> {
        error.downcast_ref::<LeaderboardError>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = LeaderboardError::UnknownPlayer {
            name: "alice".to_string(),
        }
        .into();

        assert_eq!(
            LeaderboardError::from_anyhow(&err),
            Some(&LeaderboardError::UnknownPlayer {
                name: "alice".to_string()
            })
        );
        assert_eq!(err.to_string(), "Player not found: alice");
    }

    #[test]
    fn test_foreign_error_is_not_a_leaderboard_error() {
        let err = anyhow::anyhow!("disk on fire");
        assert!(LeaderboardError::from_anyhow(&err).is_none());
    }
}
