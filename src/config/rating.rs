//! Rating system configuration

use crate::error::{LeaderboardError, Result};
use crate::rating::elo::DEFAULT_K_FACTOR;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How updated ratings are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingPrecision {
    /// Round to the nearest integer, halves away from zero
    #[default]
    Integer,
    /// Keep full floating-point precision
    Float,
}

impl RatingPrecision {
    pub fn apply(self, rating: f64) -> f64 {
        match self {
            RatingPrecision::Integer => rating.round(),
            RatingPrecision::Float => rating,
        }
    }
}

impl FromStr for RatingPrecision {
    type Err = LeaderboardError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "integer" | "int" => Ok(RatingPrecision::Integer),
            "float" => Ok(RatingPrecision::Float),
            other => Err(LeaderboardError::ConfigurationError {
                message: format!("Unknown rating precision: {}", other),
            }),
        }
    }
}

/// Rating system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Elo volatility constant
    pub k_factor: f64,
    /// Rating given to players registered without one
    pub initial_rating: f64,
    pub precision: RatingPrecision,
    /// Whether drawn games may be recorded
    pub allow_draws: bool,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            k_factor: DEFAULT_K_FACTOR,
            initial_rating: 1000.0,
            precision: RatingPrecision::Integer,
            allow_draws: true,
        }
    }
}

impl RatingConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !self.k_factor.is_finite() || self.k_factor <= 0.0 {
            return Err(LeaderboardError::ConfigurationError {
                message: format!("K-factor must be positive, got {}", self.k_factor),
            }
            .into());
        }

        if !self.initial_rating.is_finite() {
            return Err(LeaderboardError::ConfigurationError {
                message: "Initial rating must be a finite number".to_string(),
            }
            .into());
        }

        Ok(())
    }
}
