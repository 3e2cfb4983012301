//! Scoring configuration.

use serde::{Deserialize, Serialize};

/// Point values used when deriving standings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringRules {
    /// Points per set won
    pub set_points_per_set: i32,
    /// Bonus for reaching the event's midway match count before the midpoint
    pub mid_bonus: i32,
    /// Bonus for finishing every match that still counts
    pub all_bonus: i32,
}

impl ScoringRules {
    /// Load scoring rules from environment variables
    ///
    /// Expected environment variables:
    /// - `SCORING_SET_POINTS_PER_SET` (default: 2)
    /// - `SCORING_MID_BONUS` (default: 2)
    /// - `SCORING_ALL_BONUS` (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            set_points_per_set: std::env::var("SCORING_SET_POINTS_PER_SET")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.set_points_per_set),
            mid_bonus: std::env::var("SCORING_MID_BONUS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.mid_bonus),
            all_bonus: std::env::var("SCORING_ALL_BONUS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.all_bonus),
        }
    }
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            set_points_per_set: 2,
            mid_bonus: 2,
            all_bonus: 1,
        }
    }
}
