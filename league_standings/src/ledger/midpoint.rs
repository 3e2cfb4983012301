//! Match timing relative to the league midpoint.

use crate::standings::{
    errors::{StandingsError, StandingsResult},
    models::{Match, MatchResult},
};
use chrono::NaiveDate;

/// Highest set count accepted for one side of a match
pub const MAX_SETS_PER_MATCH: i32 = 99;

/// Whether a match date falls on or before the league midpoint
pub fn is_before_midpoint(match_date: NaiveDate, midway_point: NaiveDate) -> bool {
    match_date <= midway_point
}

/// Classification to store after a result is recorded
///
/// Once a match counts as played before the midpoint it keeps counting, even if
/// the result is later edited with a later date.
pub fn classify(existing: &Match, match_date: NaiveDate, midway_point: NaiveDate) -> bool {
    existing.before_midpoint || is_before_midpoint(match_date, midway_point)
}

/// Validate a submitted result against the match it is for
///
/// # Errors
///
/// * `StandingsError::MatchVoided` - The match was voided by a withdrawal
/// * `StandingsError::InvalidResult` - Set counts outside
///   `0..=MAX_SETS_PER_MATCH`, or a winner that does not play in the match
pub fn validate_result(existing: &Match, result: &MatchResult) -> StandingsResult<()> {
    if existing.withdrawal {
        return Err(StandingsError::MatchVoided(existing.id));
    }

    let valid_sets = 0..=MAX_SETS_PER_MATCH;
    if !valid_sets.contains(&result.team1_sets) || !valid_sets.contains(&result.team2_sets) {
        return Err(StandingsError::InvalidResult(format!(
            "set counts must be between 0 and {MAX_SETS_PER_MATCH}, got {}-{}",
            result.team1_sets, result.team2_sets
        )));
    }

    if let Some(winner) = result.winner_id.filter(|w| !existing.involves(*w)) {
        return Err(StandingsError::InvalidResult(format!(
            "winner {winner} does not play in match {}",
            existing.id
        )));
    }

    Ok(())
}
