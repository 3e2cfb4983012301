//! Standings error types.

use super::models::{EventId, LeagueId, MatchId, TeamId};
use crate::db::timeouts::TimeoutError;
use std::time::Duration;
use thiserror::Error;

/// Standings engine errors
#[derive(Debug, Error)]
pub enum StandingsError {
    /// Event record missing, or the event has no participation rows
    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    /// League referenced by an event is missing
    #[error("League not found: {0}")]
    LeagueNotFound(LeagueId),

    /// Match not found
    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    /// Team holds no participation record in the event
    #[error("Team {team_id} is not enrolled in event {event_id}")]
    TeamNotEnrolled { event_id: EventId, team_id: TeamId },

    /// Team already withdrew from the event
    #[error("Team {team_id} already withdrawn from event {event_id}")]
    AlreadyWithdrawn { event_id: EventId, team_id: TeamId },

    /// Team already enrolled in the event
    #[error("Team {team_id} already enrolled in event {event_id}")]
    AlreadyEnrolled { event_id: EventId, team_id: TeamId },

    /// Match was voided by a withdrawal and no longer accepts results
    #[error("Match {0} was voided by a withdrawal")]
    MatchVoided(MatchId),

    /// Malformed match result or schedule request
    #[error("Invalid result: {0}")]
    InvalidResult(String),

    /// A withdrawn team still has a match not flagged for withdrawal
    ///
    /// Either a torn read or stored rows that already break the withdrawal
    /// invariant. The latter persists until the team's matches are voided again
    /// through `StandingsManager::repair_withdrawal`.
    #[error(
        "Inconsistent snapshot for event {event_id}: match {match_id} involves withdrawn team \
         {team_id} but is not voided; re-run withdrawal voiding for team {team_id} \
         (league_admin repair-withdrawal --event {event_id} --team {team_id})"
    )]
    InconsistentSnapshot {
        event_id: EventId,
        team_id: TeamId,
        match_id: MatchId,
    },

    /// Team has not withdrawn, so there is nothing to repair
    #[error("Team {team_id} has not withdrawn from event {event_id}")]
    NotWithdrawn { event_id: EventId, team_id: TeamId },

    /// Stored set counts or bonuses do not fit the point columns
    #[error(
        "Points for team {team_id} in event {event_id} overflow; check its stored set counts \
         and bonuses"
    )]
    ScoreOverflow { event_id: EventId, team_id: TeamId },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Storage did not answer in time
    #[error("Database operation timed out after {0:?}")]
    Timeout(Duration),

    /// Storage refused a standings write
    #[error("Write rejected for team {team_id}: {reason}")]
    WriteRejected { team_id: TeamId, reason: String },
}

impl StandingsError {
    /// Whether the error comes from the storage layer rather than from the
    /// engine's own rules. Callers may retry these.
    pub fn is_persistence_failure(&self) -> bool {
        matches!(
            self,
            StandingsError::Database(_)
                | StandingsError::Timeout(_)
                | StandingsError::WriteRejected { .. }
        )
    }

    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            StandingsError::Database(_) | StandingsError::Timeout(_) => {
                "Internal server error".to_string()
            }
            StandingsError::WriteRejected { team_id, .. } => {
                format!("Standings for team {team_id} could not be saved")
            }
            StandingsError::InconsistentSnapshot {
                event_id, team_id, ..
            } => format!(
                "Standings for event {event_id} cannot be computed: matches of withdrawn team \
                 {team_id} are not voided; run repair-withdrawal for that team, then recompute"
            ),
            _ => self.to_string(),
        }
    }
}

impl From<TimeoutError> for StandingsError {
    fn from(err: TimeoutError) -> Self {
        match err {
            TimeoutError::Timeout(duration) => StandingsError::Timeout(duration),
            TimeoutError::Database(e) => StandingsError::Database(e),
        }
    }
}

/// Result type for standings operations
pub type StandingsResult<T> = Result<T, StandingsError>;
