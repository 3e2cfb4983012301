//! League, event, match and standings data models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// League ID type
pub type LeagueId = i32;

/// Event ID type
pub type EventId = i32;

/// Team ID type
pub type TeamId = i32;

/// Match ID type
pub type MatchId = i32;

/// League model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct League {
    pub id: LeagueId,
    pub league_name: String,
    pub starting_date: Option<NaiveDate>,
    /// Matches played on or before this date count toward the mid bonus
    pub midway_point: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_finished: bool,
}

/// Event model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub league_id: LeagueId,
    pub event_name: String,
    /// Matches a team must play before the league midpoint to earn the mid bonus
    pub midway_matches: i32,
}

/// A team's enrollment record in one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventParticipation {
    pub event_id: EventId,
    pub team_id: TeamId,
    pub set_points: i32,
    pub mid_bonus: i32,
    pub all_bonus: i32,
    /// Owned by processes outside the engine; read, never written
    pub challenger_bonus: i32,
    pub total_points: i32,
    pub withdrawn: bool,
}

impl EventParticipation {
    /// Fresh enrollment with every scoring field at zero
    pub fn enrolled(event_id: EventId, team_id: TeamId) -> Self {
        Self {
            event_id,
            team_id,
            set_points: 0,
            mid_bonus: 0,
            all_bonus: 0,
            challenger_bonus: 0,
            total_points: 0,
            withdrawn: false,
        }
    }
}

/// Match between two teams within an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub event_id: EventId,
    pub team1_id: TeamId,
    pub team2_id: TeamId,
    pub team1_sets: i32,
    pub team2_sets: i32,
    pub finished: bool,
    pub winner_id: Option<TeamId>,
    /// Free-text score line, e.g. "6-4 3-6 10-8"
    pub winner_score: Option<String>,
    pub match_date: Option<NaiveDate>,
    pub before_midpoint: bool,
    /// Set once either team has withdrawn from the event
    pub withdrawal: bool,
}

impl Match {
    /// Whether the team plays in this match
    pub fn involves(&self, team_id: TeamId) -> bool {
        self.team1_id == team_id || self.team2_id == team_id
    }

    /// Sets won by the given team, zero if it does not play in this match
    pub fn sets_for(&self, team_id: TeamId) -> i32 {
        if self.team1_id == team_id {
            self.team1_sets
        } else if self.team2_id == team_id {
            self.team2_sets
        } else {
            0
        }
    }

    /// Whether this match is between the two teams, in either order
    pub fn is_between(&self, a: TeamId, b: TeamId) -> bool {
        (self.team1_id == a && self.team2_id == b) || (self.team1_id == b && self.team2_id == a)
    }
}

/// Match to be inserted by the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMatch {
    pub event_id: EventId,
    pub team1_id: TeamId,
    pub team2_id: TeamId,
    pub withdrawal: bool,
}

/// Submitted result for a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub match_date: NaiveDate,
    pub finished: bool,
    pub winner_id: Option<TeamId>,
    pub team1_sets: i32,
    pub team2_sets: i32,
    pub winner_score: Option<String>,
}

/// Event, participation and matches read at one point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSnapshot {
    pub event: Event,
    pub participation: Vec<EventParticipation>,
    pub matches: Vec<Match>,
}

/// Per-team counters gathered from an event's matches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchTally {
    pub total_matches: u32,
    pub played_matches: u32,
    pub notwithdrawn_total: u32,
    pub completed_notwithdrawn: u32,
    pub wins: u32,
    /// Cumulative; withdrawal never decrements it
    pub matches_before_midpoint: u32,
    pub sets_won: i32,
}

/// Computed standing for one team in one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStanding {
    pub event_id: EventId,
    pub team_id: TeamId,
    pub tally: MatchTally,
    pub withdrawn: bool,
    pub set_points: i32,
    pub mid_bonus: i32,
    pub all_bonus: i32,
    pub challenger_bonus: i32,
    pub total_points: i32,
}

/// A team whose standing could not be persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamWriteFailure {
    pub team_id: TeamId,
    pub reason: String,
}

/// Outcome of persisting a batch of standings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Rows as stored after the write
    pub applied: Vec<EventParticipation>,
    pub failed: Vec<TeamWriteFailure>,
}

impl ApplyReport {
    /// True when every standing was persisted
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Teams the caller should retry
    pub fn failed_team_ids(&self) -> Vec<TeamId> {
        self.failed.iter().map(|f| f.team_id).collect()
    }
}

/// Result of a team withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalOutcome {
    pub event_id: EventId,
    pub team_id: TeamId,
    /// Matches newly zeroed and flagged by this withdrawal
    pub matches_voided: u64,
}
