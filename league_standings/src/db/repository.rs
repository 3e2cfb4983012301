//! Repository trait definitions for the standings engine.
//!
//! The engine reads and writes through these traits only, so it runs the same
//! against PostgreSQL ([`super::PgStandingsStore`]) and against the in-memory
//! store ([`super::MemoryStandingsStore`]) used in tests and tooling.

use async_trait::async_trait;

use crate::standings::{
    errors::StandingsResult,
    models::{
        Event, EventId, EventParticipation, EventSnapshot, League, LeagueId, Match, MatchId,
        MatchResult, NewMatch, TeamId, TeamStanding,
    },
};

/// Trait for league and event configuration lookups
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Get an event, including its midway match threshold
    async fn get_event(&self, event_id: EventId) -> StandingsResult<Option<Event>>;

    /// Get a league, including its midpoint date
    async fn get_league(&self, league_id: LeagueId) -> StandingsResult<Option<League>>;
}

/// Trait for match ledger operations
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// List every match of an event, ordered by match id
    async fn list_matches(&self, event_id: EventId) -> StandingsResult<Vec<Match>>;

    /// Find a match by ID
    async fn get_match(&self, match_id: MatchId) -> StandingsResult<Option<Match>>;

    /// Insert a scheduled match with no result
    async fn insert_match(&self, new_match: &NewMatch) -> StandingsResult<Match>;

    /// Store a submitted result and its midpoint classification
    ///
    /// Returns `None` when the match does not exist.
    async fn update_result(
        &self,
        match_id: MatchId,
        result: &MatchResult,
        before_midpoint: bool,
    ) -> StandingsResult<Option<Match>>;
}

/// Trait for event participation operations
#[async_trait]
pub trait ParticipationRepository: Send + Sync {
    /// List participation rows of an event, ordered by team id
    async fn list_participation(&self, event_id: EventId)
    -> StandingsResult<Vec<EventParticipation>>;

    /// Find one team's participation
    async fn get_participation(
        &self,
        event_id: EventId,
        team_id: TeamId,
    ) -> StandingsResult<Option<EventParticipation>>;

    /// Create a zeroed participation row
    ///
    /// Fails with `StandingsError::AlreadyEnrolled` if the row exists.
    async fn enroll_team(
        &self,
        event_id: EventId,
        team_id: TeamId,
    ) -> StandingsResult<EventParticipation>;

    /// Persist one team's computed standing in a single write
    ///
    /// The stored mid bonus is merged with `GREATEST(stored, computed)` and the
    /// total is recomputed from the merged value and the stored challenger
    /// bonus. Returns the row as stored, or `None` if the team is no longer
    /// enrolled.
    async fn write_standing(
        &self,
        standing: &TeamStanding,
    ) -> StandingsResult<Option<EventParticipation>>;
}

/// Storage used by [`crate::standings::StandingsManager`]
#[async_trait]
pub trait StandingsStore: EventRepository + MatchRepository + ParticipationRepository {
    /// Read the event, its participation and its matches at one point in time
    ///
    /// Fails with `StandingsError::EventNotFound` if the event does not exist.
    /// An event without participation rows is returned as is.
    async fn load_snapshot(&self, event_id: EventId) -> StandingsResult<EventSnapshot>;

    /// Atomically void the team's matches in the event and mark it withdrawn
    ///
    /// Returns the number of matches newly voided.
    ///
    /// Fails with `StandingsError::TeamNotEnrolled` or
    /// `StandingsError::AlreadyWithdrawn`, leaving storage untouched.
    async fn withdraw_team(&self, event_id: EventId, team_id: TeamId) -> StandingsResult<u64>;

    /// Void the remaining unflagged matches of a team already marked withdrawn
    ///
    /// Returns the number of matches newly voided; zero when the event was
    /// already consistent.
    ///
    /// Fails with `StandingsError::TeamNotEnrolled` or
    /// `StandingsError::NotWithdrawn`, leaving storage untouched.
    async fn repair_withdrawal(&self, event_id: EventId, team_id: TeamId) -> StandingsResult<u64>;
}
