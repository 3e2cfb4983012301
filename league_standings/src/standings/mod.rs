//! Standings engine: withdrawal processing, standings aggregation and
//! persistence of the derived points.
//!
//! [`StandingsManager`] is the entry point. The aggregation itself
//! ([`compute_standings`]) is pure and can be run over any [`EventSnapshot`].

pub mod aggregator;
pub mod config;
pub mod errors;
pub mod locks;
pub mod manager;
pub mod models;
pub mod withdrawal;
pub mod writer;

pub use aggregator::{compute_standings, derive_standing, tally_matches};
pub use config::ScoringRules;
pub use errors::{StandingsError, StandingsResult};
pub use locks::EventLocks;
pub use manager::StandingsManager;
pub use models::{
    ApplyReport, Event, EventId, EventParticipation, EventSnapshot, League, LeagueId, Match,
    MatchId, MatchResult, MatchTally, NewMatch, TeamId, TeamStanding, TeamWriteFailure,
    WithdrawalOutcome,
};
pub use writer::apply_standings;
