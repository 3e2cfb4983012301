//! # League Standings
//!
//! Standings engine for round-robin league events. Teams enroll in an event,
//! play matches, and earn points from three sources:
//!
//! - **Set points**: two points per set won
//! - **Mid bonus**: granted once a team has played the event's midway match
//!   count on or before the league midpoint, and never taken back
//! - **All bonus**: for finishing every match that still counts
//!
//! A team's total also includes a challenger bonus maintained outside this
//! crate. When a team withdraws, its matches in the event are voided (set
//! counts zeroed and flagged) and the remaining standings are recomputed.
//!
//! ## Core Modules
//!
//! - [`standings`]: aggregation, withdrawal rules and the [`StandingsManager`]
//! - [`ledger`]: match scheduling and result classification
//! - [`db`]: storage traits with PostgreSQL and in-memory implementations
//!
//! ## Example
//!
//! ```
//! use league_standings::{MemoryStandingsStore, StandingsManager};
//! use league_standings::standings::{Event, EventParticipation};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), league_standings::StandingsError> {
//! let store = MemoryStandingsStore::new()
//!     .with_event(Event {
//!         id: 1,
//!         league_id: 1,
//!         event_name: "Spring Open".to_string(),
//!         midway_matches: 2,
//!     })
//!     .with_participation(EventParticipation::enrolled(1, 10));
//!
//! let manager = StandingsManager::new(Arc::new(store));
//! let report = manager.recompute(1).await?;
//! assert!(report.is_complete());
//! # Ok(())
//! # }
//! ```

/// Storage traits, PostgreSQL pool and store implementations.
pub mod db;

/// Match scheduling and result classification.
pub mod ledger;

/// Standings computation, withdrawal and persistence.
pub mod standings;

pub use db::{Database, DatabaseConfig, MemoryStandingsStore, PgStandingsStore, StandingsStore};
pub use standings::{
    ApplyReport, ScoringRules, StandingsError, StandingsManager, StandingsResult, TeamStanding,
    WithdrawalOutcome,
};
