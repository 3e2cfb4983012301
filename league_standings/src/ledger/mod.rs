//! Match ledger rules: scheduling pairings and classifying submitted results.
//!
//! The ledger functions are pure; [`crate::standings::StandingsManager`] loads
//! the data, applies these rules and writes the outcome through the store.

pub mod midpoint;
pub mod schedule;

pub use midpoint::{MAX_SETS_PER_MATCH, classify, is_before_midpoint, validate_result};
pub use schedule::plan_matches;
