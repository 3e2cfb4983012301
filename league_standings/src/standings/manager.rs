//! Standings manager: the engine entry point for every event mutation.

use super::{
    aggregator::compute_standings,
    config::ScoringRules,
    errors::{StandingsError, StandingsResult},
    locks::EventLocks,
    models::{
        ApplyReport, EventId, EventParticipation, Match, MatchId, MatchResult, TeamId,
        TeamStanding, WithdrawalOutcome,
    },
    writer::apply_standings,
};
use crate::{
    db::repository::StandingsStore,
    ledger::{classify, plan_matches, validate_result},
};
use log::{debug, info, warn};
use std::sync::Arc;

/// Coordinates withdrawals, recomputes and match ledger updates over a store
///
/// Operations touching the same event are serialized through [`EventLocks`];
/// the `*_locked` helpers assume the caller already holds the event's lock.
pub struct StandingsManager<S: ?Sized> {
    /// Backing storage
    store: Arc<S>,

    /// Point values used by the aggregator
    rules: ScoringRules,

    /// Per-event mutexes
    locks: EventLocks,
}

impl<S: ?Sized> Clone for StandingsManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            rules: self.rules,
            locks: self.locks.clone(),
        }
    }
}

impl<S: StandingsStore + ?Sized> StandingsManager<S> {
    /// Create a manager with the default scoring rules
    pub fn new(store: Arc<S>) -> Self {
        Self::with_rules(store, ScoringRules::default())
    }

    /// Create a manager with custom scoring rules
    pub fn with_rules(store: Arc<S>, rules: ScoringRules) -> Self {
        Self {
            store,
            rules,
            locks: EventLocks::new(),
        }
    }

    /// Scoring rules in effect
    pub fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    /// Backing store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Withdraw a team from an event
    ///
    /// Voids the team's matches in the event and marks it withdrawn. Points are
    /// not recomputed; call [`Self::recompute`] afterwards.
    ///
    /// # Errors
    ///
    /// * `StandingsError::TeamNotEnrolled` - The team has no participation row
    /// * `StandingsError::AlreadyWithdrawn` - The team already withdrew
    /// * Persistence failures from the store
    pub async fn withdraw(
        &self,
        event_id: EventId,
        team_id: TeamId,
    ) -> StandingsResult<WithdrawalOutcome> {
        let _guard = self.locks.lock(event_id).await;

        let matches_voided = self.store.withdraw_team(event_id, team_id).await?;
        info!(
            "Team {} withdrew from event {}: {} matches voided",
            team_id, event_id, matches_voided
        );

        Ok(WithdrawalOutcome {
            event_id,
            team_id,
            matches_voided,
        })
    }

    /// Void matches left unflagged for a team that has already withdrawn
    ///
    /// This clears `StandingsError::InconsistentSnapshot` for the team, for
    /// example when a pairing was created after the withdrawal without the void
    /// flag. Running it on a consistent event voids nothing.
    ///
    /// # Errors
    ///
    /// * `StandingsError::TeamNotEnrolled` - The team has no participation row
    /// * `StandingsError::NotWithdrawn` - The team is still active
    /// * Persistence failures from the store
    pub async fn repair_withdrawal(
        &self,
        event_id: EventId,
        team_id: TeamId,
    ) -> StandingsResult<WithdrawalOutcome> {
        let _guard = self.locks.lock(event_id).await;

        let matches_voided = self.store.repair_withdrawal(event_id, team_id).await?;
        if matches_voided > 0 {
            warn!(
                "Repaired withdrawal of team {} in event {}: {} leftover matches voided",
                team_id, event_id, matches_voided
            );
        }

        Ok(WithdrawalOutcome {
            event_id,
            team_id,
            matches_voided,
        })
    }

    /// Compute standings for an event without persisting them
    pub async fn compute(&self, event_id: EventId) -> StandingsResult<Vec<TeamStanding>> {
        let _guard = self.locks.lock(event_id).await;
        self.compute_locked(event_id).await
    }

    /// Persist previously computed standings
    pub async fn apply(&self, event_id: EventId, standings: &[TeamStanding]) -> ApplyReport {
        let _guard = self.locks.lock(event_id).await;
        apply_standings(self.store.as_ref(), event_id, standings).await
    }

    /// Compute and persist standings under one hold of the event lock
    ///
    /// Fails only if the computation fails; write failures are listed in the
    /// returned report and can be retried by calling this again.
    pub async fn recompute(&self, event_id: EventId) -> StandingsResult<ApplyReport> {
        let _guard = self.locks.lock(event_id).await;
        let standings = self.compute_locked(event_id).await?;
        Ok(apply_standings(self.store.as_ref(), event_id, &standings).await)
    }

    /// Stored standings, best first, without recomputing
    pub async fn standings_view(&self, event_id: EventId) -> StandingsResult<Vec<EventParticipation>> {
        if self.store.get_event(event_id).await?.is_none() {
            return Err(StandingsError::EventNotFound(event_id));
        }

        let mut rows = self.store.list_participation(event_id).await?;
        if rows.is_empty() {
            return Err(StandingsError::EventNotFound(event_id));
        }

        rows.sort_by(|a, b| {
            b.total_points
                .cmp(&a.total_points)
                .then(a.team_id.cmp(&b.team_id))
        });
        Ok(rows)
    }

    /// Record a match result and classify it against the league midpoint
    ///
    /// # Errors
    ///
    /// * `StandingsError::MatchNotFound` - Unknown match
    /// * `StandingsError::EventNotFound` / `StandingsError::LeagueNotFound` -
    ///   The match's event or league is missing
    /// * `StandingsError::MatchVoided` - The match was voided by a withdrawal
    /// * `StandingsError::InvalidResult` - See [`validate_result`]
    pub async fn record_result(
        &self,
        match_id: MatchId,
        result: &MatchResult,
    ) -> StandingsResult<Match> {
        let event_id = self
            .store
            .get_match(match_id)
            .await?
            .ok_or(StandingsError::MatchNotFound(match_id))?
            .event_id;

        let _guard = self.locks.lock(event_id).await;

        // Re-read under the lock; a withdrawal may have voided it meanwhile
        let existing = self
            .store
            .get_match(match_id)
            .await?
            .ok_or(StandingsError::MatchNotFound(match_id))?;
        let event = self
            .store
            .get_event(event_id)
            .await?
            .ok_or(StandingsError::EventNotFound(event_id))?;
        let league = self
            .store
            .get_league(event.league_id)
            .await?
            .ok_or(StandingsError::LeagueNotFound(event.league_id))?;

        validate_result(&existing, result)?;
        let before_midpoint = classify(&existing, result.match_date, league.midway_point);

        let updated = self
            .store
            .update_result(match_id, result, before_midpoint)
            .await?
            .ok_or(StandingsError::MatchNotFound(match_id))?;

        debug!(
            "Recorded result for match {} in event {} (before midpoint: {})",
            match_id, event_id, updated.before_midpoint
        );
        Ok(updated)
    }

    /// Create matches for the given pairs, skipping pairs already scheduled
    pub async fn schedule_matches(
        &self,
        event_id: EventId,
        pairs: &[(TeamId, TeamId)],
    ) -> StandingsResult<Vec<Match>> {
        let _guard = self.locks.lock(event_id).await;

        let snapshot = self.store.load_snapshot(event_id).await?;
        let planned = plan_matches(&snapshot, pairs)?;

        let mut created = Vec::with_capacity(planned.len());
        for new_match in &planned {
            created.push(self.store.insert_match(new_match).await?);
        }

        info!(
            "Scheduled {} matches in event {} ({} pairs requested)",
            created.len(),
            event_id,
            pairs.len()
        );
        Ok(created)
    }

    /// Enroll a team in an event with zeroed scores
    pub async fn enroll_team(
        &self,
        event_id: EventId,
        team_id: TeamId,
    ) -> StandingsResult<EventParticipation> {
        let _guard = self.locks.lock(event_id).await;

        if self.store.get_event(event_id).await?.is_none() {
            return Err(StandingsError::EventNotFound(event_id));
        }

        let participation = self.store.enroll_team(event_id, team_id).await?;
        info!("Team {} enrolled in event {}", team_id, event_id);
        Ok(participation)
    }

    async fn compute_locked(&self, event_id: EventId) -> StandingsResult<Vec<TeamStanding>> {
        let snapshot = self.store.load_snapshot(event_id).await?;
        compute_standings(&snapshot, &self.rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStandingsStore;
    use crate::standings::models::{Event, League};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn manager() -> StandingsManager<MemoryStandingsStore> {
        let store = MemoryStandingsStore::new()
            .with_league(League {
                id: 1,
                league_name: "Spring".to_string(),
                starting_date: Some(date(2024, 1, 1)),
                midway_point: date(2024, 3, 15),
                end_date: Some(date(2024, 6, 1)),
                is_finished: false,
            })
            .with_event(Event {
                id: 1,
                league_id: 1,
                event_name: "Open".to_string(),
                midway_matches: 1,
            });
        StandingsManager::new(Arc::new(store))
    }

    fn result(d: NaiveDate, winner: TeamId, sets: (i32, i32)) -> MatchResult {
        MatchResult {
            match_date: d,
            finished: true,
            winner_id: Some(winner),
            team1_sets: sets.0,
            team2_sets: sets.1,
            winner_score: None,
        }
    }

    #[tokio::test]
    async fn test_enroll_requires_event() {
        let manager = manager();
        assert!(manager.enroll_team(1, 10).await.is_ok());
        assert!(matches!(
            manager.enroll_team(1, 10).await,
            Err(StandingsError::AlreadyEnrolled { .. })
        ));
        assert!(matches!(
            manager.enroll_team(5, 10).await,
            Err(StandingsError::EventNotFound(5))
        ));
    }

    #[tokio::test]
    async fn test_record_result_classifies_and_sticks() {
        let manager = manager();
        manager.enroll_team(1, 10).await.unwrap();
        manager.enroll_team(1, 20).await.unwrap();
        let created = manager.schedule_matches(1, &[(10, 20)]).await.unwrap();
        let match_id = created[0].id;

        let m = manager
            .record_result(match_id, &result(date(2024, 3, 15), 10, (2, 1)))
            .await
            .unwrap();
        assert!(m.before_midpoint);

        // Correcting the date past the midpoint keeps the classification
        let m = manager
            .record_result(match_id, &result(date(2024, 4, 2), 10, (2, 0)))
            .await
            .unwrap();
        assert!(m.before_midpoint);
        assert_eq!(m.team2_sets, 0);
        assert_eq!(m.match_date, Some(date(2024, 4, 2)));
    }

    #[tokio::test]
    async fn test_record_result_errors() {
        let manager = manager();
        manager.enroll_team(1, 10).await.unwrap();
        manager.enroll_team(1, 20).await.unwrap();
        let match_id = manager.schedule_matches(1, &[(10, 20)]).await.unwrap()[0].id;

        assert!(matches!(
            manager
                .record_result(999, &result(date(2024, 2, 1), 10, (2, 0)))
                .await,
            Err(StandingsError::MatchNotFound(999))
        ));

        manager.withdraw(1, 20).await.unwrap();
        assert!(matches!(
            manager
                .record_result(match_id, &result(date(2024, 2, 1), 10, (2, 0)))
                .await,
            Err(StandingsError::MatchVoided(_))
        ));
    }

    #[tokio::test]
    async fn test_standings_view_orders_by_total() {
        let manager = manager();
        manager.enroll_team(1, 10).await.unwrap();
        manager.enroll_team(1, 20).await.unwrap();
        let match_id = manager.schedule_matches(1, &[(10, 20)]).await.unwrap()[0].id;
        manager
            .record_result(match_id, &result(date(2024, 2, 1), 20, (0, 2)))
            .await
            .unwrap();

        // Nothing stored yet, ties broken by team id
        let view = manager.standings_view(1).await.unwrap();
        assert_eq!(view[0].team_id, 10);

        manager.recompute(1).await.unwrap();
        let view = manager.standings_view(1).await.unwrap();
        assert_eq!(view[0].team_id, 20);
        assert!(view[0].total_points > view[1].total_points);

        assert!(matches!(
            manager.standings_view(8).await,
            Err(StandingsError::EventNotFound(8))
        ));
    }
}
