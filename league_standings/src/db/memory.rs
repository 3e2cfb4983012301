//! In-memory standings store.
//!
//! Holds all tables behind one mutex, so a snapshot or a withdrawal sees and
//! changes a single consistent state. Used by tests, benchmarks and dry runs.

use super::repository::{EventRepository, MatchRepository, ParticipationRepository, StandingsStore};
use crate::standings::{
    errors::{StandingsError, StandingsResult},
    models::{
        Event, EventId, EventParticipation, EventSnapshot, League, LeagueId, Match, MatchId,
        MatchResult, NewMatch, TeamId, TeamStanding,
    },
    withdrawal::{ensure_can_repair, ensure_can_withdraw, void_team_matches},
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct MemoryState {
    leagues: HashMap<LeagueId, League>,
    events: HashMap<EventId, Event>,
    participation: BTreeMap<(EventId, TeamId), EventParticipation>,
    matches: BTreeMap<MatchId, Match>,
    rejected_writes: HashSet<TeamId>,
}

/// [`StandingsStore`] kept entirely in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStandingsStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStandingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_league(self, league: League) -> Self {
        self.state().leagues.insert(league.id, league);
        self
    }

    pub fn with_event(self, event: Event) -> Self {
        self.state().events.insert(event.id, event);
        self
    }

    pub fn with_participation(self, participation: EventParticipation) -> Self {
        self.state()
            .participation
            .insert((participation.event_id, participation.team_id), participation);
        self
    }

    pub fn with_match(self, m: Match) -> Self {
        self.state().matches.insert(m.id, m);
        self
    }

    /// Make every later `write_standing` for the team fail
    pub fn reject_writes_for(&self, team_id: TeamId) {
        self.state().rejected_writes.insert(team_id);
    }

    /// Undo [`Self::reject_writes_for`]
    pub fn accept_writes(&self, team_id: TeamId) {
        self.state().rejected_writes.remove(&team_id);
    }

    /// Overwrite a team's challenger bonus, as an outside process would
    pub fn set_challenger_bonus(&self, event_id: EventId, team_id: TeamId, bonus: i32) {
        if let Some(p) = self.state().participation.get_mut(&(event_id, team_id)) {
            p.challenger_bonus = bonus;
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        // Every mutation completes under the lock, so a poisoned state is still whole
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MemoryState {
    fn event_participation(&self, event_id: EventId) -> Vec<EventParticipation> {
        self.participation
            .range((event_id, TeamId::MIN)..=(event_id, TeamId::MAX))
            .map(|(_, p)| p.clone())
            .collect()
    }

    fn event_matches(&self, event_id: EventId) -> Vec<Match> {
        self.matches
            .values()
            .filter(|m| m.event_id == event_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventRepository for MemoryStandingsStore {
    async fn get_event(&self, event_id: EventId) -> StandingsResult<Option<Event>> {
        Ok(self.state().events.get(&event_id).cloned())
    }

    async fn get_league(&self, league_id: LeagueId) -> StandingsResult<Option<League>> {
        Ok(self.state().leagues.get(&league_id).cloned())
    }
}

#[async_trait]
impl MatchRepository for MemoryStandingsStore {
    async fn list_matches(&self, event_id: EventId) -> StandingsResult<Vec<Match>> {
        Ok(self.state().event_matches(event_id))
    }

    async fn get_match(&self, match_id: MatchId) -> StandingsResult<Option<Match>> {
        Ok(self.state().matches.get(&match_id).cloned())
    }

    async fn insert_match(&self, new_match: &NewMatch) -> StandingsResult<Match> {
        let mut state = self.state();
        let id = state.matches.keys().next_back().map_or(1, |last| last + 1);
        let m = Match {
            id,
            event_id: new_match.event_id,
            team1_id: new_match.team1_id,
            team2_id: new_match.team2_id,
            team1_sets: 0,
            team2_sets: 0,
            finished: false,
            winner_id: None,
            winner_score: None,
            match_date: None,
            before_midpoint: false,
            withdrawal: new_match.withdrawal,
        };
        state.matches.insert(id, m.clone());
        Ok(m)
    }

    async fn update_result(
        &self,
        match_id: MatchId,
        result: &MatchResult,
        before_midpoint: bool,
    ) -> StandingsResult<Option<Match>> {
        let mut state = self.state();
        let Some(m) = state.matches.get_mut(&match_id) else {
            return Ok(None);
        };
        m.match_date = Some(result.match_date);
        m.finished = result.finished;
        m.winner_id = result.winner_id;
        m.team1_sets = result.team1_sets;
        m.team2_sets = result.team2_sets;
        m.winner_score = result.winner_score.clone();
        m.before_midpoint |= before_midpoint;
        Ok(Some(m.clone()))
    }
}

#[async_trait]
impl ParticipationRepository for MemoryStandingsStore {
    async fn list_participation(
        &self,
        event_id: EventId,
    ) -> StandingsResult<Vec<EventParticipation>> {
        Ok(self.state().event_participation(event_id))
    }

    async fn get_participation(
        &self,
        event_id: EventId,
        team_id: TeamId,
    ) -> StandingsResult<Option<EventParticipation>> {
        Ok(self.state().participation.get(&(event_id, team_id)).cloned())
    }

    async fn enroll_team(
        &self,
        event_id: EventId,
        team_id: TeamId,
    ) -> StandingsResult<EventParticipation> {
        let mut state = self.state();
        if state.participation.contains_key(&(event_id, team_id)) {
            return Err(StandingsError::AlreadyEnrolled { event_id, team_id });
        }
        let p = EventParticipation::enrolled(event_id, team_id);
        state.participation.insert((event_id, team_id), p.clone());
        Ok(p)
    }

    async fn write_standing(
        &self,
        standing: &TeamStanding,
    ) -> StandingsResult<Option<EventParticipation>> {
        let mut state = self.state();
        if state.rejected_writes.contains(&standing.team_id) {
            return Err(StandingsError::WriteRejected {
                team_id: standing.team_id,
                reason: "store refused the write".to_string(),
            });
        }
        let Some(p) = state
            .participation
            .get_mut(&(standing.event_id, standing.team_id))
        else {
            return Ok(None);
        };
        let mid_bonus = p.mid_bonus.max(standing.mid_bonus);
        // Same INTEGER range failure the database reports for this sum
        let total_points = [mid_bonus, standing.all_bonus, p.challenger_bonus]
            .into_iter()
            .try_fold(standing.set_points, i32::checked_add)
            .ok_or_else(|| StandingsError::WriteRejected {
                team_id: standing.team_id,
                reason: "total points out of range".to_string(),
            })?;

        p.set_points = standing.set_points;
        p.mid_bonus = mid_bonus;
        p.all_bonus = standing.all_bonus;
        p.total_points = total_points;
        Ok(Some(p.clone()))
    }
}

#[async_trait]
impl StandingsStore for MemoryStandingsStore {
    async fn load_snapshot(&self, event_id: EventId) -> StandingsResult<EventSnapshot> {
        let state = self.state();
        let event = state
            .events
            .get(&event_id)
            .cloned()
            .ok_or(StandingsError::EventNotFound(event_id))?;
        Ok(EventSnapshot {
            event,
            participation: state.event_participation(event_id),
            matches: state.event_matches(event_id),
        })
    }

    async fn withdraw_team(&self, event_id: EventId, team_id: TeamId) -> StandingsResult<u64> {
        let mut state = self.state();
        ensure_can_withdraw(state.participation.get(&(event_id, team_id)), event_id, team_id)?;

        let voided = void_team_matches(state.matches.values_mut(), event_id, team_id);

        if let Some(p) = state.participation.get_mut(&(event_id, team_id)) {
            p.withdrawn = true;
        }
        Ok(voided)
    }

    async fn repair_withdrawal(&self, event_id: EventId, team_id: TeamId) -> StandingsResult<u64> {
        let mut state = self.state();
        ensure_can_repair(state.participation.get(&(event_id, team_id)), event_id, team_id)?;
        Ok(void_team_matches(state.matches.values_mut(), event_id, team_id))
    }
}
