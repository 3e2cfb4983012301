//! Planning new matches for an event.

use crate::standings::{
    errors::{StandingsError, StandingsResult},
    models::{EventParticipation, EventSnapshot, NewMatch, TeamId},
};
use std::collections::{HashMap, HashSet};

/// Turn requested pairings into the matches that still need inserting
///
/// Pairs already played or scheduled in the event are skipped regardless of
/// order, as are repeats within the request. A pairing with a withdrawn team is
/// created already flagged for withdrawal.
///
/// # Errors
///
/// * `StandingsError::InvalidResult` - A team is paired with itself
/// * `StandingsError::TeamNotEnrolled` - A team has no participation in the event
pub fn plan_matches(
    snapshot: &EventSnapshot,
    pairs: &[(TeamId, TeamId)],
) -> StandingsResult<Vec<NewMatch>> {
    let event_id = snapshot.event.id;
    let enrolled: HashMap<TeamId, &EventParticipation> = snapshot
        .participation
        .iter()
        .map(|p| (p.team_id, p))
        .collect();

    let mut seen: HashSet<(TeamId, TeamId)> = snapshot
        .matches
        .iter()
        .map(|m| pair_key(m.team1_id, m.team2_id))
        .collect();

    let mut planned = Vec::new();
    for &(team1_id, team2_id) in pairs {
        if team1_id == team2_id {
            return Err(StandingsError::InvalidResult(format!(
                "team {team1_id} cannot play itself"
            )));
        }

        let mut withdrawal = false;
        for team_id in [team1_id, team2_id] {
            let participation = enrolled
                .get(&team_id)
                .ok_or(StandingsError::TeamNotEnrolled { event_id, team_id })?;
            withdrawal |= participation.withdrawn;
        }

        if !seen.insert(pair_key(team1_id, team2_id)) {
            continue;
        }

        planned.push(NewMatch {
            event_id,
            team1_id,
            team2_id,
            withdrawal,
        });
    }

    Ok(planned)
}

fn pair_key(a: TeamId, b: TeamId) -> (TeamId, TeamId) {
    if a <= b { (a, b) } else { (b, a) }
}
