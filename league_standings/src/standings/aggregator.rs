//! Standings aggregation over an event snapshot.
//!
//! Everything here is synchronous and storage-free: the caller loads an
//! [`EventSnapshot`], the aggregator turns it into one [`TeamStanding`] per
//! enrolled team, and the writer persists the result.
//!
//! Bonus rules:
//! - the mid bonus is granted once `matches_before_midpoint` reaches the event's
//!   `midway_matches` and is never taken back;
//! - the all bonus is re-evaluated on every pass for teams that have finished all
//!   matches still counting; a withdrawn team is evaluated to zero, and a team
//!   that is not eligible keeps whatever value is stored;
//! - teams without any match are not evaluated for either bonus.

use super::{
    config::ScoringRules,
    errors::{StandingsError, StandingsResult},
    models::{Event, EventParticipation, EventSnapshot, Match, MatchTally, TeamId, TeamStanding},
};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};

/// Compute standings for every team enrolled in the snapshot's event
///
/// # Errors
///
/// * `StandingsError::EventNotFound` - The event has no participation rows
/// * `StandingsError::InconsistentSnapshot` - A withdrawn team has a match not yet
///   flagged for withdrawal
/// * `StandingsError::ScoreOverflow` - A team's stored sets or bonuses add up
///   past `i32::MAX`
pub fn compute_standings(
    snapshot: &EventSnapshot,
    rules: &ScoringRules,
) -> StandingsResult<Vec<TeamStanding>> {
    let event = &snapshot.event;

    if snapshot.participation.is_empty() {
        return Err(StandingsError::EventNotFound(event.id));
    }

    check_consistency(snapshot)?;

    let tallies = tally_event(&snapshot.matches, event)?;
    debug!(
        "Computing standings for event {}: {} teams, {} matches",
        event.id,
        snapshot.participation.len(),
        snapshot.matches.len()
    );

    snapshot
        .participation
        .iter()
        .map(|p| {
            let tally = tallies.get(&p.team_id).copied().unwrap_or_default();
            derive_standing(p, tally, event, rules)
        })
        .collect()
}

/// Count one team's matches in a slice
///
/// # Errors
///
/// * `StandingsError::ScoreOverflow` - The team's set counts do not fit in `i32`
pub fn tally_matches(team_id: TeamId, matches: &[Match]) -> StandingsResult<MatchTally> {
    let mut tally = MatchTally::default();
    for m in matches.iter().filter(|m| m.involves(team_id)) {
        add_match(&mut tally, team_id, m)?;
    }
    Ok(tally)
}

/// Tally every team referenced by the event's matches in one pass
fn tally_event(matches: &[Match], event: &Event) -> StandingsResult<HashMap<TeamId, MatchTally>> {
    let mut tallies: HashMap<TeamId, MatchTally> = HashMap::new();

    for m in matches.iter().filter(|m| m.event_id == event.id) {
        add_match(tallies.entry(m.team1_id).or_default(), m.team1_id, m)?;
        if m.team2_id != m.team1_id {
            add_match(tallies.entry(m.team2_id).or_default(), m.team2_id, m)?;
        }
    }

    Ok(tallies)
}

fn add_match(tally: &mut MatchTally, team_id: TeamId, m: &Match) -> StandingsResult<()> {
    tally.total_matches += 1;
    if m.finished {
        tally.played_matches += 1;
    }
    if !m.withdrawal {
        tally.notwithdrawn_total += 1;
        if m.finished {
            tally.completed_notwithdrawn += 1;
        }
    }
    if m.winner_id == Some(team_id) {
        tally.wins += 1;
    }
    if m.before_midpoint {
        tally.matches_before_midpoint += 1;
    }
    tally.sets_won = tally
        .sets_won
        .checked_add(m.sets_for(team_id))
        .ok_or(StandingsError::ScoreOverflow {
            event_id: m.event_id,
            team_id,
        })?;
    Ok(())
}

/// Derive scoring fields for one team from its tally and stored row
///
/// # Errors
///
/// * `StandingsError::ScoreOverflow` - Set points or the total do not fit in `i32`
pub fn derive_standing(
    participation: &EventParticipation,
    tally: MatchTally,
    event: &Event,
    rules: &ScoringRules,
) -> StandingsResult<TeamStanding> {
    let overflow = || StandingsError::ScoreOverflow {
        event_id: participation.event_id,
        team_id: participation.team_id,
    };

    let set_points = tally
        .sets_won
        .checked_mul(rules.set_points_per_set)
        .ok_or_else(overflow)?;
    let mid_bonus = mid_bonus(participation, &tally, event, rules);
    let all_bonus = all_bonus(participation, &tally, rules);
    let total_points = [mid_bonus, all_bonus, participation.challenger_bonus]
        .into_iter()
        .try_fold(set_points, i32::checked_add)
        .ok_or_else(overflow)?;

    Ok(TeamStanding {
        event_id: participation.event_id,
        team_id: participation.team_id,
        tally,
        withdrawn: participation.withdrawn,
        set_points,
        mid_bonus,
        all_bonus,
        challenger_bonus: participation.challenger_bonus,
        total_points,
    })
}

fn mid_bonus(
    participation: &EventParticipation,
    tally: &MatchTally,
    event: &Event,
    rules: &ScoringRules,
) -> i32 {
    if participation.mid_bonus >= rules.mid_bonus || tally.total_matches == 0 {
        return participation.mid_bonus;
    }

    if i64::from(tally.matches_before_midpoint) >= i64::from(event.midway_matches) {
        rules.mid_bonus
    } else {
        participation.mid_bonus
    }
}

fn all_bonus(participation: &EventParticipation, tally: &MatchTally, rules: &ScoringRules) -> i32 {
    let eligible =
        tally.total_matches > 0 && tally.completed_notwithdrawn >= tally.notwithdrawn_total;

    match (eligible, participation.withdrawn) {
        (true, true) => 0,
        (true, false) => rules.all_bonus,
        (false, _) => participation.all_bonus,
    }
}

/// Reject snapshots where a withdrawal is visible on the participation side but
/// not yet on every one of the team's matches.
fn check_consistency(snapshot: &EventSnapshot) -> StandingsResult<()> {
    let withdrawn: HashSet<TeamId> = snapshot
        .participation
        .iter()
        .filter(|p| p.withdrawn)
        .map(|p| p.team_id)
        .collect();

    if withdrawn.is_empty() {
        return Ok(());
    }

    let torn = snapshot
        .matches
        .iter()
        .filter(|m| !m.withdrawal)
        .find_map(|m| {
            [m.team1_id, m.team2_id]
                .into_iter()
                .find(|team_id| withdrawn.contains(team_id))
                .map(|team_id| (m.id, team_id))
        });

    match torn {
        Some((match_id, team_id)) => {
            warn!(
                "Event {}: match {} involves withdrawn team {} but is not voided; \
                 repair with repair_withdrawal({}, {})",
                snapshot.event.id, match_id, team_id, snapshot.event.id, team_id
            );
            Err(StandingsError::InconsistentSnapshot {
                event_id: snapshot.event.id,
                team_id,
                match_id,
            })
        }
        None => Ok(()),
    }
}
