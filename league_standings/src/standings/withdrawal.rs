//! Team withdrawal rules.

use super::{
    errors::{StandingsError, StandingsResult},
    models::{EventId, EventParticipation, Match, TeamId},
};

/// Check that a team may withdraw from an event
///
/// # Errors
///
/// * `StandingsError::TeamNotEnrolled` - No participation row for the team
/// * `StandingsError::AlreadyWithdrawn` - The team withdrew before
pub fn ensure_can_withdraw(
    participation: Option<&EventParticipation>,
    event_id: EventId,
    team_id: TeamId,
) -> StandingsResult<()> {
    match participation {
        None => Err(StandingsError::TeamNotEnrolled { event_id, team_id }),
        Some(p) if p.withdrawn => Err(StandingsError::AlreadyWithdrawn { event_id, team_id }),
        Some(_) => Ok(()),
    }
}

/// Check that a withdrawal can be repaired
///
/// Repair re-runs the voiding for a team whose participation row is already
/// marked withdrawn, leaving the flag itself alone.
///
/// # Errors
///
/// * `StandingsError::TeamNotEnrolled` - No participation row for the team
/// * `StandingsError::NotWithdrawn` - The team is still active; use a regular
///   withdrawal instead
pub fn ensure_can_repair(
    participation: Option<&EventParticipation>,
    event_id: EventId,
    team_id: TeamId,
) -> StandingsResult<()> {
    match participation {
        None => Err(StandingsError::TeamNotEnrolled { event_id, team_id }),
        Some(p) if !p.withdrawn => Err(StandingsError::NotWithdrawn { event_id, team_id }),
        Some(_) => Ok(()),
    }
}

/// Zero set counts and raise the withdrawal flag on every match the team plays
/// in the event. Matches already flagged are left alone.
///
/// Returns the number of matches changed.
pub fn void_team_matches<'a>(
    matches: impl IntoIterator<Item = &'a mut Match>,
    event_id: EventId,
    team_id: TeamId,
) -> u64 {
    let mut voided = 0;
    for m in matches
        .into_iter()
        .filter(|m| m.event_id == event_id && m.involves(team_id) && !m.withdrawal)
    {
        m.team1_sets = 0;
        m.team2_sets = 0;
        m.withdrawal = true;
        voided += 1;
    }
    voided
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn scored(id: i32, event_id: EventId, team1: TeamId, team2: TeamId) -> Match {
        Match {
            id,
            event_id,
            team1_id: team1,
            team2_id: team2,
            team1_sets: 2,
            team2_sets: 1,
            finished: true,
            winner_id: Some(team1),
            winner_score: None,
            match_date: None,
            before_midpoint: true,
            withdrawal: false,
        }
    }

    #[test]
    fn test_void_only_team_matches_in_event() {
        let mut matches = vec![
            scored(1, 1, 10, 20),
            scored(2, 1, 30, 10),
            scored(3, 1, 20, 30),
            scored(4, 2, 10, 20),
        ];

        let voided = void_team_matches(&mut matches, 1, 10);
        assert_eq!(voided, 2);

        for m in &matches[..2] {
            assert_eq!(m.team1_sets, 0);
            assert_eq!(m.team2_sets, 0);
            assert!(m.withdrawal);
            // Timing classification survives the withdrawal
            assert!(m.before_midpoint);
        }

        // Other teams' match and the team's match in another event are untouched
        assert_eq!(matches[2].team1_sets, 2);
        assert!(!matches[2].withdrawal);
        assert_eq!(matches[3].team1_sets, 2);
        assert!(!matches[3].withdrawal);
    }

    #[test]
    fn test_void_is_idempotent_per_match() {
        let mut matches = vec![scored(1, 1, 10, 20)];
        assert_eq!(void_team_matches(&mut matches, 1, 10), 1);
        assert_eq!(void_team_matches(&mut matches, 1, 10), 0);
        // Opponent withdrawing later finds nothing left to void
        assert_eq!(void_team_matches(&mut matches, 1, 20), 0);
        assert!(matches[0].withdrawal);
    }

    #[test]
    fn test_void_through_map_values() {
        let mut matches: BTreeMap<i32, Match> = [scored(1, 1, 10, 20), scored(2, 1, 20, 30)]
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        assert_eq!(void_team_matches(matches.values_mut(), 1, 30), 1);
        assert_eq!(matches.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert!(!matches[&1].withdrawal);
        assert!(matches[&2].withdrawal);
        assert_eq!(matches[&2].id, 2);
    }

    #[test]
    fn test_ensure_can_repair() {
        let mut gone = EventParticipation::enrolled(1, 10);
        gone.withdrawn = true;
        assert!(ensure_can_repair(Some(&gone), 1, 10).is_ok());

        let active = EventParticipation::enrolled(1, 10);
        assert!(matches!(
            ensure_can_repair(Some(&active), 1, 10),
            Err(StandingsError::NotWithdrawn {
                event_id: 1,
                team_id: 10
            })
        ));
        assert!(matches!(
            ensure_can_repair(None, 1, 10),
            Err(StandingsError::TeamNotEnrolled { .. })
        ));
    }

    #[test]
    fn test_ensure_can_withdraw() {
        let active = EventParticipation::enrolled(1, 10);
        assert!(ensure_can_withdraw(Some(&active), 1, 10).is_ok());

        let mut gone = active.clone();
        gone.withdrawn = true;
        assert!(matches!(
            ensure_can_withdraw(Some(&gone), 1, 10),
            Err(StandingsError::AlreadyWithdrawn {
                event_id: 1,
                team_id: 10
            })
        ));

        assert!(matches!(
            ensure_can_withdraw(None, 1, 10),
            Err(StandingsError::TeamNotEnrolled {
                event_id: 1,
                team_id: 10
            })
        ));
    }
}
