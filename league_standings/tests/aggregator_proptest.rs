/// Property-based tests for standings aggregation using proptest
///
/// These tests check the scoring formulas and bonus rules over randomly
/// generated events.
use league_standings::standings::{
    Event, EventParticipation, EventSnapshot, Match, ScoringRules, StandingsError,
    compute_standings, withdrawal::void_team_matches,
};
use proptest::prelude::*;

const TEAMS: i32 = 6;

// Strategy to generate one match between two distinct teams of event 1
fn match_strategy() -> impl Strategy<Value = (i32, i32, i32, i32, bool, bool)> {
    (1..=TEAMS, 1..TEAMS, 0i32..=3, 0i32..=3, any::<bool>(), any::<bool>()).prop_map(
        |(team1, offset, sets1, sets2, finished, before_midpoint)| {
            // Offset in 1..TEAMS always lands on a different team
            let team2 = (team1 - 1 + offset) % TEAMS + 1;
            (team1, team2, sets1, sets2, finished, before_midpoint)
        },
    )
}

// Strategy to generate a full event snapshot
fn snapshot_strategy() -> impl Strategy<Value = EventSnapshot> {
    (
        prop::collection::vec(match_strategy(), 0..30),
        prop::collection::vec((0i32..=5, prop::bool::weighted(0.2)), TEAMS as usize),
        0i32..=4,
    )
        .prop_map(|(raw_matches, stored, midway_matches)| {
            let matches = raw_matches
                .into_iter()
                .enumerate()
                .map(
                    |(i, (team1, team2, sets1, sets2, finished, before_midpoint))| Match {
                        id: i as i32 + 1,
                        event_id: 1,
                        team1_id: team1,
                        team2_id: team2,
                        team1_sets: sets1,
                        team2_sets: sets2,
                        finished,
                        winner_id: finished.then_some(if sets1 >= sets2 { team1 } else { team2 }),
                        winner_score: None,
                        match_date: None,
                        before_midpoint,
                        withdrawal: false,
                    },
                )
                .collect();

            let participation = stored
                .into_iter()
                .enumerate()
                .map(|(i, (challenger_bonus, has_mid_bonus))| EventParticipation {
                    challenger_bonus,
                    mid_bonus: if has_mid_bonus { 2 } else { 0 },
                    ..EventParticipation::enrolled(1, i as i32 + 1)
                })
                .collect();

            EventSnapshot {
                event: Event {
                    id: 1,
                    league_id: 1,
                    event_name: "Generated".to_string(),
                    midway_matches,
                },
                participation,
                matches,
            }
        })
}

proptest! {
    #[test]
    fn test_one_standing_per_enrolled_team(snapshot in snapshot_strategy()) {
        let standings = compute_standings(&snapshot, &ScoringRules::default()).unwrap();
        prop_assert_eq!(standings.len(), snapshot.participation.len());
        for (standing, p) in standings.iter().zip(&snapshot.participation) {
            prop_assert_eq!(standing.team_id, p.team_id);
        }
    }

    #[test]
    fn test_total_is_sum_of_components(snapshot in snapshot_strategy()) {
        let standings = compute_standings(&snapshot, &ScoringRules::default()).unwrap();
        for s in &standings {
            prop_assert_eq!(
                s.total_points,
                s.set_points + s.mid_bonus + s.all_bonus + s.challenger_bonus
            );
        }
    }

    #[test]
    fn test_set_points_are_two_per_set(snapshot in snapshot_strategy()) {
        let standings = compute_standings(&snapshot, &ScoringRules::default()).unwrap();
        for s in &standings {
            let sets: i32 = snapshot.matches.iter().map(|m| m.sets_for(s.team_id)).sum();
            prop_assert_eq!(s.set_points, sets * 2);
            prop_assert_eq!(s.tally.sets_won, sets);
        }
    }

    #[test]
    fn test_mid_bonus_never_drops(snapshot in snapshot_strategy()) {
        let standings = compute_standings(&snapshot, &ScoringRules::default()).unwrap();
        for (s, p) in standings.iter().zip(&snapshot.participation) {
            prop_assert!(s.mid_bonus >= p.mid_bonus, "mid bonus must not decrease");
        }
    }

    #[test]
    fn test_compute_is_deterministic(snapshot in snapshot_strategy()) {
        let rules = ScoringRules::default();
        let first = compute_standings(&snapshot, &rules).unwrap();
        let second = compute_standings(&snapshot, &rules).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_withdrawn_team_scores_no_sets(snapshot in snapshot_strategy(), team in 1..=TEAMS) {
        let mut snapshot = snapshot;
        void_team_matches(&mut snapshot.matches, 1, team);
        if let Some(p) = snapshot.participation.iter_mut().find(|p| p.team_id == team) {
            p.withdrawn = true;
        }

        let standings = compute_standings(&snapshot, &ScoringRules::default()).unwrap();
        let s = standings.iter().find(|s| s.team_id == team).unwrap();

        prop_assert_eq!(s.set_points, 0);
        if s.tally.total_matches > 0 {
            prop_assert_eq!(s.all_bonus, 0);
        }
    }

    #[test]
    fn test_large_set_counts_error_instead_of_panicking(
        snapshot in snapshot_strategy(),
        sets in 0i32..=i32::MAX,
    ) {
        let mut snapshot = snapshot;
        for m in &mut snapshot.matches {
            m.team1_sets = sets;
        }

        match compute_standings(&snapshot, &ScoringRules::default()) {
            Ok(standings) => {
                for s in &standings {
                    prop_assert!(s.set_points >= 0);
                    prop_assert_eq!(s.set_points, s.tally.sets_won * 2);
                }
            }
            Err(e) => {
                let is_overflow = matches!(e, StandingsError::ScoreOverflow { .. });
                prop_assert!(is_overflow);
            }
        }
    }
}
