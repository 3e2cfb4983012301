//! PostgreSQL implementation of the standings store.
//!
//! Expected tables (schema management lives outside this crate):
//!
//! - `leagues(id, league_name, starting_date, midway_point, end_date, isfinished)`
//! - `events(event_id, league_id, event_name, midway_matches)`
//! - `event_teams(event_id, team_id, set_points, mid_bonus, all_bonus,
//!   challenger_bonus, total_points, team_withdrawn)`, unique on
//!   `(event_id, team_id)`
//! - `matches(match_id, event_id, team1_id, team2_id, team1_sets, team2_sets,
//!   isfinished, winner_id, winner_score, match_date, bymidpoint, withdrawal)`
//!
//! Ids, set counts and point columns are `INTEGER`; scoring, set and flag
//! columns are `NOT NULL`. A `NULL` there is reported as a database error
//! rather than read as zero.

use super::{
    repository::{EventRepository, MatchRepository, ParticipationRepository, StandingsStore},
    timeouts::{with_default_timeout, with_transaction_timeout},
};
use crate::standings::{
    errors::{StandingsError, StandingsResult},
    models::{
        Event, EventId, EventParticipation, EventSnapshot, League, LeagueId, Match, MatchId,
        MatchResult, NewMatch, TeamId, TeamStanding,
    },
    withdrawal::{ensure_can_repair, ensure_can_withdraw},
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

/// PostgreSQL-backed [`StandingsStore`]
#[derive(Clone)]
pub struct PgStandingsStore {
    pool: PgPool,
}

impl PgStandingsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn snapshot_in_transaction(&self, event_id: EventId) -> StandingsResult<EventSnapshot> {
        let mut tx = self.pool.begin().await?;

        // Every read below sees the same committed state
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let event = sqlx::query(
            "SELECT event_id, league_id, event_name, midway_matches FROM events WHERE event_id = $1",
        )
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?
        .map(|row| event_from_row(&row))
        .transpose()?
        .ok_or(StandingsError::EventNotFound(event_id))?;

        let participation = sqlx::query(
            r#"
            SELECT event_id, team_id, set_points, mid_bonus, all_bonus, challenger_bonus,
                   total_points, team_withdrawn
            FROM event_teams
            WHERE event_id = $1
            ORDER BY team_id
            "#,
        )
        .bind(event_id)
        .fetch_all(&mut *tx)
        .await?
        .iter()
        .map(participation_from_row)
        .collect::<Result<Vec<_>, _>>()?;

        let matches = sqlx::query(
            r#"
            SELECT match_id, event_id, team1_id, team2_id, team1_sets, team2_sets, isfinished,
                   winner_id, winner_score, match_date, bymidpoint, withdrawal
            FROM matches
            WHERE event_id = $1
            ORDER BY match_id
            "#,
        )
        .bind(event_id)
        .fetch_all(&mut *tx)
        .await?
        .iter()
        .map(match_from_row)
        .collect::<Result<Vec<_>, _>>()?;

        tx.commit().await?;

        Ok(EventSnapshot {
            event,
            participation,
            matches,
        })
    }

    /// Lock and read one participation row inside `tx`
    async fn participation_for_update(
        tx: &mut Transaction<'_, Postgres>,
        event_id: EventId,
        team_id: TeamId,
    ) -> StandingsResult<Option<EventParticipation>> {
        let participation = sqlx::query(
            r#"
            SELECT event_id, team_id, set_points, mid_bonus, all_bonus, challenger_bonus,
                   total_points, team_withdrawn
            FROM event_teams
            WHERE event_id = $1 AND team_id = $2
            FOR UPDATE
            "#,
        )
        .bind(event_id)
        .bind(team_id)
        .fetch_optional(&mut **tx)
        .await?
        .map(|row| participation_from_row(&row))
        .transpose()?;

        Ok(participation)
    }

    async fn void_matches(
        tx: &mut Transaction<'_, Postgres>,
        event_id: EventId,
        team_id: TeamId,
    ) -> StandingsResult<u64> {
        let voided = sqlx::query(
            r#"
            UPDATE matches
            SET team1_sets = 0, team2_sets = 0, withdrawal = TRUE
            WHERE event_id = $1 AND (team1_id = $2 OR team2_id = $2) AND NOT withdrawal
            "#,
        )
        .bind(event_id)
        .bind(team_id)
        .execute(&mut **tx)
        .await?
        .rows_affected();

        Ok(voided)
    }

    async fn withdraw_in_transaction(
        &self,
        event_id: EventId,
        team_id: TeamId,
    ) -> StandingsResult<u64> {
        let mut tx = self.pool.begin().await?;

        // Row lock so a concurrent withdrawal of the same team waits and then
        // sees the flag
        let participation = Self::participation_for_update(&mut tx, event_id, team_id).await?;
        ensure_can_withdraw(participation.as_ref(), event_id, team_id)?;

        let voided = Self::void_matches(&mut tx, event_id, team_id).await?;

        sqlx::query(
            "UPDATE event_teams SET team_withdrawn = TRUE WHERE event_id = $1 AND team_id = $2",
        )
        .bind(event_id)
        .bind(team_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(voided)
    }

    async fn repair_in_transaction(
        &self,
        event_id: EventId,
        team_id: TeamId,
    ) -> StandingsResult<u64> {
        let mut tx = self.pool.begin().await?;

        let participation = Self::participation_for_update(&mut tx, event_id, team_id).await?;
        ensure_can_repair(participation.as_ref(), event_id, team_id)?;

        let voided = Self::void_matches(&mut tx, event_id, team_id).await?;
        tx.commit().await?;

        Ok(voided)
    }
}

#[async_trait]
impl EventRepository for PgStandingsStore {
    async fn get_event(&self, event_id: EventId) -> StandingsResult<Option<Event>> {
        let row = with_default_timeout(
            sqlx::query(
                "SELECT event_id, league_id, event_name, midway_matches FROM events WHERE event_id = $1",
            )
            .bind(event_id)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.map(|r| event_from_row(&r)).transpose()?)
    }

    async fn get_league(&self, league_id: LeagueId) -> StandingsResult<Option<League>> {
        let row = with_default_timeout(
            sqlx::query(
                r#"
                SELECT id, league_name, starting_date, midway_point, end_date, isfinished
                FROM leagues
                WHERE id = $1
                "#,
            )
            .bind(league_id)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.map(|r| league_from_row(&r)).transpose()?)
    }
}

#[async_trait]
impl MatchRepository for PgStandingsStore {
    async fn list_matches(&self, event_id: EventId) -> StandingsResult<Vec<Match>> {
        let rows = with_default_timeout(
            sqlx::query(
                r#"
                SELECT match_id, event_id, team1_id, team2_id, team1_sets, team2_sets, isfinished,
                       winner_id, winner_score, match_date, bymidpoint, withdrawal
                FROM matches
                WHERE event_id = $1
                ORDER BY match_id
                "#,
            )
            .bind(event_id)
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(rows
            .iter()
            .map(match_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn get_match(&self, match_id: MatchId) -> StandingsResult<Option<Match>> {
        let row = with_default_timeout(
            sqlx::query(
                r#"
                SELECT match_id, event_id, team1_id, team2_id, team1_sets, team2_sets, isfinished,
                       winner_id, winner_score, match_date, bymidpoint, withdrawal
                FROM matches
                WHERE match_id = $1
                "#,
            )
            .bind(match_id)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.map(|r| match_from_row(&r)).transpose()?)
    }

    async fn insert_match(&self, new_match: &NewMatch) -> StandingsResult<Match> {
        let row = with_default_timeout(
            sqlx::query(
                r#"
                INSERT INTO matches (event_id, team1_id, team2_id, team1_sets, team2_sets,
                                     isfinished, bymidpoint, withdrawal)
                VALUES ($1, $2, $3, 0, 0, FALSE, FALSE, $4)
                RETURNING match_id, event_id, team1_id, team2_id, team1_sets, team2_sets,
                          isfinished, winner_id, winner_score, match_date, bymidpoint, withdrawal
                "#,
            )
            .bind(new_match.event_id)
            .bind(new_match.team1_id)
            .bind(new_match.team2_id)
            .bind(new_match.withdrawal)
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(match_from_row(&row)?)
    }

    async fn update_result(
        &self,
        match_id: MatchId,
        result: &MatchResult,
        before_midpoint: bool,
    ) -> StandingsResult<Option<Match>> {
        let row = with_default_timeout(
            sqlx::query(
                r#"
                UPDATE matches
                SET match_date = $2, isfinished = $3, winner_id = $4, team1_sets = $5,
                    team2_sets = $6, winner_score = $7, bymidpoint = bymidpoint OR $8
                WHERE match_id = $1
                RETURNING match_id, event_id, team1_id, team2_id, team1_sets, team2_sets,
                          isfinished, winner_id, winner_score, match_date, bymidpoint, withdrawal
                "#,
            )
            .bind(match_id)
            .bind(result.match_date)
            .bind(result.finished)
            .bind(result.winner_id)
            .bind(result.team1_sets)
            .bind(result.team2_sets)
            .bind(result.winner_score.as_deref())
            .bind(before_midpoint)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.map(|r| match_from_row(&r)).transpose()?)
    }
}

#[async_trait]
impl ParticipationRepository for PgStandingsStore {
    async fn list_participation(
        &self,
        event_id: EventId,
    ) -> StandingsResult<Vec<EventParticipation>> {
        let rows = with_default_timeout(
            sqlx::query(
                r#"
                SELECT event_id, team_id, set_points, mid_bonus, all_bonus, challenger_bonus,
                       total_points, team_withdrawn
                FROM event_teams
                WHERE event_id = $1
                ORDER BY team_id
                "#,
            )
            .bind(event_id)
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(rows
            .iter()
            .map(participation_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn get_participation(
        &self,
        event_id: EventId,
        team_id: TeamId,
    ) -> StandingsResult<Option<EventParticipation>> {
        let row = with_default_timeout(
            sqlx::query(
                r#"
                SELECT event_id, team_id, set_points, mid_bonus, all_bonus, challenger_bonus,
                       total_points, team_withdrawn
                FROM event_teams
                WHERE event_id = $1 AND team_id = $2
                "#,
            )
            .bind(event_id)
            .bind(team_id)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.map(|r| participation_from_row(&r)).transpose()?)
    }

    async fn enroll_team(
        &self,
        event_id: EventId,
        team_id: TeamId,
    ) -> StandingsResult<EventParticipation> {
        let row = with_default_timeout(
            sqlx::query(
                r#"
                INSERT INTO event_teams (event_id, team_id, set_points, mid_bonus, all_bonus,
                                         challenger_bonus, total_points, team_withdrawn)
                VALUES ($1, $2, 0, 0, 0, 0, 0, FALSE)
                ON CONFLICT (event_id, team_id) DO NOTHING
                RETURNING event_id, team_id, set_points, mid_bonus, all_bonus, challenger_bonus,
                          total_points, team_withdrawn
                "#,
            )
            .bind(event_id)
            .bind(team_id)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or(StandingsError::AlreadyEnrolled { event_id, team_id })?;

        Ok(participation_from_row(&row)?)
    }

    async fn write_standing(
        &self,
        standing: &TeamStanding,
    ) -> StandingsResult<Option<EventParticipation>> {
        // Right-hand sides see the pre-update row, so both GREATEST calls use the
        // same stored mid bonus
        let row = with_default_timeout(
            sqlx::query(
                r#"
                UPDATE event_teams
                SET set_points = $3,
                    mid_bonus = GREATEST(mid_bonus, $4),
                    all_bonus = $5,
                    total_points = $3 + GREATEST(mid_bonus, $4) + $5 + challenger_bonus
                WHERE event_id = $1 AND team_id = $2
                RETURNING event_id, team_id, set_points, mid_bonus, all_bonus, challenger_bonus,
                          total_points, team_withdrawn
                "#,
            )
            .bind(standing.event_id)
            .bind(standing.team_id)
            .bind(standing.set_points)
            .bind(standing.mid_bonus)
            .bind(standing.all_bonus)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.map(|r| participation_from_row(&r)).transpose()?)
    }
}

#[async_trait]
impl StandingsStore for PgStandingsStore {
    async fn load_snapshot(&self, event_id: EventId) -> StandingsResult<EventSnapshot> {
        with_transaction_timeout(self.snapshot_in_transaction(event_id)).await
    }

    async fn withdraw_team(&self, event_id: EventId, team_id: TeamId) -> StandingsResult<u64> {
        with_transaction_timeout(self.withdraw_in_transaction(event_id, team_id)).await
    }

    async fn repair_withdrawal(&self, event_id: EventId, team_id: TeamId) -> StandingsResult<u64> {
        with_transaction_timeout(self.repair_in_transaction(event_id, team_id)).await
    }
}

fn league_from_row(row: &PgRow) -> Result<League, sqlx::Error> {
    Ok(League {
        id: row.try_get("id")?,
        league_name: row.try_get("league_name")?,
        starting_date: row.try_get("starting_date")?,
        midway_point: row.try_get("midway_point")?,
        end_date: row.try_get("end_date")?,
        is_finished: row.try_get("isfinished")?,
    })
}

fn event_from_row(row: &PgRow) -> Result<Event, sqlx::Error> {
    Ok(Event {
        id: row.try_get("event_id")?,
        league_id: row.try_get("league_id")?,
        event_name: row.try_get("event_name")?,
        midway_matches: row.try_get("midway_matches")?,
    })
}

fn participation_from_row(row: &PgRow) -> Result<EventParticipation, sqlx::Error> {
    Ok(EventParticipation {
        event_id: row.try_get("event_id")?,
        team_id: row.try_get("team_id")?,
        set_points: row.try_get("set_points")?,
        mid_bonus: row.try_get("mid_bonus")?,
        all_bonus: row.try_get("all_bonus")?,
        challenger_bonus: row.try_get("challenger_bonus")?,
        total_points: row.try_get("total_points")?,
        withdrawn: row.try_get("team_withdrawn")?,
    })
}

fn match_from_row(row: &PgRow) -> Result<Match, sqlx::Error> {
    Ok(Match {
        id: row.try_get("match_id")?,
        event_id: row.try_get("event_id")?,
        team1_id: row.try_get("team1_id")?,
        team2_id: row.try_get("team2_id")?,
        team1_sets: row.try_get("team1_sets")?,
        team2_sets: row.try_get("team2_sets")?,
        finished: row.try_get("isfinished")?,
        winner_id: row.try_get("winner_id")?,
        winner_score: row.try_get("winner_score")?,
        match_date: row.try_get("match_date")?,
        before_midpoint: row.try_get("bymidpoint")?,
        withdrawal: row.try_get("withdrawal")?,
    })
}
