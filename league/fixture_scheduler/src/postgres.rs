use async_trait::async_trait;
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    PgPool, Row,
};
use tracing::debug;

use crate::error::RepositoryError;
use crate::repository::{validate_batch, MatchRepository};
use crate::types::{DivisionId, MatchRecord, MatchStatus, NewMatch};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS matches (
    id BIGSERIAL PRIMARY KEY,
    division_id BIGINT NOT NULL,
    home_team_id BIGINT NOT NULL,
    away_team_id BIGINT NOT NULL,
    round INTEGER NOT NULL,
    match_date TIMESTAMPTZ NOT NULL,
    status TEXT NOT NULL DEFAULT 'SCHEDULED',
    home_score INTEGER NOT NULL DEFAULT 0,
    away_score INTEGER NOT NULL DEFAULT 0,
    CONSTRAINT matches_distinct_teams CHECK (home_team_id <> away_team_id)
);
CREATE INDEX IF NOT EXISTS matches_division_status_idx ON matches (division_id, status);
"#;

pub struct PostgresMatchRepository {
    pool: PgPool,
}

impl PostgresMatchRepository {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

fn to_i32(value: u32, column: &str) -> Result<i32, RepositoryError> {
    i32::try_from(value).map_err(|_| RepositoryError::Other(format!("{} out of range: {}", column, value)))
}

fn to_u32(value: i32, column: &str) -> Result<u32, RepositoryError> {
    u32::try_from(value).map_err(|_| RepositoryError::Other(format!("negative {}: {}", column, value)))
}

fn record_from_row(row: &PgRow) -> Result<MatchRecord, RepositoryError> {
    let status: String = row.try_get("status")?;
    Ok(MatchRecord {
        id: row.try_get("id")?,
        division_id: row.try_get("division_id")?,
        home_team_id: row.try_get("home_team_id")?,
        away_team_id: row.try_get("away_team_id")?,
        round: to_u32(row.try_get("round")?, "round")?,
        match_date: row.try_get("match_date")?,
        status: status.parse().map_err(RepositoryError::Other)?,
        home_score: to_u32(row.try_get("home_score")?, "home_score")?,
        away_score: to_u32(row.try_get("away_score")?, "away_score")?,
    })
}

#[async_trait]
impl MatchRepository for PostgresMatchRepository {
    async fn replace_scheduled(
        &self,
        division_id: DivisionId,
        matches: &[NewMatch],
    ) -> Result<Vec<MatchRecord>, RepositoryError> {
        validate_batch(division_id, matches)?;

        // Dropping the transaction on any early return rolls it back
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM matches WHERE division_id = $1 AND status = $2")
            .bind(division_id)
            .bind(MatchStatus::Scheduled.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let mut created = Vec::with_capacity(matches.len());
        for new_match in matches {
            let row = sqlx::query(
                r#"
                INSERT INTO matches (division_id, home_team_id, away_team_id, round, match_date, status)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id
                "#,
            )
            .bind(new_match.division_id)
            .bind(new_match.home_team_id)
            .bind(new_match.away_team_id)
            .bind(to_i32(new_match.round, "round")?)
            .bind(new_match.match_date)
            .bind(MatchStatus::Scheduled.as_str())
            .fetch_one(&mut *tx)
            .await?;

            created.push(MatchRecord::scheduled(row.try_get("id")?, new_match));
        }

        tx.commit().await?;
        debug!(
            "Division {}: deleted {} scheduled matches, inserted {}",
            division_id,
            deleted,
            created.len()
        );
        Ok(created)
    }

    async fn matches_for_division(
        &self,
        division_id: DivisionId,
    ) -> Result<Vec<MatchRecord>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, division_id, home_team_id, away_team_id, round, match_date,
                   status, home_score, away_score
            FROM matches
            WHERE division_id = $1
            ORDER BY match_date, id
            "#,
        )
        .bind(division_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(record_from_row).collect()
    }
}
