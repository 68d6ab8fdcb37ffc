//! Claim Repository - append-only kill claim ledger in PostgreSQL

use sqlx::postgres::PgPool;
use sqlx::{PgConnection, Row};
use tracing::{debug, info};

use crate::error::GameResult;
use crate::game::models::{ClaimFilter, KillClaim};

pub struct ClaimRepository {
    pool: PgPool,
}

impl ClaimRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn init_schema(&self) -> GameResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS game.kill_claims (
                id BIGSERIAL PRIMARY KEY,
                killer VARCHAR(255) NOT NULL,
                victim VARCHAR(255) NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                UNIQUE (killer, victim)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Kill claims table ready");
        Ok(())
    }

    pub async fn find(&self, filter: &ClaimFilter) -> GameResult<Vec<KillClaim>> {
        let rows = sqlx::query(
            r#"
            SELECT killer, victim FROM game.kill_claims
            WHERE ($1::VARCHAR IS NULL OR killer = $1)
              AND ($2::VARCHAR IS NULL OR victim = $2)
            ORDER BY id
            "#,
        )
        .bind(filter.killer.as_deref())
        .bind(filter.victim.as_deref())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(KillClaim {
                    killer: Some(row.try_get("killer")?),
                    victim: row.try_get("victim")?,
                })
            })
            .collect()
    }

    /// Returns false when the ordered pair is already recorded
    pub async fn insert(conn: &mut PgConnection, claim: &KillClaim) -> GameResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO game.kill_claims (killer, victim)
            VALUES ($1, $2)
            ON CONFLICT (killer, victim) DO NOTHING
            "#,
        )
        .bind(claim.killer_alias())
        .bind(&claim.victim)
        .execute(conn)
        .await?;

        debug!(
            killer = %claim.killer_alias(),
            victim = %claim.victim,
            inserted = result.rows_affected() == 1,
            "Kill claim insert"
        );
        Ok(result.rows_affected() == 1)
    }

    pub async fn delete_all(conn: &mut PgConnection) -> GameResult<()> {
        sqlx::query("DELETE FROM game.kill_claims").execute(conn).await?;
        Ok(())
    }
}
