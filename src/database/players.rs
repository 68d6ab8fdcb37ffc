//! Player Repository - PostgreSQL operations for players using sqlx

use sqlx::postgres::{PgPool, PgRow};
use sqlx::{PgConnection, Row};
use tracing::{debug, info};

use crate::error::{GameError, GameResult};
use crate::game::models::{Player, PlayerFilter};

const PLAYER_COLUMNS: &str =
    "alias, nickname, codename, passphrase, admin, alive, target, kills, revision";

pub struct PlayerRepository {
    pool: PgPool,
}

impl PlayerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn init_schema(&self) -> GameResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS game.players (
                alias VARCHAR(255) PRIMARY KEY,
                nickname VARCHAR(255) NOT NULL,
                codename VARCHAR(255) NOT NULL,
                passphrase VARCHAR(255) NOT NULL,
                admin BOOLEAN NOT NULL DEFAULT FALSE,
                alive BOOLEAN NOT NULL DEFAULT TRUE,
                target VARCHAR(255) NOT NULL DEFAULT '',
                kills INTEGER NOT NULL DEFAULT 0,
                revision BIGINT NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_players_target ON game.players(target)")
            .execute(&self.pool)
            .await?;

        info!("Players table ready");
        Ok(())
    }

    pub async fn get(&self, alias: &str) -> GameResult<Option<Player>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM game.players WHERE alias = $1",
            PLAYER_COLUMNS
        ))
        .bind(alias)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| player_from_row(&row)).transpose()
    }

    pub async fn insert(&self, player: &Player) -> GameResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO game.players
            (alias, nickname, codename, passphrase, admin, alive, target, kills, revision)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0)
            ON CONFLICT (alias) DO NOTHING
            "#,
        )
        .bind(&player.alias)
        .bind(&player.nickname)
        .bind(&player.codename)
        .bind(&player.passphrase)
        .bind(player.admin)
        .bind(player.alive)
        .bind(&player.target)
        .bind(player.kills as i32)
        .execute(&self.pool)
        .await?;

        debug!(alias = %player.alias, "Player inserted");
        Ok(result.rows_affected() == 1)
    }

    /// Unconditional write; bumps the revision
    pub async fn update(conn: &mut PgConnection, player: &Player) -> GameResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE game.players
            SET nickname = $2, codename = $3, passphrase = $4, admin = $5,
                alive = $6, target = $7, kills = $8, revision = revision + 1
            WHERE alias = $1
            "#,
        )
        .bind(&player.alias)
        .bind(&player.nickname)
        .bind(&player.codename)
        .bind(&player.passphrase)
        .bind(player.admin)
        .bind(player.alive)
        .bind(&player.target)
        .bind(player.kills as i32)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Write only if the stored revision still equals `player.revision`
    pub async fn update_if_revision(conn: &mut PgConnection, player: &Player) -> GameResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE game.players
            SET alive = $2, target = $3, kills = $4, revision = revision + 1
            WHERE alias = $1 AND revision = $5
            "#,
        )
        .bind(&player.alias)
        .bind(player.alive)
        .bind(&player.target)
        .bind(player.kills as i32)
        .bind(player.revision as i64)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn query(&self, filter: &PlayerFilter) -> GameResult<Vec<Player>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM game.players
            WHERE ($1::VARCHAR IS NULL OR alias = $1)
              AND ($2::VARCHAR IS NULL OR target = $2)
              AND ($3::BOOLEAN IS NULL OR alive = $3)
            ORDER BY alias
            "#,
            PLAYER_COLUMNS
        ))
        .bind(filter.alias.as_deref())
        .bind(filter.target.as_deref())
        .bind(filter.alive)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(player_from_row).collect()
    }

    pub async fn delete_all(conn: &mut PgConnection) -> GameResult<()> {
        sqlx::query("DELETE FROM game.players").execute(conn).await?;
        Ok(())
    }
}

fn player_from_row(row: &PgRow) -> GameResult<Player> {
    let kills: i32 = row.try_get("kills")?;
    let revision: i64 = row.try_get("revision")?;

    Ok(Player {
        alias: row.try_get("alias")?,
        nickname: row.try_get("nickname")?,
        codename: row.try_get("codename")?,
        passphrase: row.try_get("passphrase")?,
        admin: row.try_get("admin")?,
        alive: row.try_get("alive")?,
        target: row.try_get("target")?,
        kills: u32::try_from(kills)
            .map_err(|_| GameError::Storage(format!("negative kill count: {}", kills)))?,
        revision: u64::try_from(revision)
            .map_err(|_| GameError::Storage(format!("negative revision: {}", revision)))?,
    })
}
