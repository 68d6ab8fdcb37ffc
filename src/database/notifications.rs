//! Notification Repository - persisted broadcast messages

use sqlx::postgres::PgPool;
use sqlx::{PgConnection, Row};
use tracing::info;

use crate::error::GameResult;
use crate::game::models::Report;

pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn init_schema(&self) -> GameResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS game.notifications (
                id BIGSERIAL PRIMARY KEY,
                data TEXT NOT NULL,
                reporter VARCHAR(255) NOT NULL,
                reported_at BIGINT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Notifications table ready");
        Ok(())
    }

    pub async fn insert(&self, entry: &Report<String>) -> GameResult<()> {
        sqlx::query(
            "INSERT INTO game.notifications (data, reporter, reported_at) VALUES ($1, $2, $3)",
        )
        .bind(&entry.data)
        .bind(&entry.reporter)
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn all(&self) -> GameResult<Vec<Report<String>>> {
        let rows = sqlx::query(
            "SELECT data, reporter, reported_at FROM game.notifications ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(Report {
                    data: row.try_get("data")?,
                    reporter: row.try_get("reporter")?,
                    timestamp: row.try_get("reported_at")?,
                })
            })
            .collect()
    }

    pub async fn delete_all(conn: &mut PgConnection) -> GameResult<()> {
        sqlx::query("DELETE FROM game.notifications")
            .execute(conn)
            .await?;
        Ok(())
    }
}
