//! Database Connection Pool using sqlx
//!
//! PostgreSQL backend for one game instance. `commit` runs the claim insert
//! and every player write inside one transaction; a revision mismatch or a
//! duplicate pair rolls the whole unit back.

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, warn};

use crate::database::claims::ClaimRepository;
use crate::database::notifications::NotificationRepository;
use crate::database::players::PlayerRepository;
use crate::database::{ClaimLedger, CommitOutcome, GameStore, NotificationLog, PlayerStore};
use crate::error::{GameError, GameResult};
use crate::game::models::{ClaimCommit, ClaimFilter, KillClaim, Player, PlayerFilter, Report};

pub struct DatabasePool {
    pool: PgPool,
    players: PlayerRepository,
    claims: ClaimRepository,
    notifications: NotificationRepository,
}

impl DatabasePool {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, String> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(connection_string)
            .await
            .map_err(|e| format!("Failed to connect to PostgreSQL: {}", e))?;

        info!("Connected to PostgreSQL");

        let players = PlayerRepository::new(pool.clone());
        let claims = ClaimRepository::new(pool.clone());
        let notifications = NotificationRepository::new(pool.clone());

        Ok(Self {
            pool,
            players,
            claims,
            notifications,
        })
    }

    pub async fn init_schema(&self) -> Result<(), String> {
        info!("Initializing database schema...");

        sqlx::query("CREATE SCHEMA IF NOT EXISTS game")
            .execute(&self.pool)
            .await
            .map_err(|e| format!("Failed to create game schema: {}", e))?;

        self.players
            .init_schema()
            .await
            .map_err(|e| format!("Failed to create players table: {}", e))?;
        self.claims
            .init_schema()
            .await
            .map_err(|e| format!("Failed to create kill claims table: {}", e))?;
        self.notifications
            .init_schema()
            .await
            .map_err(|e| format!("Failed to create notifications table: {}", e))?;

        info!("Database schema initialized");
        Ok(())
    }
}

impl PlayerStore for DatabasePool {
    async fn get_one(&self, alias: &str) -> GameResult<Player> {
        self.players
            .get(alias)
            .await?
            .ok_or_else(|| GameError::NotFound(alias.to_string()))
    }

    async fn get_many(&self, aliases: &[String]) -> GameResult<Vec<Player>> {
        let mut found = Vec::with_capacity(aliases.len());
        for alias in aliases {
            found.push(self.get_one(alias).await?);
        }
        Ok(found)
    }

    async fn insert(&self, player: Player) -> GameResult<()> {
        if self.players.insert(&player).await? {
            Ok(())
        } else {
            Err(GameError::InvalidRequest(format!(
                "alias '{}' is already registered",
                player.alias
            )))
        }
    }

    async fn update(&self, player: Player) -> GameResult<()> {
        let mut conn = self.pool.acquire().await?;
        if PlayerRepository::update(&mut conn, &player).await? {
            Ok(())
        } else {
            Err(GameError::NotFound(player.alias))
        }
    }

    async fn update_many(&self, players: Vec<Player>) -> GameResult<()> {
        let mut tx = self.pool.begin().await?;
        for player in &players {
            if !PlayerRepository::update(&mut tx, player).await? {
                tx.rollback().await?;
                return Err(GameError::NotFound(player.alias.clone()));
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn query(&self, filter: &PlayerFilter) -> GameResult<Vec<Player>> {
        self.players.query(filter).await
    }
}

impl ClaimLedger for DatabasePool {
    async fn find(&self, filter: &ClaimFilter) -> GameResult<Vec<KillClaim>> {
        self.claims.find(filter).await
    }

    async fn find_one(&self, filter: &ClaimFilter) -> GameResult<Option<KillClaim>> {
        Ok(self.claims.find(filter).await?.into_iter().next())
    }

    async fn insert_one(&self, claim: KillClaim) -> GameResult<()> {
        let mut conn = self.pool.acquire().await?;
        if ClaimRepository::insert(&mut conn, &claim).await? {
            Ok(())
        } else {
            Err(GameError::ClaimAlreadyExists(claim))
        }
    }
}

impl NotificationLog for DatabasePool {
    async fn persist_log(&self, entry: Report<String>) -> GameResult<Report<String>> {
        self.notifications.insert(&entry).await?;
        Ok(entry)
    }

    async fn messages(&self) -> GameResult<Vec<Report<String>>> {
        self.notifications.all().await
    }
}

impl GameStore for DatabasePool {
    async fn commit(&self, unit: ClaimCommit) -> GameResult<CommitOutcome> {
        let mut tx = self.pool.begin().await?;

        if !ClaimRepository::insert(&mut tx, &unit.claim).await? {
            tx.rollback().await?;
            return Err(GameError::ClaimAlreadyExists(unit.claim));
        }

        for player in &unit.players {
            if !PlayerRepository::update_if_revision(&mut tx, player).await? {
                tx.rollback().await?;
                warn!(alias = %player.alias, "Revision conflict, claim unit rolled back");
                return Ok(CommitOutcome::Conflict {
                    alias: player.alias.clone(),
                });
            }
        }

        tx.commit().await?;
        Ok(CommitOutcome::Applied)
    }

    async fn reset(&self) -> GameResult<()> {
        let mut tx = self.pool.begin().await?;
        ClaimRepository::delete_all(&mut tx).await?;
        NotificationRepository::delete_all(&mut tx).await?;
        PlayerRepository::delete_all(&mut tx).await?;
        tx.commit().await?;

        warn!("Game database reset");
        Ok(())
    }
}
