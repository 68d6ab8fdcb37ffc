use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use tracing::{info, warn};

use crate::game::models::Player;

/// Configuration for one game server instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Request limits
    pub security: SecurityConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Game setup
    pub game: GameSetupConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Rate limit per minute per IP
    pub rate_limit_per_minute: u32,
    /// Maximum request body size in bytes
    pub max_request_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub postgres_url: String,
    /// In-memory store when disabled
    pub postgres_enabled: bool,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Sanitize client addresses in request logs
    pub sanitize_logs: bool,
    /// Log each request and its span events
    pub log_requests: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSetupConfig {
    /// Drop all players, claims and messages at startup
    pub reset: bool,
    /// Admins seeded at startup
    pub admins: Vec<AdminSeed>,
    /// Live notification channel capacity
    pub broadcast_capacity: usize,
}

/// Admin account from `alias:nickname:codename:passphrase`
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminSeed {
    pub alias: String,
    pub nickname: String,
    pub codename: String,
    pub passphrase: String,
}

impl fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminSeed")
            .field("alias", &self.alias)
            .field("nickname", &self.nickname)
            .field("codename", &"***")
            .field("passphrase", &"***")
            .finish()
    }
}

impl AdminSeed {
    pub fn parse(entry: &str) -> Result<Self> {
        let parts: Vec<&str> = entry.trim().splitn(4, ':').collect();
        match parts.as_slice() {
            [alias, nickname, codename, passphrase] => Ok(Self {
                alias: alias.trim().to_string(),
                nickname: nickname.trim().to_string(),
                codename: codename.to_string(),
                passphrase: passphrase.to_string(),
            }),
            _ => Err(anyhow::anyhow!(
                "Admin entry must be alias:nickname:codename:passphrase, got {} field(s)",
                parts.len()
            )),
        }
    }

    pub fn to_player(&self) -> Player {
        Player::admin(&self.alias, &self.nickname, &self.codename, &self.passphrase)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            security: SecurityConfig {
                rate_limit_per_minute: 120,
                max_request_size: 64 * 1024, // 64KB
            },
            database: DatabaseConfig {
                postgres_url: "postgresql://localhost:5432/assassins".to_string(),
                postgres_enabled: false,
                max_connections: 10,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                sanitize_logs: true,
                log_requests: false,
            },
            game: GameSetupConfig {
                reset: false,
                admins: Vec::new(),
                broadcast_capacity: 256,
            },
        }
    }
}

impl GameConfig {
    /// Load configuration from environment variables and validate it
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Server configuration
        if let Some(host) = var("ASSASSINS_HOST") {
            config.server.host = host;
        }

        if let Some(port) = var("ASSASSINS_PORT") {
            config.server.port = port.parse().context("Invalid ASSASSINS_PORT value")?;
        }

        // Request limits
        if let Some(rate_limit) = var("ASSASSINS_RATE_LIMIT_PER_MINUTE") {
            config.security.rate_limit_per_minute = rate_limit
                .parse()
                .context("Invalid ASSASSINS_RATE_LIMIT_PER_MINUTE value")?;
        }

        if let Some(size) = var("ASSASSINS_MAX_REQUEST_SIZE") {
            config.security.max_request_size = size
                .parse()
                .context("Invalid ASSASSINS_MAX_REQUEST_SIZE value")?;
        }

        // Database configuration
        if let Some(url) = var("ASSASSINS_POSTGRES_URL") {
            config.database.postgres_url = url;
        }

        if let Some(enabled) = var("ASSASSINS_POSTGRES_ENABLED") {
            config.database.postgres_enabled = enabled
                .parse()
                .context("Invalid ASSASSINS_POSTGRES_ENABLED value")?;
        }

        if let Some(max) = var("ASSASSINS_POSTGRES_MAX_CONNECTIONS") {
            config.database.max_connections = max
                .parse()
                .context("Invalid ASSASSINS_POSTGRES_MAX_CONNECTIONS value")?;
        }

        // Logging configuration
        if let Some(level) = var("ASSASSINS_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(log_requests) = var("ASSASSINS_LOG_REQUESTS") {
            config.logging.log_requests = log_requests
                .parse()
                .context("Invalid ASSASSINS_LOG_REQUESTS value")?;
        }

        if let Some(sanitize_logs) = var("ASSASSINS_SANITIZE_LOGS") {
            config.logging.sanitize_logs = sanitize_logs
                .parse()
                .context("Invalid ASSASSINS_SANITIZE_LOGS value")?;
        }

        // Game setup
        if let Some(reset) = var("ASSASSINS_RESET") {
            config.game.reset = reset.parse().context("Invalid ASSASSINS_RESET value")?;
        }

        if let Some(admins) = var("ASSASSINS_ADMINS") {
            config.game.admins = admins
                .split(',')
                .filter(|entry| !entry.trim().is_empty())
                .map(AdminSeed::parse)
                .collect::<Result<Vec<_>>>()
                .context("Invalid ASSASSINS_ADMINS value")?;
        }

        if let Some(capacity) = var("ASSASSINS_BROADCAST_CAPACITY") {
            config.game.broadcast_capacity = capacity
                .parse()
                .context("Invalid ASSASSINS_BROADCAST_CAPACITY value")?;
        }

        config.validate()?;

        if config.game.admins.is_empty() {
            warn!("No admins configured; game start and chain audit will be unavailable");
        }
        info!(
            "Configuration loaded: {}:{}, postgres={}, admins={}",
            config.server.host,
            config.server.port,
            config.database.postgres_enabled,
            config.game.admins.len()
        );

        Ok(config)
    }

    /// Validate configuration for security and consistency
    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(anyhow::anyhow!("Server host cannot be empty"));
        }

        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port must be non-zero"));
        }

        if self.database.postgres_enabled && self.database.postgres_url.is_empty() {
            return Err(anyhow::anyhow!(
                "PostgreSQL is enabled but no connection URL is set"
            ));
        }

        if self.game.broadcast_capacity == 0 {
            return Err(anyhow::anyhow!("Broadcast capacity must be non-zero"));
        }

        for admin in &self.game.admins {
            if admin.alias.is_empty() {
                return Err(anyhow::anyhow!("Admin alias cannot be empty"));
            }

            if admin.codename.is_empty() {
                return Err(anyhow::anyhow!(
                    "Codename for admin {} cannot be empty",
                    admin.alias
                ));
            }

            if admin.passphrase.len() < 8 {
                return Err(anyhow::anyhow!(
                    "Passphrase for admin {} is too short (minimum 8 characters)",
                    admin.alias
                ));
            }
        }

        Ok(())
    }
}

/// Sanitize sensitive data for logging
pub fn sanitize_for_logging(data: &str) -> String {
    let sensitive_patterns = ["passphrase", "codename", "password", "secret", "postgres"];

    let data_lower = data.to_lowercase();
    for pattern in &sensitive_patterns {
        if data_lower.contains(pattern) {
            if data.len() > 20 {
                return format!("{}***{}", &data[..6], &data[data.len().saturating_sub(6)..]);
            } else {
                return format!(
                    "{}***{}",
                    &data[..data.len().min(2)],
                    &data[data.len().saturating_sub(2)..]
                );
            }
        }
    }

    data.to_string()
}
