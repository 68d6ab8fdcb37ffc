use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

use assassins::{
    config::{sanitize_for_logging, GameConfig},
    create_app, seed_store, DatabasePool, Game, GameStore, MemoryStore,
    SecurityMiddlewareConfig, SecurityState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first - this validates admin seeds and limits
    let config = GameConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {:#}", e);
        eprintln!("Please check ASSASSINS_* environment variables.");
        e
    })?;

    init_logging(&config)?;

    info!("Starting assassins game server");

    if config.database.postgres_enabled {
        info!(
            "Using PostgreSQL store at {}",
            sanitize_for_logging(&config.database.postgres_url)
        );
        let pool = DatabasePool::new(
            &config.database.postgres_url,
            config.database.max_connections,
        )
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
        pool.init_schema().await.map_err(|e| anyhow::anyhow!(e))?;
        serve(Arc::new(pool), &config).await
    } else {
        info!("PostgreSQL disabled, using in-memory store");
        serve(Arc::new(MemoryStore::new()), &config).await
    }
}

async fn serve<S: GameStore>(store: Arc<S>, config: &GameConfig) -> Result<()> {
    let admins = config.game.admins.iter().map(|a| a.to_player()).collect();
    seed_store(store.as_ref(), config.game.reset, admins)
        .await
        .context("Failed to prepare game store")?;

    let game = Game::new(store, config.game.broadcast_capacity);

    let security_state = SecurityState::new(SecurityMiddlewareConfig {
        rate_limit_per_minute: config.security.rate_limit_per_minute,
        max_request_size: config.security.max_request_size,
        log_requests: config.logging.log_requests,
        sanitize_logs: config.logging.sanitize_logs,
    });

    // Expired rate-limit windows are swept once a minute
    let limiter = security_state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            limiter.cleanup();
        }
    });

    let app = create_app(game, security_state);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", bind_addr, e))?;

    info!("Game server listening on {}", bind_addr);
    info!(
        "Request limits: Rate limit={}/min, Max body={}KB",
        config.security.rate_limit_per_minute,
        config.security.max_request_size / 1024
    );

    // Serve with connect info for client IP extraction
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Initialize logging from configuration
fn init_logging(config: &GameConfig) -> Result<()> {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(if config.logging.log_requests {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        })
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}
