//! HTTP API for the game server
//!
//! Provides REST APIs for:
//! - Kill claims, players and messages (one [`Endpoint`] per resource)
//! - Login, game start and chain audit
//! - Live notification stream (server-sent events)
//! - Request middleware (rate limiting, body limits, headers, logging)

pub mod endpoint;
pub mod game;
pub mod middleware;
pub mod resources;

use axum::{middleware as axum_middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::database::GameStore;
use crate::game::Game;

pub use endpoint::{resource_routes, Endpoint, Submission};
pub use game::{create_router as create_game_router, GameApiState};
pub use middleware::{
    body_size_middleware, logging_middleware, rate_limit_middleware,
    security_headers_middleware, RateLimiter, SecurityMiddlewareConfig, SecurityState,
};
pub use resources::{KillsEndpoint, MessageFilter, MessagesEndpoint, PlayersEndpoint};

/// Routes under `/api`, without middleware
pub fn create_api_router<S: GameStore>(game: Game<S>) -> Router {
    create_game_router(GameApiState { game: game.clone() })
        .merge(resource_routes(KillsEndpoint::new(&game)))
        .merge(resource_routes(PlayersEndpoint::new(&game)))
        .merge(resource_routes(MessagesEndpoint::new(&game)))
}

/// The complete application: API, health check and middleware layers
pub fn create_app<S: GameStore>(game: Game<S>, security_state: SecurityState) -> Router {
    Router::new()
        .route("/api", get(|| async { "ACK" }))
        .nest("/api", create_api_router(game))
        .route("/health", get(|| async { "OK" }))
        .layer(axum_middleware::from_fn_with_state(
            security_state.clone(),
            body_size_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            security_state.clone(),
            rate_limit_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            security_state,
            logging_middleware,
        ))
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
}
