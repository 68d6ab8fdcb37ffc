//! Session and game control endpoints
//!
//! Endpoints:
//!   POST /login        -> resolve credentials to the submitter's record
//!   POST /game/start   -> assign the initial target cycle (admin)
//!   GET  /game/chain   -> target chain audit (admin)
//!   GET  /stream       -> live notifications (server-sent events)

use std::convert::Infallible;

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

use crate::database::GameStore;
use crate::error::GameError;
use crate::game::{ChainReport, Credentials, Game, Player};

// ============================================================================
// State
// ============================================================================

pub struct GameApiState<S> {
    pub game: Game<S>,
}

impl<S> Clone for GameApiState<S> {
    fn clone(&self) -> Self {
        Self {
            game: self.game.clone(),
        }
    }
}

/// Body of credential-only submissions
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub credentials: Credentials,
}

// ============================================================================
// API Handlers
// ============================================================================

pub async fn login<S: GameStore>(
    State(state): State<GameApiState<S>>,
    request: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<Player>, GameError> {
    let Json(request) = request?;
    let player = state.game.players.login(&request.credentials).await?;
    Ok(Json(player))
}

pub async fn start_game<S: GameStore>(
    State(state): State<GameApiState<S>>,
    request: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<ChainReport>, GameError> {
    let Json(request) = request?;
    let report = state.game.players.start_game(&request.credentials).await?;
    info!(
        admin = %request.credentials.alias,
        alive = report.alive,
        "Target cycle assigned by admin"
    );
    Ok(Json(report))
}

pub async fn chain_status<S: GameStore>(
    State(state): State<GameApiState<S>>,
    credentials: Result<Query<Credentials>, QueryRejection>,
) -> Result<Json<ChainReport>, GameError> {
    let Query(credentials) = credentials?;
    let report = state.game.players.chain_status(&credentials).await?;
    Ok(Json(report))
}

pub async fn stream<S: GameStore>(
    State(state): State<GameApiState<S>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let feed = BroadcastStream::new(state.game.subscribe());
    let events = feed.filter_map(|message| async move {
        match message {
            Ok(text) => Some(Ok(Event::default().event("report").data(text))),
            Err(e) => {
                warn!("Live feed subscriber fell behind: {}", e);
                None
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

// ============================================================================
// Router
// ============================================================================

/// Create the session and game control router
pub fn create_router<S: GameStore>(state: GameApiState<S>) -> Router {
    Router::new()
        .route("/login", post(login::<S>))
        .route("/game/start", post(start_game::<S>))
        .route("/game/chain", get(chain_status::<S>))
        .route("/stream", get(stream::<S>))
        .with_state(state)
}
