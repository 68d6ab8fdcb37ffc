//! Kills, players and messages resources
//!
//! Endpoints:
//!   GET/PUT /kills     -> kill claims (query / submit)
//!   GET/PUT /players   -> player records (query / register)
//!   GET     /messages  -> persisted notifications

use serde::{Deserialize, Serialize};

use crate::api::endpoint::Endpoint;
use crate::database::GameStore;
use crate::error::{GameError, GameResult};
use crate::game::{
    ClaimFilter, Credentials, Game, KillClaim, KillClaimProcessor, Player, PlayerDirectory,
    PlayerFilter, Registration, Report,
};

// ============================================================================
// Kills
// ============================================================================

pub struct KillsEndpoint<S> {
    kills: KillClaimProcessor<S>,
}

impl<S> Clone for KillsEndpoint<S> {
    fn clone(&self) -> Self {
        Self {
            kills: self.kills.clone(),
        }
    }
}

impl<S: GameStore> KillsEndpoint<S> {
    pub fn new(game: &Game<S>) -> Self {
        Self {
            kills: game.kills.clone(),
        }
    }
}

impl<S: GameStore> Endpoint for KillsEndpoint<S> {
    const PATH: &'static str = "/kills";

    type Filter = ClaimFilter;
    type Data = KillClaim;
    type Item = KillClaim;
    type Receipt = Report<KillClaim>;

    async fn get(&self, credentials: Credentials, filter: ClaimFilter) -> GameResult<Vec<KillClaim>> {
        self.kills.get(&credentials, &filter).await
    }

    async fn put(&self, credentials: Credentials, claim: KillClaim) -> GameResult<Report<KillClaim>> {
        self.kills.put(&credentials, claim).await
    }
}

// ============================================================================
// Players
// ============================================================================

pub struct PlayersEndpoint<S> {
    players: PlayerDirectory<S>,
}

impl<S> Clone for PlayersEndpoint<S> {
    fn clone(&self) -> Self {
        Self {
            players: self.players.clone(),
        }
    }
}

impl<S: GameStore> PlayersEndpoint<S> {
    pub fn new(game: &Game<S>) -> Self {
        Self {
            players: game.players.clone(),
        }
    }
}

impl<S: GameStore> Endpoint for PlayersEndpoint<S> {
    const PATH: &'static str = "/players";

    type Filter = PlayerFilter;
    type Data = Registration;
    type Item = Player;
    type Receipt = Report<Player>;

    async fn get(&self, credentials: Credentials, filter: PlayerFilter) -> GameResult<Vec<Player>> {
        self.players.get(&credentials, &filter).await
    }

    async fn put(
        &self,
        credentials: Credentials,
        registration: Registration,
    ) -> GameResult<Report<Player>> {
        self.players.register(&credentials, registration).await
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Messages at or after `since` (ms since the Unix epoch)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MessageFilter {
    #[serde(default)]
    pub since: Option<i64>,
}

pub struct MessagesEndpoint<S> {
    game: Game<S>,
}

impl<S> Clone for MessagesEndpoint<S> {
    fn clone(&self) -> Self {
        Self {
            game: self.game.clone(),
        }
    }
}

impl<S: GameStore> MessagesEndpoint<S> {
    pub fn new(game: &Game<S>) -> Self {
        Self { game: game.clone() }
    }
}

impl<S: GameStore> Endpoint for MessagesEndpoint<S> {
    const PATH: &'static str = "/messages";

    type Filter = MessageFilter;
    type Data = serde_json::Value;
    type Item = Report<String>;
    type Receipt = Report<String>;

    async fn get(
        &self,
        credentials: Credentials,
        filter: MessageFilter,
    ) -> GameResult<Vec<Report<String>>> {
        let messages = self.game.messages(&credentials).await?;
        Ok(match filter.since {
            Some(since) => messages
                .into_iter()
                .filter(|m| m.timestamp >= since)
                .collect(),
            None => messages,
        })
    }

    async fn put(
        &self,
        _credentials: Credentials,
        _data: serde_json::Value,
    ) -> GameResult<Report<String>> {
        Err(GameError::Unsupported("put"))
    }
}
