//! In-memory game store
//!
//! Used when PostgreSQL is disabled and throughout the tests. One
//! `RwLock` guards players, claims and messages together, so a commit is
//! atomic with respect to every reader.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;

use crate::database::{ClaimLedger, CommitOutcome, GameStore, NotificationLog, PlayerStore};
use crate::error::{GameError, GameResult};
use crate::game::models::{ClaimCommit, ClaimFilter, KillClaim, Player, PlayerFilter, Report};

#[derive(Debug, Default)]
struct MemoryState {
    players: HashMap<String, Player>,
    /// Oldest first
    claims: Vec<KillClaim>,
    messages: Vec<Report<String>>,
}

impl MemoryState {
    fn has_pair(&self, claim: &KillClaim) -> bool {
        let filter = ClaimFilter {
            killer: claim.killer.clone(),
            victim: Some(claim.victim.clone()),
        };
        self.claims.iter().any(|c| filter.matches(c))
    }

    fn write_player(&mut self, mut player: Player) {
        let revision = self
            .players
            .get(&player.alias)
            .map(|p| p.revision + 1)
            .unwrap_or(0);
        player.revision = revision;
        self.players.insert(player.alias.clone(), player);
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the given players, written as-is
    pub fn with_players(players: Vec<Player>) -> Self {
        let players = players
            .into_iter()
            .map(|p| (p.alias.clone(), p))
            .collect();
        Self {
            state: RwLock::new(MemoryState {
                players,
                ..MemoryState::default()
            }),
        }
    }

    /// Number of ledger entries for an ordered pair
    pub async fn claim_count(&self, killer: &str, victim: &str) -> usize {
        let filter = ClaimFilter::pair(killer, victim);
        let state = self.state.read().await;
        state.claims.iter().filter(|c| filter.matches(c)).count()
    }

    pub async fn all_players(&self) -> Vec<Player> {
        let state = self.state.read().await;
        let mut players: Vec<Player> = state.players.values().cloned().collect();
        players.sort_by(|a, b| a.alias.cmp(&b.alias));
        players
    }
}

impl PlayerStore for MemoryStore {
    async fn get_one(&self, alias: &str) -> GameResult<Player> {
        let state = self.state.read().await;
        state
            .players
            .get(alias)
            .cloned()
            .ok_or_else(|| GameError::NotFound(alias.to_string()))
    }

    async fn get_many(&self, aliases: &[String]) -> GameResult<Vec<Player>> {
        let state = self.state.read().await;
        aliases
            .iter()
            .map(|alias| {
                state
                    .players
                    .get(alias)
                    .cloned()
                    .ok_or_else(|| GameError::NotFound(alias.clone()))
            })
            .collect()
    }

    async fn insert(&self, player: Player) -> GameResult<()> {
        let mut state = self.state.write().await;
        if state.players.contains_key(&player.alias) {
            return Err(GameError::InvalidRequest(format!(
                "alias '{}' is already registered",
                player.alias
            )));
        }
        debug!(alias = %player.alias, "Player inserted");
        state.players.insert(player.alias.clone(), player);
        Ok(())
    }

    async fn update(&self, player: Player) -> GameResult<()> {
        let mut state = self.state.write().await;
        if !state.players.contains_key(&player.alias) {
            return Err(GameError::NotFound(player.alias));
        }
        state.write_player(player);
        Ok(())
    }

    async fn update_many(&self, players: Vec<Player>) -> GameResult<()> {
        let mut state = self.state.write().await;
        if let Some(missing) = players
            .iter()
            .find(|p| !state.players.contains_key(&p.alias))
        {
            return Err(GameError::NotFound(missing.alias.clone()));
        }
        for player in players {
            state.write_player(player);
        }
        Ok(())
    }

    async fn query(&self, filter: &PlayerFilter) -> GameResult<Vec<Player>> {
        let state = self.state.read().await;
        let mut matches: Vec<Player> = state
            .players
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.alias.cmp(&b.alias));
        Ok(matches)
    }
}

impl ClaimLedger for MemoryStore {
    async fn find(&self, filter: &ClaimFilter) -> GameResult<Vec<KillClaim>> {
        let state = self.state.read().await;
        Ok(state
            .claims
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect())
    }

    async fn find_one(&self, filter: &ClaimFilter) -> GameResult<Option<KillClaim>> {
        let state = self.state.read().await;
        Ok(state.claims.iter().find(|c| filter.matches(c)).cloned())
    }

    async fn insert_one(&self, claim: KillClaim) -> GameResult<()> {
        let mut state = self.state.write().await;
        if state.has_pair(&claim) {
            return Err(GameError::ClaimAlreadyExists(claim));
        }
        state.claims.push(claim);
        Ok(())
    }
}

impl NotificationLog for MemoryStore {
    async fn persist_log(&self, entry: Report<String>) -> GameResult<Report<String>> {
        let mut state = self.state.write().await;
        state.messages.push(entry.clone());
        Ok(entry)
    }

    async fn messages(&self) -> GameResult<Vec<Report<String>>> {
        let state = self.state.read().await;
        Ok(state.messages.clone())
    }
}

impl GameStore for MemoryStore {
    async fn commit(&self, unit: ClaimCommit) -> GameResult<CommitOutcome> {
        let mut state = self.state.write().await;

        if state.has_pair(&unit.claim) {
            return Err(GameError::ClaimAlreadyExists(unit.claim));
        }

        for player in &unit.players {
            match state.players.get(&player.alias) {
                Some(stored) if stored.revision == player.revision => {}
                Some(_) => {
                    return Ok(CommitOutcome::Conflict {
                        alias: player.alias.clone(),
                    });
                }
                None => return Err(GameError::NotFound(player.alias.clone())),
            }
        }

        state.claims.push(unit.claim);
        for player in unit.players {
            state.write_player(player);
        }

        Ok(CommitOutcome::Applied)
    }

    async fn reset(&self) -> GameResult<()> {
        let mut state = self.state.write().await;
        *state = MemoryState::default();
        Ok(())
    }
}
