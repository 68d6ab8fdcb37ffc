//! Game Storage
//!
//! Collaborator interfaces the kill-claim engine depends on, plus two
//! backends: an in-memory store (single process, tests) and PostgreSQL.
//!
//! All player mutation from the engine goes through [`GameStore::commit`],
//! which applies a claim append and its player writes as one unit.

pub mod claims;
pub mod memory;
pub mod notifications;
pub mod players;
pub mod pool;

use std::future::Future;

use crate::error::GameResult;
use crate::game::models::{ClaimCommit, ClaimFilter, KillClaim, Player, PlayerFilter, Report};

pub use claims::ClaimRepository;
pub use memory::MemoryStore;
pub use notifications::NotificationRepository;
pub use players::PlayerRepository;
pub use pool::DatabasePool;

/// Outcome of an atomic claim commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Claim appended and all player writes applied
    Applied,
    /// A player changed since it was read; nothing was written
    Conflict { alias: String },
}

/// Alias-keyed player records
pub trait PlayerStore: Send + Sync {
    /// Fails `NotFound(alias)` when the alias is unknown
    fn get_one(&self, alias: &str) -> impl Future<Output = GameResult<Player>> + Send;

    /// Records in the order requested; fails on the first unknown alias
    fn get_many(&self, aliases: &[String]) -> impl Future<Output = GameResult<Vec<Player>>> + Send;

    /// Fails `InvalidRequest` when the alias is already taken
    fn insert(&self, player: Player) -> impl Future<Output = GameResult<()>> + Send;

    fn update(&self, player: Player) -> impl Future<Output = GameResult<()>> + Send;

    /// Writes every record at once, or none of them
    fn update_many(&self, players: Vec<Player>) -> impl Future<Output = GameResult<()>> + Send;

    fn query(&self, filter: &PlayerFilter) -> impl Future<Output = GameResult<Vec<Player>>> + Send;
}

/// Append-only kill claim collection
pub trait ClaimLedger: Send + Sync {
    fn find(&self, filter: &ClaimFilter) -> impl Future<Output = GameResult<Vec<KillClaim>>> + Send;

    fn find_one(
        &self,
        filter: &ClaimFilter,
    ) -> impl Future<Output = GameResult<Option<KillClaim>>> + Send;

    /// Fails `ClaimAlreadyExists` when the ordered pair is present
    fn insert_one(&self, claim: KillClaim) -> impl Future<Output = GameResult<()>> + Send;
}

/// Persisted notification messages
pub trait NotificationLog: Send + Sync {
    fn persist_log(
        &self,
        entry: Report<String>,
    ) -> impl Future<Output = GameResult<Report<String>>> + Send;

    /// Oldest first
    fn messages(&self) -> impl Future<Output = GameResult<Vec<Report<String>>>> + Send;
}

/// Everything one game instance stores
pub trait GameStore: PlayerStore + ClaimLedger + NotificationLog + 'static {
    /// Append `unit.claim` and write `unit.players` as a single unit.
    ///
    /// Each player must still be at the revision it carries. The duplicate
    /// pair check is repeated inside the unit.
    fn commit(&self, unit: ClaimCommit) -> impl Future<Output = GameResult<CommitOutcome>> + Send;

    /// Drop every player, claim and message
    fn reset(&self) -> impl Future<Output = GameResult<()>> + Send;
}
