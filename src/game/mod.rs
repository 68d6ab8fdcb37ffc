//! Assassins Game Engine
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                        Game<S>                            │
//! │                                                           │
//! │  credentials ──► IdentityValidator ──► Player             │
//! │                                                           │
//! │  KillClaimProcessor ──┬─► TargetChainFinalizer            │
//! │                       ├─► GameStore::commit (one unit)    │
//! │                       └─► NotificationEmitter             │
//! │                              ├─► broadcast channel        │
//! │                              └─► NotificationLog          │
//! │                                                           │
//! │  PlayerDirectory ── registration, start, chain audit      │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! The target chain is a flat alias map. Every alive player's `target`
//! names the next alive player and the targets form a permutation; dead
//! players carry no target.

pub mod chain;
pub mod identity;
pub mod locks;
pub mod models;
pub mod notify;
pub mod players;
pub mod processor;

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::database::GameStore;
use crate::error::{GameError, GameResult};

pub use chain::{check_chain, ChainReport, TargetChainFinalizer};
pub use identity::IdentityValidator;
pub use models::{ClaimFilter, Credentials, KillClaim, Player, PlayerFilter, Report};
pub use notify::NotificationEmitter;
pub use players::{PlayerDirectory, Registration};
pub use processor::KillClaimProcessor;

/// One game instance: every component wired to the same store
pub struct Game<S> {
    pub kills: KillClaimProcessor<S>,
    pub players: PlayerDirectory<S>,
    identity: IdentityValidator<S>,
    notifier: NotificationEmitter<S>,
}

impl<S> Clone for Game<S> {
    fn clone(&self) -> Self {
        Self {
            kills: self.kills.clone(),
            players: self.players.clone(),
            identity: self.identity.clone(),
            notifier: self.notifier.clone(),
        }
    }
}

impl<S: GameStore> Game<S> {
    pub fn new(store: Arc<S>, broadcast_capacity: usize) -> Self {
        let notifier = NotificationEmitter::new(store.clone(), broadcast_capacity);
        Self {
            kills: KillClaimProcessor::new(store.clone(), notifier.clone()),
            players: PlayerDirectory::new(store.clone()),
            identity: IdentityValidator::new(store),
            notifier,
        }
    }

    /// Persisted notifications, for any authenticated player
    pub async fn messages(&self, credentials: &Credentials) -> GameResult<Vec<Report<String>>> {
        self.identity.resolve(credentials).await?;
        self.notifier.history().await
    }

    /// Live notification feed
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.notifier.subscribe()
    }
}

/// Prepare the store for a new server run: optionally wipe it, then make
/// sure every configured admin exists with its configured secrets
pub async fn seed_store<S: GameStore>(store: &S, reset: bool, admins: Vec<Player>) -> GameResult<()> {
    if reset {
        warn!("Resetting game data");
        store.reset().await?;
    }

    for admin in admins {
        match store.get_one(&admin.alias).await {
            Ok(existing) => {
                let refreshed = Player {
                    nickname: admin.nickname,
                    codename: admin.codename,
                    passphrase: admin.passphrase,
                    admin: true,
                    ..existing
                };
                store.update(refreshed).await?;
                info!(alias = %admin.alias, "Admin credentials refreshed");
            }
            Err(GameError::NotFound(_)) => {
                info!(alias = %admin.alias, "Admin seeded");
                store.insert(admin).await?;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}
