//! Player Directory
//!
//! Registration, player lookups with per-role visibility, and the admin
//! operations that start the game and audit the target chain.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::database::GameStore;
use crate::error::{GameError, GameResult};
use crate::game::chain::{assign_cycle, check_chain, ChainReport};
use crate::game::identity::IdentityValidator;
use crate::game::models::{Credentials, Player, PlayerFilter, Report};

/// Fields a newcomer supplies when registering
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub alias: String,
    #[serde(default)]
    pub nickname: String,
    pub codename: String,
    pub passphrase: String,
}

impl Registration {
    fn validate(&self) -> GameResult<()> {
        if self.alias.trim().is_empty() {
            return Err(GameError::InvalidRequest("alias must not be empty".to_string()));
        }
        if self.codename.is_empty() || self.passphrase.is_empty() {
            return Err(GameError::InvalidRequest(
                "codename and passphrase are required".to_string(),
            ));
        }
        Ok(())
    }

    fn credentials(&self) -> Credentials {
        Credentials::new(&self.alias, &self.codename, &self.passphrase)
    }
}

pub struct PlayerDirectory<S> {
    store: Arc<S>,
    identity: IdentityValidator<S>,
}

impl<S> Clone for PlayerDirectory<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            identity: self.identity.clone(),
        }
    }
}

impl<S: GameStore> PlayerDirectory<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            identity: IdentityValidator::new(store.clone()),
            store,
        }
    }

    /// Submitter's own full record
    pub async fn login(&self, credentials: &Credentials) -> GameResult<Player> {
        let player = self.identity.resolve(credentials).await?;
        info!(alias = %player.alias, "Player logged in");
        Ok(player)
    }

    /// Players matching `filter`, as the submitter may see them.
    ///
    /// An empty filter returns only the submitter. Admins see every field
    /// except other players' secrets; everyone else sees public fields of
    /// other players and may not filter on targets.
    pub async fn get(
        &self,
        credentials: &Credentials,
        filter: &PlayerFilter,
    ) -> GameResult<Vec<Player>> {
        let submitter = self.identity.resolve(credentials).await?;

        if *filter == PlayerFilter::default() {
            return Ok(vec![submitter]);
        }
        if !submitter.admin && filter.target.is_some() {
            return Err(GameError::PermissionDenied);
        }

        let players = self.store.query(filter).await?;
        Ok(players
            .into_iter()
            .map(|p| {
                if p.alias == submitter.alias {
                    p
                } else if submitter.admin {
                    p.without_secrets()
                } else {
                    p.public_view()
                }
            })
            .collect())
    }

    /// Register a new player.
    ///
    /// Either the newcomer submits their own credentials, or an admin
    /// registers them.
    pub async fn register(
        &self,
        credentials: &Credentials,
        registration: Registration,
    ) -> GameResult<Report<Player>> {
        registration.validate()?;

        let reporter = if registration.credentials() == *credentials {
            registration.alias.clone()
        } else {
            let submitter = self.identity.resolve(credentials).await?;
            if !submitter.admin {
                return Err(GameError::PermissionDenied);
            }
            submitter.alias
        };

        let alive = self.store.query(&PlayerFilter::alive()).await?;
        if targets_assigned(&alive) {
            return Err(GameError::InvalidRequest(
                "the game has started, registration is closed".to_string(),
            ));
        }

        let nickname = if registration.nickname.is_empty() {
            registration.alias.as_str()
        } else {
            registration.nickname.as_str()
        };
        let player = Player::new(
            &registration.alias,
            nickname,
            &registration.codename,
            &registration.passphrase,
        );
        self.store.insert(player.clone()).await?;

        info!(alias = %player.alias, registered_by = %reporter, "Player registered");
        Ok(Report::now(player.without_secrets(), &reporter))
    }

    /// Arrange every alive non-admin player into one random target cycle
    pub async fn start_game(&self, credentials: &Credentials) -> GameResult<ChainReport> {
        self.require_admin(credentials).await?;

        let mut players: Vec<Player> = self
            .store
            .query(&PlayerFilter::alive())
            .await?
            .into_iter()
            .filter(|p| !p.admin)
            .collect();

        if players.len() < 2 {
            return Err(GameError::InvalidRequest(format!(
                "at least 2 players are needed to start, found {}",
                players.len()
            )));
        }
        if targets_assigned(&players) {
            return Err(GameError::InvalidRequest(
                "targets are already assigned".to_string(),
            ));
        }

        let mut rng = StdRng::from_entropy();
        assign_cycle(&mut players, &mut rng);
        let report = check_chain(&players);
        self.store.update_many(players).await?;

        info!(alive = report.alive, "Game started");
        Ok(report)
    }

    /// Audit the target chain over every stored player
    pub async fn chain_status(&self, credentials: &Credentials) -> GameResult<ChainReport> {
        self.require_admin(credentials).await?;

        let players = self.store.query(&PlayerFilter::default()).await?;
        let report = check_chain(&players);
        if !report.is_intact() {
            warn!(violations = ?report.violations, "Target chain is corrupt");
        }
        Ok(report)
    }

    async fn require_admin(&self, credentials: &Credentials) -> GameResult<Player> {
        let submitter = self.identity.resolve(credentials).await?;
        if submitter.admin {
            Ok(submitter)
        } else {
            Err(GameError::PermissionDenied)
        }
    }
}

/// Whether any alive non-admin player already holds a target
fn targets_assigned(players: &[Player]) -> bool {
    players
        .iter()
        .any(|p| p.alive && !p.admin && !p.target.is_empty())
}
