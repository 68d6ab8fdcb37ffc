//! Identity Validator
//!
//! Resolves submitted credentials to a stored player. Secret fields are
//! hashed to fixed-length digests and compared in constant time, and both
//! are always compared, so the response time does not reveal which one
//! differed.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::database::PlayerStore;
use crate::error::{GameError, GameResult};
use crate::game::models::{Credentials, Player};

pub struct IdentityValidator<S> {
    store: Arc<S>,
}

impl<S> Clone for IdentityValidator<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: PlayerStore> IdentityValidator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Player matching every credential field, or `NotAuthorized`
    pub async fn resolve(&self, credentials: &Credentials) -> GameResult<Player> {
        if credentials.alias.is_empty() {
            return Err(GameError::NotAuthorized);
        }

        let player = match self.store.get_one(&credentials.alias).await {
            Ok(player) => player,
            Err(GameError::NotFound(_)) => {
                debug!(alias = %credentials.alias, "Unknown alias presented");
                return Err(GameError::NotAuthorized);
            }
            Err(e) => return Err(e),
        };

        if secrets_match(credentials, &player) {
            Ok(player)
        } else {
            debug!(alias = %credentials.alias, "Credential mismatch");
            Err(GameError::NotAuthorized)
        }
    }
}

fn digest(value: &str) -> Vec<u8> {
    Sha256::digest(value.as_bytes()).to_vec()
}

fn secrets_match(credentials: &Credentials, player: &Player) -> bool {
    let codename_ok = digest(&credentials.codename)
        .as_slice()
        .ct_eq(digest(&player.codename).as_slice());
    let passphrase_ok = digest(&credentials.passphrase)
        .as_slice()
        .ct_eq(digest(&player.passphrase).as_slice());
    bool::from(codename_ok & passphrase_ok)
}
