//! Kill Claim Processor
//!
//! State machine for kill claim submissions:
//!
//! ```text
//!   resolve ─► permission ─► [lock killer+victim]
//!                                   │
//!        ┌──────────────────────────┘
//!        ▼
//!   fetch ─► liveness ─► duplicate ─► finalize? ─► commit ──► notify
//!     ▲                                               │
//!     └─────────────── revision conflict ◄────────────┘
//! ```
//!
//! Everything between fetch and commit is staged in memory and written by a
//! single `GameStore::commit`, so a rejected or corrupt claim leaves no
//! trace. Only a self-report finalizes a death.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::database::{CommitOutcome, GameStore};
use crate::error::{GameError, GameResult};
use crate::game::chain::TargetChainFinalizer;
use crate::game::identity::IdentityValidator;
use crate::game::locks::AliasLocks;
use crate::game::models::{ClaimCommit, ClaimFilter, Credentials, KillClaim, Player, Report};
use crate::game::notify::NotificationEmitter;

/// Rebuilds allowed after revision conflicts before giving up
const MAX_COMMIT_ATTEMPTS: usize = 8;

/// Millisecond clock that never runs backwards
#[derive(Debug, Default)]
pub struct ReportClock {
    last: AtomicI64,
}

impl ReportClock {
    pub fn now(&self) -> i64 {
        let wall = Utc::now().timestamp_millis();
        let previous = self.last.fetch_max(wall, Ordering::SeqCst);
        previous.max(wall)
    }
}

/// A fully staged claim, ready for commit
struct StagedClaim {
    commit: ClaimCommit,
    victim_died: bool,
}

pub struct KillClaimProcessor<S> {
    store: Arc<S>,
    identity: IdentityValidator<S>,
    finalizer: TargetChainFinalizer<S>,
    notifier: NotificationEmitter<S>,
    locks: Arc<AliasLocks>,
    clock: Arc<ReportClock>,
}

impl<S> Clone for KillClaimProcessor<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            identity: self.identity.clone(),
            finalizer: self.finalizer.clone(),
            notifier: self.notifier.clone(),
            locks: self.locks.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<S: GameStore> KillClaimProcessor<S> {
    pub fn new(store: Arc<S>, notifier: NotificationEmitter<S>) -> Self {
        Self {
            identity: IdentityValidator::new(store.clone()),
            finalizer: TargetChainFinalizer::new(store.clone()),
            store,
            notifier,
            locks: Arc::new(AliasLocks::new()),
            clock: Arc::new(ReportClock::default()),
        }
    }

    /// Claims matching `filter` that the submitter may see
    pub async fn get(
        &self,
        credentials: &Credentials,
        filter: &ClaimFilter,
    ) -> GameResult<Vec<KillClaim>> {
        let submitter = self.identity.resolve(credentials).await?;
        let claims = self.store.find(filter).await?;

        if submitter.admin {
            return Ok(claims);
        }
        Ok(visible_to(&submitter.alias, claims))
    }

    /// Submit a kill claim
    pub async fn put(
        &self,
        credentials: &Credentials,
        claim: KillClaim,
    ) -> GameResult<Report<KillClaim>> {
        let result = self.submit(credentials, claim.clone()).await;

        if let Err(e) = &result {
            if e.is_internal() {
                error!(
                    submitter = %credentials.alias,
                    killer = %claim.killer_alias(),
                    victim = %claim.victim,
                    kind = e.kind(),
                    "Kill claim failed: {}", e
                );
            } else {
                warn!(
                    submitter = %credentials.alias,
                    killer = %claim.killer_alias(),
                    victim = %claim.victim,
                    kind = e.kind(),
                    "Kill claim rejected"
                );
            }
        }

        result
    }

    async fn submit(
        &self,
        credentials: &Credentials,
        claim: KillClaim,
    ) -> GameResult<Report<KillClaim>> {
        let timestamp = self.clock.now();
        let submitter = self.identity.resolve(credentials).await?;

        let killer = claim.killer_alias().to_string();
        if killer.is_empty() || claim.victim.is_empty() {
            return Err(GameError::InvalidRequest(
                "a claim needs both killer and victim".to_string(),
            ));
        }

        if !(submitter.admin || submitter.alias == killer || submitter.alias == claim.victim) {
            return Err(GameError::PermissionDenied);
        }

        let _guard = self.locks.acquire(&[&killer, &claim.victim]).await;

        let mut attempt = 1;
        let victim_died = loop {
            let staged = self.stage(&claim).await?;
            match self.store.commit(staged.commit).await? {
                CommitOutcome::Applied => break staged.victim_died,
                CommitOutcome::Conflict { alias } if attempt < MAX_COMMIT_ATTEMPTS => {
                    debug!(alias = %alias, attempt, "Stale read, rebuilding claim");
                    attempt += 1;
                }
                CommitOutcome::Conflict { alias } => {
                    return Err(GameError::Storage(format!(
                        "player '{}' kept changing during commit",
                        alias
                    )));
                }
            }
        };

        let report = Report::new(claim, &submitter.alias, timestamp);
        info!(
            submitter = %report.reporter,
            killer = %report.data.killer_alias(),
            victim = %report.data.victim,
            finalized = victim_died,
            "Kill claim recorded"
        );

        if victim_died {
            if let Err(e) = self.notifier.notify(&report).await {
                error!(victim = %report.data.victim, "Failed to persist notification: {}", e);
            }
        }

        Ok(report)
    }

    /// Read, validate and build the commit unit for `claim`
    async fn stage(&self, claim: &KillClaim) -> GameResult<StagedClaim> {
        let (killer, victim) = self.fetch_parties(claim).await?;

        if !killer.alive {
            return Err(GameError::UsersDead(killer.alias));
        }
        if !victim.alive {
            return Err(GameError::UsersDead(victim.alias));
        }

        let pair = ClaimFilter::pair(&killer.alias, &victim.alias);
        if self.store.find_one(&pair).await?.is_some() {
            return Err(GameError::ClaimAlreadyExists(claim.clone()));
        }

        if !claim.is_self_report() {
            return Ok(StagedClaim {
                commit: ClaimCommit {
                    claim: claim.clone(),
                    players: vec![killer, victim],
                },
                victim_died: false,
            });
        }

        let relink = self.finalizer.finalize(&victim).await?;
        let victim_died = !relink.victim.alive;
        let mut players: Vec<Player> = relink.predecessor.into_iter().collect();
        players.push(relink.victim);

        Ok(StagedClaim {
            commit: ClaimCommit {
                claim: claim.clone(),
                players,
            },
            victim_died,
        })
    }

    async fn fetch_parties(&self, claim: &KillClaim) -> GameResult<(Player, Player)> {
        if claim.is_self_report() {
            let player = self.store.get_one(&claim.victim).await?;
            return Ok((player.clone(), player));
        }

        let aliases = [claim.killer_alias().to_string(), claim.victim.clone()];
        let found = self.store.get_many(&aliases).await?;
        let [killer, victim]: [Player; 2] = found.try_into().map_err(|_| {
            GameError::Storage("player store returned a partial batch".to_string())
        })?;
        Ok((killer, victim))
    }
}

/// Claims a non-admin may see: their own, with the killer hidden from the
/// victim
pub fn visible_to(alias: &str, claims: Vec<KillClaim>) -> Vec<KillClaim> {
    claims
        .into_iter()
        .filter(|c| c.involves(alias))
        .map(|c| {
            if c.victim == alias && c.killer_alias() != alias {
                c.redacted()
            } else {
                c
            }
        })
        .collect()
}
