//! Target Chain
//!
//! The chain is a flat alias -> player map where each alive player's
//! `target` names the next alias. Predecessors are found by querying the
//! store for `target == alias`, never by walking links, so a corrupted
//! chain cannot make the lookup loop.
//!
//! - [`TargetChainFinalizer`] re-links the chain around a confirmed death
//! - [`assign_cycle`] builds the initial single cycle at game start
//! - [`check_chain`] audits the permutation and dead-target invariants

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::{error, info};

use crate::database::PlayerStore;
use crate::error::{GameError, GameResult};
use crate::game::models::{Player, PlayerFilter};

/// Records rewritten by one finalize, not yet persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relink {
    /// `None` when the victim was the last alive player, targeting itself
    pub predecessor: Option<Player>,
    pub victim: Player,
}

pub struct TargetChainFinalizer<S> {
    store: Arc<S>,
}

impl<S> Clone for TargetChainFinalizer<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: PlayerStore> TargetChainFinalizer<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Locate the victim's unique predecessor and skip it over the victim.
    ///
    /// Fails `Unknown` when zero or several alive players target the victim;
    /// the chain is already corrupt then and nothing may be written.
    pub async fn finalize(&self, victim: &Player) -> GameResult<Relink> {
        let predecessors = self
            .store
            .query(&PlayerFilter::targeting(&victim.alias))
            .await?;

        match predecessors.as_slice() {
            [predecessor] => Ok(relink(predecessor.clone(), victim.clone())),
            [] => {
                error!(victim = %victim.alias, "No alive player targets the victim");
                Err(GameError::Unknown(format!(
                    "Nobody is targeting '{}'.",
                    victim.alias
                )))
            }
            many => {
                let aliases: Vec<&str> = many.iter().map(|p| p.alias.as_str()).collect();
                error!(
                    victim = %victim.alias,
                    predecessors = ?aliases,
                    "Several alive players target the victim"
                );
                Err(GameError::Unknown(format!(
                    "Multiple players are targeting '{}'.",
                    victim.alias
                )))
            }
        }
    }
}

/// Pure re-link step of a finalize
pub fn relink(predecessor: Player, mut victim: Player) -> Relink {
    let predecessor = if predecessor.alias == victim.alias {
        None
    } else {
        let mut predecessor = predecessor;
        predecessor.target = victim.target.clone();
        predecessor.kills += 1;
        Some(predecessor)
    };

    victim.alive = false;
    victim.target = String::new();

    Relink {
        predecessor,
        victim,
    }
}

/// Arrange `players` into one random cycle
pub fn assign_cycle<R: Rng + ?Sized>(players: &mut [Player], rng: &mut R) {
    players.shuffle(rng);
    let count = players.len();
    let aliases: Vec<String> = players.iter().map(|p| p.alias.clone()).collect();
    for (index, player) in players.iter_mut().enumerate() {
        player.target = aliases[(index + 1) % count].clone();
    }
    info!(players = count, "Target cycle assigned");
}

/// Result of auditing the target chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChainReport {
    pub alive: usize,
    pub dead: usize,
    /// Number of cycles among alive players; 0 before the game starts
    pub cycles: usize,
    pub violations: Vec<String>,
}

impl ChainReport {
    pub fn is_intact(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Check that alive targets form a permutation of alive players and that
/// dead players have no target. Admins take no part in the chain.
pub fn check_chain(players: &[Player]) -> ChainReport {
    let mut report = ChainReport::default();
    let players: Vec<&Player> = players.iter().filter(|p| !p.admin).collect();

    let alive: HashMap<&str, &Player> = players
        .iter()
        .copied()
        .filter(|p| p.alive)
        .map(|p| (p.alias.as_str(), p))
        .collect();
    report.alive = alive.len();
    report.dead = players.len() - alive.len();

    for player in players.iter().filter(|p| !p.alive) {
        if !player.target.is_empty() {
            report
                .violations
                .push(format!("dead player '{}' still targets '{}'", player.alias, player.target));
        }
    }

    let assigned = alive.values().filter(|p| !p.target.is_empty()).count();
    if assigned == 0 {
        // Not started yet
        return report;
    }
    if assigned != alive.len() {
        report.violations.push(format!(
            "{} of {} alive players have no target",
            alive.len() - assigned,
            alive.len()
        ));
        return report;
    }

    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    for player in alive.values() {
        if !alive.contains_key(player.target.as_str()) {
            report.violations.push(format!(
                "'{}' targets '{}', who is not an alive player",
                player.alias, player.target
            ));
        }
        *in_degree.entry(player.target.as_str()).or_insert(0) += 1;
    }

    let mut aliases: Vec<&str> = alive.keys().copied().collect();
    aliases.sort_unstable();
    for alias in &aliases {
        match in_degree.get(alias).copied().unwrap_or(0) {
            1 => {}
            n => report
                .violations
                .push(format!("'{}' is targeted by {} players", alias, n)),
        }
    }

    if !report.is_intact() {
        return report;
    }

    // A permutation: every walk closes, count the cycles
    let mut seen: HashSet<&str> = HashSet::new();
    for start in aliases {
        if seen.contains(start) {
            continue;
        }
        report.cycles += 1;
        let mut current = start;
        while seen.insert(current) {
            current = alive[current].target.as_str();
        }
    }

    report
}
