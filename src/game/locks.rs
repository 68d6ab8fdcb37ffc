//! Per-alias mutual exclusion
//!
//! Submissions touching the same alias run one at a time; submissions over
//! disjoint aliases proceed in parallel. Locks for several aliases are
//! always taken in sorted order so two submissions can never wait on each
//! other.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<String, Arc<Mutex<()>>>;

/// Entries exist only while some submission holds or awaits them.
#[derive(Debug, Default)]
pub struct AliasLocks {
    locks: Arc<LockMap>,
}

/// Held locks; released on drop
#[derive(Debug)]
pub struct AliasGuard {
    aliases: Vec<String>,
    guards: Vec<OwnedMutexGuard<()>>,
    locks: Arc<LockMap>,
}

impl AliasGuard {
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }
}

impl Drop for AliasGuard {
    fn drop(&mut self) {
        self.guards.clear();
        // The map's own Arc is the last reference once nobody waits
        for alias in &self.aliases {
            self.locks
                .remove_if(alias, |_, lock| Arc::strong_count(lock) == 1);
        }
    }
}

impl AliasLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock every alias in `aliases`, duplicates collapsed
    pub async fn acquire(&self, aliases: &[&str]) -> AliasGuard {
        let mut ordered: Vec<String> = aliases.iter().map(|a| a.to_string()).collect();
        ordered.sort();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for alias in &ordered {
            // Clone the Arc out so the shard lock is not held across the await
            let lock = self
                .locks
                .entry(alias.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone();
            guards.push(lock.lock_owned().await);
        }

        AliasGuard {
            aliases: ordered,
            guards,
            locks: self.locks.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
