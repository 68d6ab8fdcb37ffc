//! Game data model: players, kill claims, reports, credentials and filters

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A registered player
///
/// `target` holds the alias of the current assignment. It is an index into
/// the player store, never an owning link, and is empty once the player is
/// dead or before the game starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub alias: String,
    pub nickname: String,
    pub codename: String,
    pub passphrase: String,
    #[serde(default)]
    pub admin: bool,
    #[serde(default = "default_alive")]
    pub alive: bool,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub kills: u32,
    /// Bumped by the store on every persisted write
    #[serde(default)]
    pub revision: u64,
}

fn default_alive() -> bool {
    true
}

impl Player {
    pub fn new(alias: &str, nickname: &str, codename: &str, passphrase: &str) -> Self {
        Self {
            alias: alias.to_string(),
            nickname: nickname.to_string(),
            codename: codename.to_string(),
            passphrase: passphrase.to_string(),
            admin: false,
            alive: true,
            target: String::new(),
            kills: 0,
            revision: 0,
        }
    }

    pub fn admin(alias: &str, nickname: &str, codename: &str, passphrase: &str) -> Self {
        Self {
            admin: true,
            ..Self::new(alias, nickname, codename, passphrase)
        }
    }

    pub fn with_target(mut self, target: &str) -> Self {
        self.target = target.to_string();
        self
    }

    /// Copy without secret fields, for showing a record to someone else
    pub fn without_secrets(&self) -> Self {
        Self {
            codename: String::new(),
            passphrase: String::new(),
            ..self.clone()
        }
    }

    /// Only the fields any player may learn about another
    pub fn public_view(&self) -> Self {
        Self {
            alias: self.alias.clone(),
            nickname: self.nickname.clone(),
            codename: String::new(),
            passphrase: String::new(),
            admin: self.admin,
            alive: self.alive,
            target: String::new(),
            kills: 0,
            revision: 0,
        }
    }
}

/// An assertion that `killer` eliminated `victim`
///
/// `killer` is optional only so it can be redacted when the claim is shown
/// to its victim; submitted claims always carry one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillClaim {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub killer: Option<String>,
    pub victim: String,
}

impl KillClaim {
    pub fn new(killer: &str, victim: &str) -> Self {
        Self {
            killer: Some(killer.to_string()),
            victim: victim.to_string(),
        }
    }

    pub fn killer_alias(&self) -> &str {
        self.killer.as_deref().unwrap_or("")
    }

    /// Victim personally confirming their own death
    pub fn is_self_report(&self) -> bool {
        self.killer_alias() == self.victim
    }

    pub fn involves(&self, alias: &str) -> bool {
        self.killer_alias() == alias || self.victim == alias
    }

    pub fn redacted(mut self) -> Self {
        self.killer = None;
        self
    }
}

/// Audit-stamped wrapper around submitted data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report<T> {
    pub data: T,
    pub reporter: String,
    /// Milliseconds since the Unix epoch, assigned by the server
    pub timestamp: i64,
}

impl<T> Report<T> {
    pub fn new(data: T, reporter: &str, timestamp: i64) -> Self {
        Self {
            data,
            reporter: reporter.to_string(),
            timestamp,
        }
    }

    pub fn now(data: T, reporter: &str) -> Self {
        Self::new(data, reporter, Utc::now().timestamp_millis())
    }
}

/// Identity submitted with every request
///
/// `alias` is the public identifier; `codename` and `passphrase` are
/// compared against the stored record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub codename: String,
    #[serde(default)]
    pub passphrase: String,
}

impl Credentials {
    pub fn new(alias: &str, codename: &str, passphrase: &str) -> Self {
        Self {
            alias: alias.to_string(),
            codename: codename.to_string(),
            passphrase: passphrase.to_string(),
        }
    }
}

/// Filter over the claim ledger; unset fields match anything
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimFilter {
    #[serde(default)]
    pub killer: Option<String>,
    #[serde(default)]
    pub victim: Option<String>,
}

impl ClaimFilter {
    pub fn pair(killer: &str, victim: &str) -> Self {
        Self {
            killer: Some(killer.to_string()),
            victim: Some(victim.to_string()),
        }
    }

    pub fn matches(&self, claim: &KillClaim) -> bool {
        let killer_ok = self
            .killer
            .as_deref()
            .map_or(true, |k| claim.killer.as_deref() == Some(k));
        let victim_ok = self.victim.as_deref().map_or(true, |v| claim.victim == v);
        killer_ok && victim_ok
    }
}

/// Filter over the player store; unset fields match anything
///
/// The alias is named `player` on the wire so it never collides with the
/// submitter's credential `alias`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerFilter {
    #[serde(default, rename = "player")]
    pub alias: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub alive: Option<bool>,
}

impl PlayerFilter {
    /// Alive players currently assigned `alias`
    pub fn targeting(alias: &str) -> Self {
        Self {
            alias: None,
            target: Some(alias.to_string()),
            alive: Some(true),
        }
    }

    pub fn alive() -> Self {
        Self {
            alive: Some(true),
            ..Self::default()
        }
    }

    pub fn matches(&self, player: &Player) -> bool {
        self.alias.as_deref().map_or(true, |a| player.alias == a)
            && self.target.as_deref().map_or(true, |t| player.target == t)
            && self.alive.map_or(true, |a| player.alive == a)
    }
}

/// One all-or-nothing storage write produced by a kill claim
///
/// `players` carry the revision they were read at; the store rejects the
/// whole unit if any of them changed since.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimCommit {
    pub claim: KillClaim,
    pub players: Vec<Player>,
}
