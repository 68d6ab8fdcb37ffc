//! Assassins Game Server
//!
//! Authoritative server for a live-action elimination game. Players are
//! each secretly assigned a target; kill claims are validated, recorded in
//! an append-only ledger, and a confirmed death re-links the target chain
//! around the eliminated player and broadcasts a notification.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs         - Crate root with re-exports
//! ├── main.rs        - Server entrypoint
//! ├── config.rs      - Configuration management
//! ├── error.rs       - Game error kinds
//! ├── game/          - Kill-claim engine
//! │   ├── models.rs     - Players, claims, reports, credentials, filters
//! │   ├── identity.rs   - Credential resolution
//! │   ├── locks.rs      - Per-alias submission locks
//! │   ├── processor.rs  - Kill claim state machine
//! │   ├── chain.rs      - Target chain finalize, start and audit
//! │   ├── notify.rs     - Broadcast and persisted notifications
//! │   └── players.rs    - Registration and player visibility
//! ├── api/           - HTTP API endpoints
//! │   ├── endpoint.rs   - Shared resource interface and routing
//! │   ├── resources.rs  - Kills, players, messages
//! │   ├── game.rs       - Login, start, chain audit, live stream
//! │   └── middleware.rs - Rate limits, body limits, headers, logging
//! └── database/      - Storage backends
//!     ├── memory.rs     - In-memory store
//!     ├── pool.rs       - PostgreSQL store
//!     └── players.rs, claims.rs, notifications.rs - Repositories
//! ```

pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod game;

// Re-export main types for convenience
pub use api::{create_app, SecurityMiddlewareConfig, SecurityState};
pub use config::GameConfig;
pub use database::{CommitOutcome, DatabasePool, GameStore, MemoryStore};
pub use error::{GameError, GameResult};
pub use game::{
    check_chain, seed_store, ChainReport, ClaimFilter, Credentials, Game, KillClaim,
    KillClaimProcessor, Player, PlayerFilter, Registration, Report,
};
