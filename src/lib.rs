//! Silica Price Oracle
//!
//! Aggregates price submissions from untrusted peers into one consensus
//! value. Submissions are gated by stake, weighted by the square root of
//! stake, screened for statistical outliers, and combined with a weighted
//! median. Peers that keep submitting outliers are slashed and eventually
//! blacklisted.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs         - Crate root with re-exports
//! ├── main.rs        - Server entrypoint
//! ├── config.rs      - Configuration management
//! ├── error.rs       - Typed round and store errors
//! ├── consensus/     - Price consensus
//! │   ├── stats.rs        - mean, median, std deviation, weighted median
//! │   ├── types.rs        - Submissions, qualified responses, results
//! │   └── orchestrator.rs - Stake filter → outlier filter → aggregation
//! ├── reputation/    - Peer reputation and slashing
//! │   ├── record.rs  - Per-peer offense record
//! │   ├── store.rs   - Store abstraction + in-memory store
//! │   └── slash.rs   - Slashing engine (per-peer serialized)
//! ├── stake/         - Stake discovery (concurrent, fail-safe to 0)
//! ├── database/      - PostgreSQL persistence
//! └── api/           - HTTP API endpoints
//! ```

pub mod api;
pub mod config;
pub mod consensus;
pub mod database;
pub mod error;
pub mod reputation;
pub mod stake;

// Re-export main types for convenience
pub use config::{ConsensusConfig, OracleConfig};
pub use consensus::{
    ConsensusOrchestrator, ConsensusResult, QualifiedResponse, RawSubmission, Submission,
};
pub use database::{DatabasePool, ReputationRepository};
pub use error::{ConsensusError, StoreError};
pub use reputation::{
    InMemoryReputationStore, PeerReputationRecord, ReputationStatus, ReputationStore,
    SlashNotification, SlashNotificationKind, SlashOutcome, SlashingEngine,
};
pub use stake::{HttpStakeResolver, StakeResolver, StaticStakeResolver, resolve_submissions};
