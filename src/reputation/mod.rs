//! Peer Reputation and Slashing
//!
//! Tracks how often each peer has been classified as an outlier and
//! progressively excludes repeat offenders.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐     ┌──────────────────────┐
//! │ ConsensusRound   │────►│ SlashingEngine   │────►│ ReputationStore      │
//! │ (outlier found)  │     │ (per-peer lock)  │     │ (memory / Postgres)  │
//! └──────────────────┘     └──────────────────┘     └──────────────────────┘
//!                                  │
//!                                  ▼
//!                          ┌──────────────────┐
//!                          │ SlashNotification│
//!                          │ (broadcast)      │
//!                          └──────────────────┘
//! ```
//!
//! ## State Model
//!
//! - Every peer starts at `(offense_count = 0, blacklisted = false)`
//! - Each outlier classification adds exactly one offense
//! - The peer is blacklisted the first time the count reaches the threshold
//! - Offenses never decay and blacklists are never lifted

mod record;
mod slash;
mod store;

pub use record::{PeerReputationRecord, ReputationStatus};
pub use slash::{SlashNotification, SlashNotificationKind, SlashOutcome, SlashingEngine};
pub use store::{InMemoryReputationStore, ReputationStore};
