//! Price Consensus
//!
//! Turns a round of stake-enriched price submissions into one
//! Sybil-resistant, outlier-resistant value.
//!
//! ```text
//! Submission ──► stake filter ──► outlier filter ──► weighted median ──► ConsensusResult
//!                  (reads           (slashes
//!                   reputation)      outliers)
//! ```

pub mod orchestrator;
pub mod stats;
pub mod types;

pub use orchestrator::ConsensusOrchestrator;
pub use types::{
    stake_weight, ConsensusResult, QualifiedResponse, RawSubmission, Submission,
    MAX_PRICE_MAGNITUDE,
};

#[cfg(test)]
mod proptests;
