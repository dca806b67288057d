//! HTTP API endpoints

pub mod consensus;
pub mod reputation;

pub use consensus::{ConsensusApiState, create_consensus_router};
pub use reputation::{ReputationApiState, create_reputation_router};
