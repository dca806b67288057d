//! Error types for consensus rounds and reputation storage.

use thiserror::Error;

/// Errors raised by a [`ReputationStore`](crate::reputation::ReputationStore) backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The backing database rejected or failed the operation.
    #[error("Database error: {0}")]
    Database(String),

    /// A stored row could not be mapped back to a valid record.
    #[error("Invalid reputation record for {peer_id}: {reason}")]
    InvalidRecord {
        /// Peer whose row is malformed.
        peer_id: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Errors that abort a consensus round.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConsensusError {
    /// Every submission failed the identity/stake filter.
    #[error("No qualified responses: every submission failed the identity or stake filter")]
    NoQualifiedResponses,

    /// Every stake-qualified response was rejected as a statistical outlier.
    #[error("No responses passed the outlier filter")]
    NoResponsesPassedOutlierFilter,

    /// Reputation state could not be read or written.
    #[error("Reputation store failure: {0}")]
    Store(#[from] StoreError),
}

impl ConsensusError {
    /// Stable machine-readable code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ConsensusError::NoQualifiedResponses => "no_qualified_responses",
            ConsensusError::NoResponsesPassedOutlierFilter => "no_responses_passed_outlier_filter",
            ConsensusError::Store(_) => "reputation_store_failure",
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type for consensus operations.
pub type Result<T> = std::result::Result<T, ConsensusError>;
