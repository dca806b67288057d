//! Round input and output types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A price observation with its stake balance already resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub peer_id: String,
    pub price: f64,
    /// Reputation-token balance; 0 when stake discovery failed
    pub balance: f64,
}

impl Submission {
    pub fn new(peer_id: impl Into<String>, price: f64, balance: f64) -> Self {
        Self {
            peer_id: peer_id.into(),
            price,
            balance,
        }
    }
}

/// A price observation before stake discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSubmission {
    pub peer_id: String,
    pub price: f64,
}

/// A submission that passed the identity/stake filter, scoped to one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualifiedResponse {
    pub peer_id: String,
    pub price: f64,
    /// sqrt(balance)
    pub weight: f64,
    pub balance: f64,
}

impl QualifiedResponse {
    /// Weight a submission by the square root of its stake.
    pub fn from_submission(submission: &Submission) -> Self {
        Self {
            peer_id: submission.peer_id.clone(),
            price: submission.price,
            weight: stake_weight(submission.balance),
            balance: submission.balance,
        }
    }
}

/// Largest price magnitude accepted into a round. Squared deviations between
/// prices inside this bound stay finite.
pub const MAX_PRICE_MAGNITUDE: f64 = 1e150;

/// Square-root stake weighting. Non-negative and monotonic in balance.
pub fn stake_weight(balance: f64) -> f64 {
    balance.max(0.0).sqrt()
}

/// Outcome of a successful round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub round_id: Uuid,
    pub final_price: f64,
    /// Number of responses in the qualified set
    pub participants: usize,
    /// Sum of qualified weights
    pub total_weight: f64,
    /// Peers slashed as outliers this round, in submission order
    pub outliers: Vec<String>,
    pub completed_at: DateTime<Utc>,
}
