//! Peer Reputation Records
//!
//! One row per peer. Rows are created lazily with `(0, false)` on first
//! lookup, only ever move forward, and are never deleted.

use serde::{Deserialize, Serialize};

/// Persistent offense history for a single peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerReputationRecord {
    pub peer_id: String,

    /// Number of outlier classifications (monotonically non-decreasing)
    pub offense_count: u32,

    /// Terminal exclusion flag (never reset)
    pub blacklisted: bool,
}

impl PeerReputationRecord {
    /// Default record for a peer never seen before
    pub fn new(peer_id: impl Into<String>) -> Self {
        Self {
            peer_id: peer_id.into(),
            offense_count: 0,
            blacklisted: false,
        }
    }

    /// Count one more offense, blacklisting once the threshold is reached.
    ///
    /// Returns `true` only on the call that flips `blacklisted`.
    pub fn register_offense(&mut self, slashing_threshold: u32) -> bool {
        self.offense_count = self.offense_count.saturating_add(1);

        if !self.blacklisted && self.offense_count >= slashing_threshold {
            self.blacklisted = true;
            return true;
        }

        false
    }

    /// Read-only view for status queries
    pub fn status(&self) -> ReputationStatus {
        ReputationStatus {
            peer_id: self.peer_id.clone(),
            offenses: self.offense_count,
            blacklisted: self.blacklisted,
        }
    }
}

/// Public reputation summary returned by `get_reputation`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationStatus {
    pub peer_id: String,
    pub offenses: u32,
    pub blacklisted: bool,
}
