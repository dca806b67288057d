//! Reputation Store abstraction
//!
//! The consensus engine only sees this trait. Production wires in the
//! PostgreSQL repository from `crate::database`; tests and single-node demos
//! use [`InMemoryReputationStore`].

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::StoreResult;
use crate::reputation::PeerReputationRecord;

/// Durable keyed collection of peer reputation records
#[async_trait]
pub trait ReputationStore: Send + Sync {
    /// Fetch a peer's record, persisting the default `(0, false)` row on first access
    async fn get(&self, peer_id: &str) -> StoreResult<PeerReputationRecord>;

    /// Persist a record atomically
    async fn set(&self, record: &PeerReputationRecord) -> StoreResult<()>;

    /// Read-modify-write one offense for a peer.
    ///
    /// Returns the updated record and whether this call blacklisted the peer.
    /// The default is a plain `get` + `set`; callers must serialize it per peer.
    /// Backends that can do better (row locks, entry APIs) override it.
    async fn apply_offense(
        &self,
        peer_id: &str,
        slashing_threshold: u32,
    ) -> StoreResult<(PeerReputationRecord, bool)> {
        let mut record = self.get(peer_id).await?;
        let newly_blacklisted = record.register_offense(slashing_threshold);
        self.set(&record).await?;
        Ok((record, newly_blacklisted))
    }
}

/// Process-local store. Not durable across restarts.
#[derive(Debug, Default)]
pub struct InMemoryReputationStore {
    records: DashMap<String, PeerReputationRecord>,
}

impl InMemoryReputationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of materialized rows
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ReputationStore for InMemoryReputationStore {
    async fn get(&self, peer_id: &str) -> StoreResult<PeerReputationRecord> {
        let record = self
            .records
            .entry(peer_id.to_string())
            .or_insert_with(|| PeerReputationRecord::new(peer_id))
            .value()
            .clone();
        Ok(record)
    }

    async fn set(&self, record: &PeerReputationRecord) -> StoreResult<()> {
        self.records.insert(record.peer_id.clone(), record.clone());
        Ok(())
    }

    async fn apply_offense(
        &self,
        peer_id: &str,
        slashing_threshold: u32,
    ) -> StoreResult<(PeerReputationRecord, bool)> {
        // The entry guard holds the shard lock for the whole update
        let mut entry = self
            .records
            .entry(peer_id.to_string())
            .or_insert_with(|| PeerReputationRecord::new(peer_id));
        let newly_blacklisted = entry.register_offense(slashing_threshold);
        Ok((entry.value().clone(), newly_blacklisted))
    }
}
