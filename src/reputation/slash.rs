//! Slashing Engine
//!
//! Records one offense per outlier classification and blacklists a peer the
//! first time its offense count reaches the slashing threshold. There is no
//! operation that lowers an offense count or lifts a blacklist.
//!
//! Updates for the same peer are serialized through a per-peer mutex so that
//! concurrent rounds never lose an increment. Different peers never contend.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{error, warn};

use crate::error::StoreResult;
use crate::reputation::{PeerReputationRecord, ReputationStore};

/// Result of recording an offense
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashOutcome {
    /// Offense counted, peer still eligible (or already blacklisted earlier)
    OffenseRecorded { record: PeerReputationRecord },
    /// This offense pushed the peer over the threshold
    Blacklisted { record: PeerReputationRecord },
}

impl SlashOutcome {
    pub fn record(&self) -> &PeerReputationRecord {
        match self {
            SlashOutcome::OffenseRecorded { record } | SlashOutcome::Blacklisted { record } => {
                record
            }
        }
    }

    pub fn is_blacklisting(&self) -> bool {
        matches!(self, SlashOutcome::Blacklisted { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlashNotificationKind {
    OffenseRecorded,
    Blacklisted,
}

/// Broadcast to subscribers after every persisted offense
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlashNotification {
    pub peer_id: String,
    pub offense_count: u32,
    pub kind: SlashNotificationKind,
    pub at: DateTime<Utc>,
}

pub struct SlashingEngine {
    store: Arc<dyn ReputationStore>,
    slashing_threshold: u32,
    peer_locks: DashMap<String, Arc<Mutex<()>>>,
    event_sender: broadcast::Sender<SlashNotification>,
}

impl SlashingEngine {
    pub fn new(store: Arc<dyn ReputationStore>, slashing_threshold: u32) -> Self {
        let (event_sender, _) = broadcast::channel(256);

        Self {
            store,
            slashing_threshold,
            peer_locks: DashMap::new(),
            event_sender,
        }
    }

    /// Receive a notification for every recorded offense
    pub fn subscribe(&self) -> broadcast::Receiver<SlashNotification> {
        self.event_sender.subscribe()
    }

    /// Count one offense against `peer_id` and persist it
    pub async fn record_offense(&self, peer_id: &str) -> StoreResult<SlashOutcome> {
        let lock = self
            .peer_locks
            .entry(peer_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        let applied = {
            let _guard = lock.lock().await;
            self.store
                .apply_offense(peer_id, self.slashing_threshold)
                .await
        };

        // Drop the peer's lock once no other round is waiting on it
        drop(lock);
        self.peer_locks
            .remove_if(peer_id, |_, lock| Arc::strong_count(lock) == 1);

        let (record, newly_blacklisted) = applied?;

        let outcome = if newly_blacklisted {
            error!(
                peer_id = %peer_id,
                offense_count = record.offense_count,
                threshold = self.slashing_threshold,
                "Peer blacklisted after repeated outlier submissions"
            );
            SlashOutcome::Blacklisted { record }
        } else {
            warn!(
                peer_id = %peer_id,
                offense_count = record.offense_count,
                "Recorded outlier offense"
            );
            SlashOutcome::OffenseRecorded { record }
        };

        self.notify(&outcome);

        Ok(outcome)
    }

    fn notify(&self, outcome: &SlashOutcome) {
        let record = outcome.record();
        let kind = if outcome.is_blacklisting() {
            SlashNotificationKind::Blacklisted
        } else {
            SlashNotificationKind::OffenseRecorded
        };

        // No subscribers is fine
        let _ = self.event_sender.send(SlashNotification {
            peer_id: record.peer_id.clone(),
            offense_count: record.offense_count,
            kind,
            at: Utc::now(),
        });
    }
}
