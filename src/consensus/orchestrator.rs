//! Consensus Orchestrator - single entry point per round
//!
//! A round runs in three sequential stages over already-resolved balances:
//!
//! 1. Identity/stake filter: drop blacklisted peers and peers below the
//!    minimum stake, weight the rest by `sqrt(balance)`.
//! 2. Outlier filter: drop responses whose z-score around the median exceeds
//!    the configured limit and slash their peers.
//! 3. Aggregation: stake-weighted median of the survivors.
//!
//! Slashing in stage 2 is not rolled back if the round later fails.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::ConsensusConfig;
use crate::consensus::stats::{
    is_outlier, mean, median, standard_deviation, weighted_median, z_score,
};
use crate::consensus::types::{
    ConsensusResult, MAX_PRICE_MAGNITUDE, QualifiedResponse, Submission,
};
use crate::error::{ConsensusError, Result, StoreResult};
use crate::reputation::{ReputationStatus, ReputationStore, SlashingEngine};

pub struct ConsensusOrchestrator {
    store: Arc<dyn ReputationStore>,
    slashing: Arc<SlashingEngine>,
    config: ConsensusConfig,
}

impl ConsensusOrchestrator {
    /// Build an orchestrator with its own slashing engine over `store`
    pub fn new(store: Arc<dyn ReputationStore>, config: ConsensusConfig) -> Self {
        let slashing = Arc::new(SlashingEngine::new(
            store.clone(),
            config.slashing_threshold,
        ));
        Self::with_slashing_engine(store, slashing, config)
    }

    /// Share one slashing engine (and its per-peer locks) between orchestrators
    pub fn with_slashing_engine(
        store: Arc<dyn ReputationStore>,
        slashing: Arc<SlashingEngine>,
        config: ConsensusConfig,
    ) -> Self {
        Self {
            store,
            slashing,
            config,
        }
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    pub fn slashing_engine(&self) -> &Arc<SlashingEngine> {
        &self.slashing
    }

    /// Read-only reputation status for a peer
    pub async fn get_reputation(&self, peer_id: &str) -> StoreResult<ReputationStatus> {
        Ok(self.store.get(peer_id).await?.status())
    }

    /// Run one consensus round over submissions with resolved balances
    pub async fn process_round(&self, submissions: &[Submission]) -> Result<ConsensusResult> {
        let round_id = Uuid::new_v4();

        let valid = self.filter_by_stake(submissions).await?;
        if valid.is_empty() {
            info!(
                round_id = %round_id,
                submitted = submissions.len(),
                "Round aborted: no qualified responses"
            );
            return Err(ConsensusError::NoQualifiedResponses);
        }

        let (qualified, outliers) = self.filter_outliers(valid).await?;
        if qualified.is_empty() {
            info!(
                round_id = %round_id,
                outliers = outliers.len(),
                "Round aborted: every response was an outlier"
            );
            return Err(ConsensusError::NoResponsesPassedOutlierFilter);
        }

        let final_price = weighted_median(&qualified);
        let total_weight: f64 = qualified.iter().map(|r| r.weight).sum();

        info!(
            round_id = %round_id,
            final_price = final_price,
            participants = qualified.len(),
            total_weight = total_weight,
            outliers = outliers.len(),
            "Consensus round completed"
        );

        Ok(ConsensusResult {
            round_id,
            final_price,
            participants: qualified.len(),
            total_weight,
            outliers,
            completed_at: Utc::now(),
        })
    }

    /// Stage A. Read-only: never records an offense.
    async fn filter_by_stake(&self, submissions: &[Submission]) -> Result<Vec<QualifiedResponse>> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut valid = Vec::with_capacity(submissions.len());

        for submission in submissions {
            let peer_id = submission.peer_id.as_str();

            if seen.contains(peer_id) {
                debug!(peer_id = %peer_id, "Dropping duplicate submission in round");
                continue;
            }

            let record = self.store.get(peer_id).await?;
            if record.blacklisted {
                debug!(peer_id = %peer_id, "Dropping submission from blacklisted peer");
                continue;
            }

            if !submission.price.is_finite() || !submission.balance.is_finite() {
                debug!(
                    peer_id = %peer_id,
                    price = submission.price,
                    balance = submission.balance,
                    "Dropping submission with non-finite values"
                );
                continue;
            }

            if submission.price.abs() > MAX_PRICE_MAGNITUDE {
                debug!(
                    peer_id = %peer_id,
                    price = submission.price,
                    "Dropping submission with out-of-range price"
                );
                continue;
            }

            if submission.balance < self.config.minimum_stake_threshold {
                debug!(
                    peer_id = %peer_id,
                    balance = submission.balance,
                    minimum = self.config.minimum_stake_threshold,
                    "Dropping submission below minimum stake"
                );
                continue;
            }

            seen.insert(peer_id);
            valid.push(QualifiedResponse::from_submission(submission));
        }

        Ok(valid)
    }

    /// Stage B. Returns the survivors and the peers slashed as outliers.
    async fn filter_outliers(
        &self,
        valid: Vec<QualifiedResponse>,
    ) -> Result<(Vec<QualifiedResponse>, Vec<String>)> {
        let prices: Vec<f64> = valid.iter().map(|r| r.price).collect();
        let center = median(&prices);
        let std_dev = standard_deviation(&prices, mean(&prices));

        let mut qualified = Vec::with_capacity(valid.len());
        let mut outliers = Vec::new();

        for response in valid {
            let limit = self.config.outlier_z_score_limit;

            if is_outlier(response.price, center, std_dev, limit) {
                debug!(
                    peer_id = %response.peer_id,
                    price = response.price,
                    median = center,
                    z_score = z_score(response.price, center, std_dev),
                    "Response classified as outlier"
                );
                self.slashing.record_offense(&response.peer_id).await?;
                outliers.push(response.peer_id);
            } else {
                qualified.push(response);
            }
        }

        Ok((qualified, outliers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reputation::InMemoryReputationStore;

    fn orchestrator() -> (ConsensusOrchestrator, Arc<InMemoryReputationStore>) {
        let store = Arc::new(InMemoryReputationStore::new());
        (
            ConsensusOrchestrator::new(store.clone(), ConsensusConfig::default()),
            store,
        )
    }

    #[tokio::test]
    async fn test_below_minimum_stake_fails() {
        let (orchestrator, _store) = orchestrator();
        let result = orchestrator
            .process_round(&[Submission::new("peer_1", 100.0, 50.0)])
            .await;
        assert_eq!(result.unwrap_err(), ConsensusError::NoQualifiedResponses);
    }

    #[tokio::test]
    async fn test_empty_round_fails() {
        let (orchestrator, _store) = orchestrator();
        let result = orchestrator.process_round(&[]).await;
        assert_eq!(result.unwrap_err(), ConsensusError::NoQualifiedResponses);
    }

    #[tokio::test]
    async fn test_identical_prices_flag_nobody() {
        let (orchestrator, store) = orchestrator();
        let submissions: Vec<_> = (0..4)
            .map(|i| Submission::new(format!("peer_{}", i), 250.0, 400.0))
            .collect();

        let result = orchestrator.process_round(&submissions).await.unwrap();
        assert_eq!(result.participants, 4);
        assert_eq!(result.final_price, 250.0);
        assert_eq!(result.total_weight, 80.0);
        assert!(result.outliers.is_empty());
        assert_eq!(store.get("peer_0").await.unwrap().offense_count, 0);
    }

    #[tokio::test]
    async fn test_stake_exactly_at_threshold_qualifies() {
        let (orchestrator, _store) = orchestrator();
        let result = orchestrator
            .process_round(&[Submission::new("peer_1", 10.0, 100.0)])
            .await
            .unwrap();
        assert_eq!(result.participants, 1);
        assert_eq!(result.total_weight, 10.0);
    }

    #[tokio::test]
    async fn test_non_finite_values_are_dropped() {
        let (orchestrator, store) = orchestrator();
        let result = orchestrator
            .process_round(&[
                Submission::new("peer_nan", f64::NAN, 400.0),
                Submission::new("peer_inf", 100.0, f64::INFINITY),
            ])
            .await;
        assert_eq!(result.unwrap_err(), ConsensusError::NoQualifiedResponses);
        assert_eq!(store.get("peer_nan").await.unwrap().offense_count, 0);
    }

    #[tokio::test]
    async fn test_duplicate_peer_counts_once() {
        let (orchestrator, _store) = orchestrator();
        let result = orchestrator
            .process_round(&[
                Submission::new("peer_1", 100.0, 400.0),
                Submission::new("peer_1", 100.0, 400.0),
                Submission::new("peer_2", 100.0, 400.0),
            ])
            .await
            .unwrap();
        assert_eq!(result.participants, 2);
    }

    #[tokio::test]
    async fn test_invalid_first_submission_does_not_hide_valid_one() {
        let (orchestrator, _store) = orchestrator();
        let result = orchestrator
            .process_round(&[
                Submission::new("peer_1", 100.0, 50.0),
                Submission::new("peer_1", 101.0, 400.0),
                Submission::new("peer_1", 102.0, 400.0),
            ])
            .await
            .unwrap();
        assert_eq!(result.participants, 1);
        assert_eq!(result.final_price, 101.0);
    }

    #[tokio::test]
    async fn test_huge_price_cannot_mask_outliers() {
        let (orchestrator, store) = orchestrator();
        let result = orchestrator
            .process_round(&[
                Submission::new("honest_1", 99.0, 400.0),
                Submission::new("honest_2", 100.0, 400.0),
                Submission::new("honest_3", 100.0, 400.0),
                Submission::new("honest_4", 101.0, 400.0),
                Submission::new("liar", 500.0, 400.0),
                Submission::new("giant", 1e200, 400.0),
            ])
            .await
            .unwrap();

        assert_eq!(result.participants, 4);
        assert_eq!(result.final_price, 100.0);
        assert_eq!(result.outliers, vec!["liar".to_string()]);
        assert_eq!(store.get("liar").await.unwrap().offense_count, 1);
        assert_eq!(store.get("giant").await.unwrap().offense_count, 0);
    }

    #[tokio::test]
    async fn test_response_exactly_at_limit_is_kept() {
        let store = Arc::new(InMemoryReputationStore::new());
        let config = ConsensusConfig {
            outlier_z_score_limit: 1.0,
            ..ConsensusConfig::default()
        };
        let orchestrator = ConsensusOrchestrator::new(store.clone(), config);

        // median 0, std dev 1: both responses sit exactly at z = 1
        let result = orchestrator
            .process_round(&[
                Submission::new("peer_low", -1.0, 400.0),
                Submission::new("peer_high", 1.0, 400.0),
            ])
            .await
            .unwrap();

        assert_eq!(result.participants, 2);
        assert!(result.outliers.is_empty());
        assert_eq!(result.final_price, -1.0);
        assert_eq!(store.get("peer_low").await.unwrap().offense_count, 0);
        assert_eq!(store.get("peer_high").await.unwrap().offense_count, 0);
    }

    #[tokio::test]
    async fn test_all_outliers_keeps_offenses() {
        let store = Arc::new(InMemoryReputationStore::new());
        let config = ConsensusConfig {
            outlier_z_score_limit: 0.5,
            ..ConsensusConfig::default()
        };
        let orchestrator = ConsensusOrchestrator::new(store.clone(), config);

        // median 150, std dev 50: both responses sit at z = 1
        let result = orchestrator
            .process_round(&[
                Submission::new("peer_low", 100.0, 400.0),
                Submission::new("peer_high", 200.0, 400.0),
            ])
            .await;

        assert_eq!(
            result.unwrap_err(),
            ConsensusError::NoResponsesPassedOutlierFilter
        );
        assert_eq!(store.get("peer_low").await.unwrap().offense_count, 1);
        assert_eq!(store.get("peer_high").await.unwrap().offense_count, 1);
    }

    #[tokio::test]
    async fn test_get_reputation_defaults() {
        let (orchestrator, _store) = orchestrator();
        let status = orchestrator.get_reputation("unknown").await.unwrap();
        assert_eq!(status.offenses, 0);
        assert!(!status.blacklisted);
    }
}
