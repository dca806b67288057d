//! Property-based tests for the aggregation statistics.
//!
//! - The weighted median is always one of the submitted prices
//! - It does not depend on submission order
//! - With equal weights it matches the classical (lower) median
//! - The outlier rule never fires when all prices are equal
//! - A round drops exactly the responses with |price - median| > 2 * stdDev

use proptest::prelude::*;
use std::sync::Arc;

use super::orchestrator::ConsensusOrchestrator;
use super::stats::{mean, median, standard_deviation, weighted_median, z_score};
use super::types::{QualifiedResponse, Submission};
use crate::config::ConsensusConfig;
use crate::error::ConsensusError;
use crate::reputation::{InMemoryReputationStore, ReputationStore};

/// Mostly clustered prices with the occasional far-off one.
fn round_prices_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(
        prop_oneof![4 => 90u32..110, 1 => 0u32..100_000].prop_map(|p| p as f64),
        1..20,
    )
}

/// Peers flagged by the outlier rule, computed from first principles.
fn expected_outliers(prices: &[f64]) -> Vec<usize> {
    let n = prices.len() as f64;

    let mut sorted = prices.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    let center = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    let avg = prices.iter().sum::<f64>() / n;
    let variance = prices.iter().map(|p| (p - avg) * (p - avg)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    prices
        .iter()
        .enumerate()
        .filter(|(_, p)| std_dev > 0.0 && (*p - center).abs() > 2.0 * std_dev)
        .map(|(i, _)| i)
        .collect()
}

fn responses_strategy() -> impl Strategy<Value = Vec<QualifiedResponse>> {
    prop::collection::vec((1u32..10_000, 1u32..1_000), 1..40).prop_map(|pairs| {
        pairs
            .into_iter()
            .enumerate()
            .map(|(i, (price, weight))| QualifiedResponse {
                peer_id: format!("peer_{}", i),
                price: price as f64,
                weight: weight as f64,
                balance: (weight as f64) * (weight as f64),
            })
            .collect()
    })
}

proptest! {
    /// Result is a price present in the input.
    #[test]
    fn weighted_median_returns_input_price(responses in responses_strategy()) {
        let result = weighted_median(&responses);
        prop_assert!(responses.iter().any(|r| r.price == result));
    }

    /// Reversing and rotating the input does not change the result.
    #[test]
    fn weighted_median_is_order_independent(
        responses in responses_strategy(),
        rotation in 0usize..40,
    ) {
        let expected = weighted_median(&responses);

        let mut reversed = responses.clone();
        reversed.reverse();
        prop_assert_eq!(weighted_median(&reversed), expected);

        let mut rotated = responses.clone();
        let len = rotated.len();
        rotated.rotate_left(rotation % len);
        prop_assert_eq!(weighted_median(&rotated), expected);
    }

    /// Equal weights: odd lengths give the classical median, even lengths the
    /// lower of the two middle prices (ascending-scan tie-break).
    #[test]
    fn equal_weights_reduce_to_median(
        prices in prop::collection::vec(1u32..10_000, 1..40),
        weight in 1u32..1_000,
    ) {
        let responses: Vec<QualifiedResponse> = prices
            .iter()
            .enumerate()
            .map(|(i, p)| QualifiedResponse {
                peer_id: format!("peer_{}", i),
                price: *p as f64,
                weight: weight as f64,
                balance: (weight as f64) * (weight as f64),
            })
            .collect();

        let mut sorted: Vec<f64> = prices.iter().map(|p| *p as f64).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let n = sorted.len();

        let result = weighted_median(&responses);
        if n % 2 == 1 {
            prop_assert_eq!(result, median(&sorted));
        } else {
            prop_assert_eq!(result, sorted[n / 2 - 1]);
        }
    }

    /// Identical prices have zero spread and never produce a positive z-score.
    #[test]
    fn identical_prices_never_flagged(price in 1u32..10_000, n in 1usize..20) {
        let prices = vec![price as f64; n];
        let center = median(&prices);
        let std_dev = standard_deviation(&prices, mean(&prices));
        prop_assert_eq!(std_dev, 0.0);
        prop_assert_eq!(z_score(price as f64, center, std_dev), 0.0);
    }

    /// Stage B drops exactly the responses the rule names and slashes each once.
    #[test]
    fn round_excludes_exactly_rule_outliers(prices in round_prices_strategy()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        let store = Arc::new(InMemoryReputationStore::new());
        let orchestrator = ConsensusOrchestrator::new(store.clone(), ConsensusConfig::default());
        let submissions: Vec<Submission> = prices
            .iter()
            .enumerate()
            .map(|(i, p)| Submission::new(format!("peer_{}", i), *p, 400.0))
            .collect();

        let expected = expected_outliers(&prices);
        let expected_ids: Vec<String> = expected.iter().map(|i| format!("peer_{}", i)).collect();

        let result = runtime.block_on(orchestrator.process_round(&submissions));
        match result {
            Ok(result) => {
                prop_assert_eq!(&result.outliers, &expected_ids);
                prop_assert_eq!(result.participants, prices.len() - expected.len());
            }
            Err(err) => {
                prop_assert_eq!(err, ConsensusError::NoResponsesPassedOutlierFilter);
                prop_assert_eq!(expected.len(), prices.len());
            }
        }

        for (i, _) in prices.iter().enumerate() {
            let record = runtime.block_on(store.get(&format!("peer_{}", i))).unwrap();
            let flagged = expected.contains(&i);
            prop_assert_eq!(record.offense_count, u32::from(flagged));
        }
    }
}
