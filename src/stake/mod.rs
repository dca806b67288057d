//! Stake Discovery
//!
//! Resolves each submitting peer's reputation-token balance before a round
//! starts. Lookups for one round are issued concurrently and bounded by a
//! responsiveness window. Any failure or timeout degrades to a balance of 0,
//! which the stake filter rejects, so resolution never aborts a round.

mod http;

pub use http::HttpStakeResolver;

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use std::time::Duration;
use tracing::warn;

use crate::consensus::{RawSubmission, Submission};

/// Source of per-peer stake balances
#[async_trait]
pub trait StakeResolver: Send + Sync {
    async fn resolve_balance(&self, peer_id: &str) -> Result<f64>;
}

/// Fixed balances, for tests and local demos. Unknown peers fail to resolve.
#[derive(Debug, Clone, Default)]
pub struct StaticStakeResolver {
    balances: HashMap<String, f64>,
}

impl StaticStakeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(mut self, peer_id: impl Into<String>, balance: f64) -> Self {
        self.balances.insert(peer_id.into(), balance);
        self
    }
}

#[async_trait]
impl StakeResolver for StaticStakeResolver {
    async fn resolve_balance(&self, peer_id: &str) -> Result<f64> {
        self.balances
            .get(peer_id)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("No balance known for peer {}", peer_id))
    }
}

/// Resolve balances for every submission concurrently, preserving order.
///
/// Each lookup gets the same `window`; failures, timeouts and nonsensical
/// values (negative, NaN, infinite) all become 0.
pub async fn resolve_submissions(
    resolver: &dyn StakeResolver,
    submissions: Vec<RawSubmission>,
    window: Duration,
) -> Vec<Submission> {
    let lookups = submissions.iter().map(|submission| async move {
        match tokio::time::timeout(window, resolver.resolve_balance(&submission.peer_id)).await {
            Ok(Ok(balance)) if balance.is_finite() && balance >= 0.0 => balance,
            Ok(Ok(balance)) => {
                warn!(
                    peer_id = %submission.peer_id,
                    balance = balance,
                    "Stake service returned an invalid balance, using 0"
                );
                0.0
            }
            Ok(Err(e)) => {
                warn!(
                    peer_id = %submission.peer_id,
                    error = %e,
                    "Stake lookup failed, using 0"
                );
                0.0
            }
            Err(_) => {
                warn!(
                    peer_id = %submission.peer_id,
                    window_ms = window.as_millis() as u64,
                    "Stake lookup timed out, using 0"
                );
                0.0
            }
        }
    });

    let balances = join_all(lookups).await;

    submissions
        .into_iter()
        .zip(balances)
        .map(|(raw, balance)| Submission {
            peer_id: raw.peer_id,
            price: raw.price,
            balance,
        })
        .collect()
}
