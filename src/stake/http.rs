use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::StakeResolver;

/// Balance lookups against a remote stake service.
///
/// `GET {service_url}/balances/{token}/{peer_id}` → `{ "balance": <number> }`
#[derive(Clone)]
pub struct HttpStakeResolver {
    client: Client,
    base_url: Url,
    token: String,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    balance: f64,
}

impl HttpStakeResolver {
    pub fn new(service_url: &str, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(service_url).context("Invalid stake service URL")?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent("SilicaPriceOracle/0.1 (stake discovery)")
            .build()
            .context("Failed to create stake service HTTP client")?;

        info!("Stake discovery via {}", base_url);

        Ok(Self {
            client,
            base_url,
            token: token.into(),
        })
    }

    fn balance_url(&self, peer_id: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Stake service URL cannot be a base: {}", self.base_url))?
            .pop_if_empty()
            .extend(["balances", self.token.as_str(), peer_id]);
        Ok(url)
    }
}

#[async_trait]
impl StakeResolver for HttpStakeResolver {
    async fn resolve_balance(&self, peer_id: &str) -> Result<f64> {
        let url = self.balance_url(peer_id)?;

        let response = self
            .client
            .get(url.as_str())
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send stake lookup request")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "Stake lookup failed with status {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            ));
        }

        let body: BalanceResponse = response
            .json()
            .await
            .context("Failed to decode stake lookup response")?;

        debug!(peer_id = %peer_id, balance = body.balance, "Resolved stake balance");
        Ok(body.balance)
    }
}
