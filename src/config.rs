use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use url::Url;

/// Configuration for the price consensus oracle
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OracleConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Consensus thresholds
    pub consensus: ConsensusConfig,
    /// Stake discovery configuration
    pub stake: StakeConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8780,
        }
    }
}

/// Per-deployment consensus tuning, injected into the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Minimum reputation-token balance for a submission to count
    pub minimum_stake_threshold: f64,
    /// Offense count at which a peer is blacklisted
    pub slashing_threshold: u32,
    /// Responses further than this many standard deviations from the median are outliers
    pub outlier_z_score_limit: f64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            minimum_stake_threshold: 100.0,
            slashing_threshold: 3,
            outlier_z_score_limit: 2.0,
        }
    }
}

impl ConsensusConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.minimum_stake_threshold.is_finite() || self.minimum_stake_threshold < 0.0 {
            return Err(anyhow::anyhow!(
                "Minimum stake threshold must be a finite, non-negative number (got {})",
                self.minimum_stake_threshold
            ));
        }

        if self.slashing_threshold == 0 {
            return Err(anyhow::anyhow!("Slashing threshold must be at least 1"));
        }

        if !self.outlier_z_score_limit.is_finite() || self.outlier_z_score_limit <= 0.0 {
            return Err(anyhow::anyhow!(
                "Outlier z-score limit must be a finite, positive number (got {})",
                self.outlier_z_score_limit
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeConfig {
    /// Balance service base URL; unset means no remote stake discovery
    pub service_url: Option<String>,
    /// Reputation token whose balance is used as stake
    pub token: String,
    /// Responsiveness window for one round of balance lookups
    pub timeout_ms: u64,
}

impl Default for StakeConfig {
    fn default() -> Self {
        Self {
            service_url: None,
            token: "REP".to_string(),
            timeout_ms: 2000,
        }
    }
}

impl StakeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub postgres_url: String,
    /// Enable PostgreSQL (if false, uses in-memory fallback)
    pub postgres_enabled: bool,
    /// Connection pool size
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            postgres_url: "postgresql://localhost:5432/price_oracle".to_string(),
            postgres_enabled: false,
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Emit span open/close events for request tracing
    pub log_requests: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_requests: false,
        }
    }
}

impl OracleConfig {
    /// Load configuration from environment variables and validate it
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Server configuration
        if let Ok(host) = env::var("SILICA_HOST") {
            config.server.host = host;
        }

        if let Ok(port) = env::var("SILICA_PORT") {
            config.server.port = port.parse().context("Invalid SILICA_PORT value")?;
        }

        // Consensus thresholds
        if let Ok(threshold) = env::var("SILICA_MINIMUM_STAKE_THRESHOLD") {
            config.consensus.minimum_stake_threshold = threshold
                .parse()
                .context("Invalid SILICA_MINIMUM_STAKE_THRESHOLD value")?;
        }

        if let Ok(threshold) = env::var("SILICA_SLASHING_THRESHOLD") {
            config.consensus.slashing_threshold = threshold
                .parse()
                .context("Invalid SILICA_SLASHING_THRESHOLD value")?;
        }

        if let Ok(limit) = env::var("SILICA_OUTLIER_Z_SCORE_LIMIT") {
            config.consensus.outlier_z_score_limit = limit
                .parse()
                .context("Invalid SILICA_OUTLIER_Z_SCORE_LIMIT value")?;
        }

        // Stake discovery
        if let Ok(url) = env::var("SILICA_STAKE_SERVICE_URL") {
            config.stake.service_url = Some(url);
        }

        if let Ok(token) = env::var("SILICA_STAKE_TOKEN") {
            config.stake.token = token;
        }

        if let Ok(timeout) = env::var("SILICA_STAKE_TIMEOUT_MS") {
            config.stake.timeout_ms = timeout
                .parse()
                .context("Invalid SILICA_STAKE_TIMEOUT_MS value")?;
        }

        // Database configuration
        if let Ok(url) = env::var("SILICA_POSTGRES_URL") {
            config.database.postgres_url = url;
        }

        if let Ok(enabled) = env::var("SILICA_POSTGRES_ENABLED") {
            config.database.postgres_enabled = enabled
                .parse()
                .context("Invalid SILICA_POSTGRES_ENABLED value")?;
        }

        if let Ok(max) = env::var("SILICA_POSTGRES_MAX_CONNECTIONS") {
            config.database.max_connections = max
                .parse()
                .context("Invalid SILICA_POSTGRES_MAX_CONNECTIONS value")?;
        }

        // Logging configuration
        if let Ok(log_level) = env::var("SILICA_LOG_LEVEL") {
            config.logging.level = log_level;
        }

        if let Ok(log_requests) = env::var("SILICA_LOG_REQUESTS") {
            config.logging.log_requests = log_requests
                .parse()
                .context("Invalid SILICA_LOG_REQUESTS value")?;
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.consensus.validate()?;

        if self.stake.timeout_ms == 0 {
            return Err(anyhow::anyhow!("Stake lookup timeout must be greater than zero"));
        }

        if self.stake.token.trim().is_empty() {
            return Err(anyhow::anyhow!("Stake token cannot be empty"));
        }

        if let Some(url) = &self.stake.service_url {
            Url::parse(url).with_context(|| format!("Invalid stake service URL: {}", url))?;
        }

        if self.database.postgres_enabled {
            if self.database.postgres_url.is_empty() {
                return Err(anyhow::anyhow!(
                    "PostgreSQL is enabled but no connection string is configured"
                ));
            }
            if self.database.max_connections == 0 {
                return Err(anyhow::anyhow!("PostgreSQL pool needs at least one connection"));
            }
        }

        Ok(())
    }
}
