//! Database Connection Pool using sqlx

use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use tracing::info;

use crate::database::reputation::ReputationRepository;

pub struct DatabasePool {
    pool: PgPool,
    reputation: Arc<ReputationRepository>,
}

impl DatabasePool {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(connection_string)
            .await
            .context("Failed to connect to PostgreSQL")?;

        info!("Connected to PostgreSQL");

        let reputation = Arc::new(ReputationRepository::new(pool.clone()));

        Ok(Self { pool, reputation })
    }

    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing database schema...");

        self.reputation
            .init_schema()
            .await
            .context("Failed to initialize reputation schema")?;

        info!("Database schema initialized");
        Ok(())
    }

    pub fn reputation(&self) -> Arc<ReputationRepository> {
        self.reputation.clone()
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("PostgreSQL pool closed");
    }
}
