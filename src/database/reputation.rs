//! Reputation Repository - durable peer reputation rows in PostgreSQL
//!
//! One row per peer in `reputation.peers`. Default rows are materialized on
//! first read. Offense increments run inside a transaction holding a row lock
//! so that several oracle processes sharing one database stay serialized.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::reputation::{PeerReputationRecord, ReputationStore};

pub struct ReputationRepository {
    pool: PgPool,
}

impl ReputationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Initialize reputation schema and tables
    pub async fn init_schema(&self) -> StoreResult<()> {
        info!("Initializing reputation schema...");

        sqlx::query("CREATE SCHEMA IF NOT EXISTS reputation")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reputation.peers (
                peer_id VARCHAR(255) PRIMARY KEY,
                offense_count INTEGER NOT NULL DEFAULT 0 CHECK (offense_count >= 0),
                blacklisted BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_peers_blacklisted ON reputation.peers(blacklisted) WHERE blacklisted",
        )
        .execute(&self.pool)
        .await?;

        info!("Reputation schema initialized");
        Ok(())
    }
}

fn record_from_row(row: &PgRow) -> StoreResult<PeerReputationRecord> {
    let peer_id: String = row.get("peer_id");
    let offense_count: i32 = row.get("offense_count");
    let blacklisted: bool = row.get("blacklisted");

    let offense_count = u32::try_from(offense_count).map_err(|_| StoreError::InvalidRecord {
        peer_id: peer_id.clone(),
        reason: format!("negative offense count {}", offense_count),
    })?;

    Ok(PeerReputationRecord {
        peer_id,
        offense_count,
        blacklisted,
    })
}

fn offense_count_column(record: &PeerReputationRecord) -> StoreResult<i32> {
    i32::try_from(record.offense_count).map_err(|_| StoreError::InvalidRecord {
        peer_id: record.peer_id.clone(),
        reason: format!("offense count {} exceeds column range", record.offense_count),
    })
}

#[async_trait]
impl ReputationStore for ReputationRepository {
    async fn get(&self, peer_id: &str) -> StoreResult<PeerReputationRecord> {
        sqlx::query(
            "INSERT INTO reputation.peers (peer_id) VALUES ($1) ON CONFLICT (peer_id) DO NOTHING",
        )
        .bind(peer_id)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(
            r#"
            SELECT peer_id, offense_count, blacklisted
            FROM reputation.peers
            WHERE peer_id = $1
        "#,
        )
        .bind(peer_id)
        .fetch_one(&self.pool)
        .await?;

        record_from_row(&row)
    }

    async fn set(&self, record: &PeerReputationRecord) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO reputation.peers (peer_id, offense_count, blacklisted, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (peer_id) DO UPDATE SET
                offense_count = EXCLUDED.offense_count,
                blacklisted = EXCLUDED.blacklisted,
                updated_at = EXCLUDED.updated_at
        "#,
        )
        .bind(&record.peer_id)
        .bind(offense_count_column(record)?)
        .bind(record.blacklisted)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn apply_offense(
        &self,
        peer_id: &str,
        slashing_threshold: u32,
    ) -> StoreResult<(PeerReputationRecord, bool)> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO reputation.peers (peer_id) VALUES ($1) ON CONFLICT (peer_id) DO NOTHING",
        )
        .bind(peer_id)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query(
            r#"
            SELECT peer_id, offense_count, blacklisted
            FROM reputation.peers
            WHERE peer_id = $1
            FOR UPDATE
        "#,
        )
        .bind(peer_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut record = record_from_row(&row)?;
        let newly_blacklisted = record.register_offense(slashing_threshold);

        sqlx::query(
            r#"
            UPDATE reputation.peers
            SET offense_count = $2, blacklisted = $3, updated_at = NOW()
            WHERE peer_id = $1
        "#,
        )
        .bind(peer_id)
        .bind(offense_count_column(&record)?)
        .bind(record.blacklisted)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            peer_id = %peer_id,
            offense_count = record.offense_count,
            blacklisted = record.blacklisted,
            "Persisted offense"
        );

        Ok((record, newly_blacklisted))
    }
}
