use anyhow::{Context, Result};
use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{Level, info, warn};
use tracing_subscriber::fmt::format::FmtSpan;

use silica_price_oracle::{
    ConsensusOrchestrator, DatabasePool, InMemoryReputationStore, OracleConfig, ReputationStore,
    api::{
        ConsensusApiState, ReputationApiState, create_consensus_router, create_reputation_router,
    },
    stake::{HttpStakeResolver, StakeResolver, StaticStakeResolver},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first - this validates all thresholds
    let config = OracleConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {:#}", e);
        eprintln!("Please check SILICA_* environment variables.");
        e
    })?;

    init_logging(&config)?;

    info!("Starting Silica price consensus oracle");
    info!(
        "Consensus thresholds: minimum_stake={}, slashing_threshold={}, outlier_z_limit={}",
        config.consensus.minimum_stake_threshold,
        config.consensus.slashing_threshold,
        config.consensus.outlier_z_score_limit
    );

    // Reputation store: PostgreSQL when enabled, otherwise in-memory
    let database = if config.database.postgres_enabled {
        let db = DatabasePool::new(
            &config.database.postgres_url,
            config.database.max_connections,
        )
        .await?;
        db.init_schema().await?;
        Some(db)
    } else {
        warn!("PostgreSQL disabled - reputation state will not survive restarts");
        None
    };

    let store: Arc<dyn ReputationStore> = match &database {
        Some(db) => db.reputation(),
        None => Arc::new(InMemoryReputationStore::new()),
    };

    let orchestrator = Arc::new(ConsensusOrchestrator::new(store, config.consensus));

    let stake_resolver: Arc<dyn StakeResolver> = match &config.stake.service_url {
        Some(url) => Arc::new(HttpStakeResolver::new(
            url,
            config.stake.token.clone(),
            config.stake.timeout(),
        )?),
        None => {
            warn!("No stake service configured - unresolved submissions carry zero stake");
            Arc::new(StaticStakeResolver::new())
        }
    };

    let app = Router::new()
        .nest(
            "/consensus",
            create_consensus_router(ConsensusApiState {
                orchestrator: orchestrator.clone(),
                stake_resolver,
                stake_window: config.stake.timeout(),
            }),
        )
        .nest(
            "/reputation",
            create_reputation_router(ReputationApiState {
                orchestrator: orchestrator.clone(),
            }),
        )
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http());

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    info!("Price oracle listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(db) = database {
        db.close().await;
    }

    info!("Price oracle stopped");
    Ok(())
}

fn init_logging(config: &OracleConfig) -> Result<()> {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(if config.logging.log_requests {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        })
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
