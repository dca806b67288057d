//! Reputation API Endpoints
//!
//! Read-only status queries for peers and the active consensus thresholds.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use std::sync::Arc;
use tracing::error;

use crate::config::ConsensusConfig;
use crate::consensus::ConsensusOrchestrator;
use crate::reputation::ReputationStatus;

/// API state for reputation endpoints
#[derive(Clone)]
pub struct ReputationApiState {
    pub orchestrator: Arc<ConsensusOrchestrator>,
}

/// GET /reputation/peers/{peer_id} - Get a peer's offense count and blacklist flag
pub async fn get_reputation(
    State(state): State<ReputationApiState>,
    Path(peer_id): Path<String>,
) -> Result<Json<ReputationStatus>, (StatusCode, String)> {
    state
        .orchestrator
        .get_reputation(&peer_id)
        .await
        .map(Json)
        .map_err(|e| {
            error!(peer_id = %peer_id, error = %e, "Reputation lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })
}

/// GET /reputation/thresholds - Get current consensus thresholds
pub async fn get_thresholds(State(state): State<ReputationApiState>) -> Json<ConsensusConfig> {
    Json(*state.orchestrator.config())
}

pub fn create_reputation_router(state: ReputationApiState) -> Router {
    Router::new()
        .route("/thresholds", get(get_thresholds))
        .route("/peers/{peer_id}", get(get_reputation))
        .with_state(state)
}
