//! Consensus API Endpoints
//!
//! Entry points for the message-handling layer. Balances are resolved
//! before the round starts; the round itself never waits on the network.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

use crate::consensus::{ConsensusOrchestrator, ConsensusResult, RawSubmission, Submission};
use crate::error::ConsensusError;
use crate::stake::{StakeResolver, resolve_submissions};

/// API state for consensus endpoints
#[derive(Clone)]
pub struct ConsensusApiState {
    pub orchestrator: Arc<ConsensusOrchestrator>,
    pub stake_resolver: Arc<dyn StakeResolver>,
    pub stake_window: Duration,
}

#[derive(Debug, Deserialize)]
pub struct RoundRequest {
    pub submissions: Vec<RawSubmission>,
}

#[derive(Debug, Deserialize)]
pub struct ResolvedRoundRequest {
    pub submissions: Vec<Submission>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

/// Wrapper mapping round failures onto HTTP responses
#[derive(Debug)]
pub struct RoundError(pub ConsensusError);

impl IntoResponse for RoundError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            ConsensusError::NoQualifiedResponses
            | ConsensusError::NoResponsesPassedOutlierFilter => StatusCode::UNPROCESSABLE_ENTITY,
            ConsensusError::Store(ref e) => {
                error!(error = %e, "Consensus round failed on reputation store");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorResponse {
            code: self.0.code(),
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// POST /consensus/round - Resolve stake balances, then run a round
pub async fn submit_round(
    State(state): State<ConsensusApiState>,
    Json(request): Json<RoundRequest>,
) -> Result<Json<ConsensusResult>, RoundError> {
    debug!(submissions = request.submissions.len(), "Resolving stake for round");

    let submissions = resolve_submissions(
        state.stake_resolver.as_ref(),
        request.submissions,
        state.stake_window,
    )
    .await;

    state
        .orchestrator
        .process_round(&submissions)
        .await
        .map(Json)
        .map_err(RoundError)
}

/// POST /consensus/round/resolved - Run a round on already-resolved balances
pub async fn submit_resolved_round(
    State(state): State<ConsensusApiState>,
    Json(request): Json<ResolvedRoundRequest>,
) -> Result<Json<ConsensusResult>, RoundError> {
    state
        .orchestrator
        .process_round(&request.submissions)
        .await
        .map(Json)
        .map_err(RoundError)
}

pub fn create_consensus_router(state: ConsensusApiState) -> Router {
    Router::new()
        .route("/round", post(submit_round))
        .route("/round/resolved", post(submit_resolved_round))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConsensusConfig;
    use crate::reputation::InMemoryReputationStore;
    use crate::stake::StaticStakeResolver;

    fn state(resolver: StaticStakeResolver) -> ConsensusApiState {
        let store = Arc::new(InMemoryReputationStore::new());
        ConsensusApiState {
            orchestrator: Arc::new(ConsensusOrchestrator::new(
                store,
                ConsensusConfig::default(),
            )),
            stake_resolver: Arc::new(resolver),
            stake_window: Duration::from_secs(2),
        }
    }

    fn raw(peer_id: &str, price: f64) -> RawSubmission {
        RawSubmission {
            peer_id: peer_id.to_string(),
            price,
        }
    }

    #[tokio::test]
    async fn test_round_with_resolved_stake() {
        let resolver = StaticStakeResolver::new()
            .with_balance("peer_a", 400.0)
            .with_balance("peer_b", 400.0);

        let Json(result) = submit_round(
            State(state(resolver)),
            Json(RoundRequest {
                submissions: vec![raw("peer_a", 10.0), raw("peer_b", 10.0), raw("peer_c", 99.0)],
            }),
        )
        .await
        .unwrap();

        // peer_c has no known stake and is filtered before statistics
        assert_eq!(result.participants, 2);
        assert_eq!(result.final_price, 10.0);
        assert_eq!(result.total_weight, 40.0);
    }

    #[tokio::test]
    async fn test_unresolvable_stake_maps_to_422() {
        let err = submit_round(
            State(state(StaticStakeResolver::new())),
            Json(RoundRequest {
                submissions: vec![raw("peer_a", 10.0)],
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.0, ConsensusError::NoQualifiedResponses);
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_resolved_round() {
        let Json(result) = submit_resolved_round(
            State(state(StaticStakeResolver::new())),
            Json(ResolvedRoundRequest {
                submissions: vec![Submission::new("peer_a", 7.0, 900.0)],
            }),
        )
        .await
        .unwrap();

        assert_eq!(result.final_price, 7.0);
        assert_eq!(result.total_weight, 30.0);
    }
}
