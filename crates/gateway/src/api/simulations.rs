use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};

use crate::simulation::{self, SimulationRequest};
use crate::state::AppState;

use super::error_response;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/simulations
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Run one conversation to completion and persist it. A run that failed
/// mid-way still answers 200 with `status: "failed"` and the partial turns.
pub async fn run_simulation(
    State(state): State<AppState>,
    Json(req): Json<SimulationRequest>,
) -> Response {
    match simulation::run_and_persist(&state, &req).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => error_response(&e),
    }
}
