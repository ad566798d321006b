use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use crate::state::AppState;

use super::error_response;

#[derive(Debug, Deserialize)]
pub struct ModelsQuery {
    #[serde(default)]
    pub provider: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/models
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Models the provider currently serves. When the server cannot be asked,
/// the two configured default models are returned instead.
pub async fn list_models(
    State(state): State<AppState>,
    Query(q): Query<ModelsQuery>,
) -> Response {
    let provider = match state.llm.resolve(q.provider.as_deref()) {
        Ok(p) => p,
        Err(e) => return error_response(&e),
    };

    let (models, source) = match provider.list_models().await {
        Ok(models) if !models.is_empty() => (models, "provider"),
        Ok(_) => (fallback_models(&state), "fallback"),
        Err(e) => {
            tracing::warn!(provider = provider.provider_id(), error = %e, "listing models failed, using configured defaults");
            (fallback_models(&state), "fallback")
        }
    };

    Json(serde_json::json!({
        "provider": provider.provider_id(),
        "source": source,
        "models": models,
    }))
    .into_response()
}

pub(crate) fn fallback_models(state: &AppState) -> Vec<String> {
    let sim = &state.config.simulation;
    let mut models = vec![sim.patient_model.clone()];
    if sim.psychologist_model != sim.patient_model {
        models.push(sim.psychologist_model.clone());
    }
    models
}
