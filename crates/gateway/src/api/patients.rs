use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use dg_domain::PersonaProfile;

use crate::state::AppState;

use super::{api_error, error_response};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/patients
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn list_patients(State(state): State<AppState>) -> impl IntoResponse {
    let patients = state.patients.list();
    let count = patients.len();
    Json(serde_json::json!({
        "patients": patients,
        "count": count,
    }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/patients/:id
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn get_patient(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.patients.get(&id) {
        Some(record) => {
            let conversations = state.conversations.by_patient(&id).len();
            Json(serde_json::json!({
                "patient": record,
                "conversations": conversations,
            }))
            .into_response()
        }
        None => api_error(StatusCode::NOT_FOUND, format!("patient {id} not found")),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PUT /v1/patients/:id
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Create or replace a profile. The path id wins over any id in the body.
pub async fn put_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut profile): Json<PersonaProfile>,
) -> Response {
    profile.id = id;
    let record = match state.patients.upsert(profile) {
        Ok(r) => r,
        Err(e) => return error_response(&e),
    };
    if let Err(e) = state.patients.flush() {
        return error_response(&e);
    }
    Json(record).into_response()
}
