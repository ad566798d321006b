use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use crate::state::AppState;

use super::{api_error, error_response};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub patient_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub title: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/conversations
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn list_conversations(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> impl IntoResponse {
    let conversations = match q.patient_id.as_deref() {
        Some(pid) => state.conversations.by_patient(pid),
        None => state.conversations.list(),
    };
    let count = conversations.len();
    Json(serde_json::json!({
        "conversations": conversations,
        "count": count,
    }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/conversations/stats
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.conversations.stats())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/conversations/:id
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Index entry plus the stored transcript.
pub async fn get_conversation(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(entry) = state.conversations.get(&id) else {
        return api_error(StatusCode::NOT_FOUND, format!("conversation {id} not found"));
    };
    match state.transcripts.read_async(&id).await {
        Ok(lines) => Json(serde_json::json!({
            "conversation": entry,
            "transcript": lines,
        }))
        .into_response(),
        Err(e) => error_response(&e),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PATCH /v1/conversations/:id
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn rename_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RenameRequest>,
) -> Response {
    let entry = match state.conversations.set_title(&id, &body.title) {
        Ok(e) => e,
        Err(e) => return error_response(&e),
    };
    if let Err(e) = state.conversations.flush() {
        return error_response(&e);
    }
    Json(entry).into_response()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DELETE /v1/conversations/:id
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Drops the index entry and the transcript file.
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    if state.conversations.delete(&id).is_none() {
        return api_error(StatusCode::NOT_FOUND, format!("conversation {id} not found"));
    }
    if let Err(e) = state.transcripts.delete(&id) {
        tracing::warn!(conversation_id = %id, error = %e, "transcript removal failed");
    }
    if let Err(e) = state.conversations.flush() {
        return error_response(&e);
    }
    tracing::info!(conversation_id = %id, "conversation deleted");
    Json(serde_json::json!({ "deleted": true, "id": id })).into_response()
}
