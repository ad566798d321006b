use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use crate::state::AppState;

use super::api_error;

#[derive(Debug, Deserialize)]
pub struct AddDocumentRequest {
    pub name: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    /// Restrict the search to these documents. Empty searches all.
    #[serde(default)]
    pub documents: Vec<String>,
    #[serde(default)]
    pub k: Option<usize>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/documents
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Index a document. Re-posting a name replaces its chunks.
pub async fn add_document(
    State(state): State<AppState>,
    Json(body): Json<AddDocumentRequest>,
) -> Response {
    let name = body.name.trim();
    if name.is_empty() {
        return api_error(StatusCode::BAD_REQUEST, "document name must not be empty");
    }
    if body.text.trim().is_empty() {
        return api_error(StatusCode::BAD_REQUEST, "document text must not be empty");
    }
    let chunks = state.documents.add_document(name, &body.text);
    tracing::info!(document = %name, chunks, "document indexed");
    (
        StatusCode::CREATED,
        Json(serde_json::json!({ "name": name, "chunks": chunks })),
    )
        .into_response()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /v1/documents
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn list_documents(State(state): State<AppState>) -> impl IntoResponse {
    let documents = state.documents.documents();
    let count = documents.len();
    Json(serde_json::json!({
        "documents": documents,
        "count": count,
    }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DELETE /v1/documents/:name
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn delete_document(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    if state.documents.remove(&name) {
        Json(serde_json::json!({ "deleted": true, "name": name })).into_response()
    } else {
        api_error(StatusCode::NOT_FOUND, format!("document {name} not found"))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/documents/query
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn query_documents(
    State(state): State<AppState>,
    Json(body): Json<QueryRequest>,
) -> Response {
    if body.query.trim().is_empty() {
        return api_error(StatusCode::BAD_REQUEST, "query must not be empty");
    }
    let k = body.k.unwrap_or(state.config.simulation.retrieval_k);
    let chunks = state.documents.search(&body.query, &body.documents, k);
    Json(serde_json::json!({
        "chunks": chunks,
        "count": chunks.len(),
    }))
    .into_response()
}
