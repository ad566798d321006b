pub mod analysis;
pub mod conversations;
pub mod documents;
pub mod health;
pub mod models;
pub mod patients;
pub mod simulations;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;

use dg_domain::Error;

use crate::state::AppState;

/// Build the full API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/health", get(health::health))
        // Models exposed by the gateway
        .route("/v1/models", get(models::list_models))
        // Patient profiles
        .route("/v1/patients", get(patients::list_patients))
        .route(
            "/v1/patients/:id",
            get(patients::get_patient).put(patients::put_patient),
        )
        // Simulations
        .route("/v1/simulations", post(simulations::run_simulation))
        // Stored conversations
        .route("/v1/conversations", get(conversations::list_conversations))
        .route("/v1/conversations/stats", get(conversations::stats))
        .route(
            "/v1/conversations/:id",
            get(conversations::get_conversation)
                .patch(conversations::rename_conversation)
                .delete(conversations::delete_conversation),
        )
        // Retrieval documents
        .route(
            "/v1/documents",
            get(documents::list_documents).post(documents::add_document),
        )
        .route("/v1/documents/query", post(documents::query_documents))
        .route("/v1/documents/:name", axum::routing::delete(documents::delete_document))
        // Post-hoc analysis
        .route("/v1/analysis/chat", post(analysis::chat))
}

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// Map a domain error onto an HTTP status.
pub(crate) fn error_response(err: &Error) -> Response {
    let status = match err {
        Error::Configuration(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::ModelCall { .. } | Error::Http(_) | Error::Timeout(_) | Error::Auth(_) => {
            StatusCode::BAD_GATEWAY
        }
        Error::Io(_) | Error::Json(_) | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::warn!(error = %err, status = status.as_u16(), "request failed");
    }
    api_error(status, err.to_string())
}
