use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use dg_dialogue::{AnalysisChat, AnalysisExchange, AnalysisTranscript};
use dg_domain::{Error, SamplingParams};

use crate::state::AppState;

use super::error_response;

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub question: String,
    /// Stored conversations to analyse.
    pub conversation_ids: Vec<String>,
    /// Analyst model; the configured psychologist model when unset.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub history: Vec<AnalysisExchange>,
    #[serde(default)]
    pub sampling: Option<SamplingParams>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /v1/analysis/chat
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn chat(State(state): State<AppState>, Json(req): Json<AnalysisRequest>) -> Response {
    match ask(&state, &req).await {
        Ok(answer) => Json(answer).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn ask(state: &AppState, req: &AnalysisRequest) -> dg_domain::Result<dg_dialogue::AnalysisAnswer> {
    let transcripts = load_transcripts(state, &req.conversation_ids).await?;
    let provider = state.llm.resolve(req.provider.as_deref())?;
    let model = req
        .model
        .clone()
        .unwrap_or_else(|| state.config.simulation.psychologist_model.clone());

    let mut chat = AnalysisChat::new(provider);
    if let Some(sampling) = req.sampling {
        chat = chat.with_sampling(sampling);
    }
    chat.ask(&model, &req.question, &transcripts, &req.history)
        .await
}

/// Pair each index entry with its stored turns. Unknown ids are a 404.
pub(crate) async fn load_transcripts(
    state: &AppState,
    ids: &[String],
) -> dg_domain::Result<Vec<AnalysisTranscript>> {
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        let entry = state
            .conversations
            .get(id)
            .ok_or_else(|| Error::NotFound(format!("conversation {id}")))?;
        let turns = state
            .transcripts
            .read_async(id)
            .await?
            .into_iter()
            .map(|l| l.turn)
            .collect();
        out.push(AnalysisTranscript {
            id: entry.id,
            date: entry.created_at.format("%Y-%m-%d %H:%M").to_string(),
            patient_name: entry.patient_name,
            turns,
        });
    }
    Ok(out)
}
