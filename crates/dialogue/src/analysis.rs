//! Post-hoc analysis chat over stored transcripts.
//!
//! An analyst model receives the selected conversations as plain text and
//! answers free-form questions about them. Prior exchanges are replayed so
//! follow-up questions keep their context.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use dg_domain::message::Message;
use dg_domain::turn::Turn;
use dg_domain::{Error, Result, SamplingParams};
use dg_providers::{ChatRequest, LlmProvider};

use crate::normalizer;

const ANALYST_PROMPT: &str = "\
Sos un analista experto en psicología conductual y adherencia a la medicación \
en pacientes trasplantados. Vas a recibir transcripciones de conversaciones \
simuladas entre un psicólogo (modelo COM-B) y distintos pacientes.
Respondé las preguntas del usuario basándote SOLO en esas transcripciones. \
Citá la interacción correspondiente cuando sea útil y decí explícitamente \
cuando algo no surge del material.";

/// One stored conversation, as the analyst sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisTranscript {
    pub id: String,
    /// Creation date, already formatted.
    pub date: String,
    pub patient_name: String,
    pub turns: Vec<Turn>,
}

/// A previous question and the analyst's answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisExchange {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisAnswer {
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
}

/// Render transcripts as `--- Interaction: ... ---` blocks of
/// `SPEAKER: text` lines. Thoughts and directives are left out.
pub fn format_for_analysis(transcripts: &[AnalysisTranscript]) -> String {
    let mut out = String::new();
    for t in transcripts {
        out.push_str(&format!(
            "\n--- Interaction: {} ({}, Patient: {}) ---\n",
            t.id, t.date, t.patient_name
        ));
        for turn in t.turns.iter().filter(|turn| !turn.is_directive()) {
            out.push_str(turn.speaker.label());
            out.push_str(": ");
            out.push_str(&turn.text);
            out.push('\n');
        }
    }
    out
}

pub struct AnalysisChat {
    provider: Arc<dyn LlmProvider>,
    sampling: SamplingParams,
}

impl AnalysisChat {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            sampling: SamplingParams::default(),
        }
    }

    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    pub async fn ask(
        &self,
        model: &str,
        question: &str,
        transcripts: &[AnalysisTranscript],
        prior: &[AnalysisExchange],
    ) -> Result<AnalysisAnswer> {
        if model.trim().is_empty() {
            return Err(Error::Configuration("analysis model must not be empty".into()));
        }
        if question.trim().is_empty() {
            return Err(Error::Configuration("question must not be empty".into()));
        }
        if transcripts.is_empty() {
            return Err(Error::Configuration("no conversations selected".into()));
        }
        self.sampling.validate("analysis_sampling")?;

        let messages = build_messages(question, transcripts, prior);
        let request = ChatRequest::new(model, messages, self.sampling);
        let response = self
            .provider
            .chat(&request)
            .await
            .map_err(|e| e.into_model_call(model))?;

        let normalized = normalizer::normalize(&response.content);
        tracing::debug!(
            model,
            transcripts = transcripts.len(),
            prior = prior.len(),
            "analysis answered"
        );
        Ok(AnalysisAnswer {
            answer: normalized.visible,
            thought: normalized.thought,
        })
    }
}

fn build_messages(
    question: &str,
    transcripts: &[AnalysisTranscript],
    prior: &[AnalysisExchange],
) -> Vec<Message> {
    let system = format!(
        "{ANALYST_PROMPT}\n\n[TRANSCRIPCIONES]{}[FIN DE LAS TRANSCRIPCIONES]",
        format_for_analysis(transcripts)
    );
    let mut messages = vec![Message::system(system)];
    for ex in prior {
        messages.push(Message::user(ex.question.clone()));
        messages.push(Message::assistant(ex.answer.clone()));
    }
    messages.push(Message::user(question));
    messages
}
