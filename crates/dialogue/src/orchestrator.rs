//! Dual-agent turn orchestrator.
//!
//! Drives `turn_count` rounds of patient reply then psychologist reply,
//! starting from a fixed psychologist seed. Each call goes through the
//! history builder, the prompt adapter, the model gateway and the
//! normalizer, in that order, and appends exactly one turn on success.
//!
//! A failed or cancelled call never appends anything, so the transcript
//! returned on failure always ends on a complete turn.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::Instrument;

use dg_contextpack::HistoryBuilder;
use dg_domain::message::Message;
use dg_domain::trace::TraceEvent;
use dg_domain::turn::{Speaker, Turn};
use dg_domain::{ConversationConfig, Error, Result};
use dg_providers::{ChatRequest, LlmProvider};

use crate::cancel::CancelToken;
use crate::normalizer::{self, Normalized};
use crate::prompt_adapter;
use crate::retrieval::Retriever;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Run state
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Idle,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Idle => "idle",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled
        )
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where and why a run stopped early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunFailure {
    pub round: u32,
    pub speaker: Speaker,
    pub model: String,
    pub message: String,
}

/// Transcript plus how the run ended. On `Failed`/`Cancelled` the
/// transcript is partial but never ends on a half-taken turn.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub turns: Vec<Turn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<RunFailure>,
}

impl RunOutcome {
    /// Seed plus patient and psychologist turns, without directives.
    pub fn content_turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter().filter(|t| !t.is_directive())
    }

    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Completed
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Orchestrator
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One instance per conversation.
pub struct DialogueOrchestrator {
    conversation_id: String,
    provider: Arc<dyn LlmProvider>,
    retriever: Option<Arc<dyn Retriever>>,
    cancel: CancelToken,
    status: RunStatus,
}

/// Why one call did not produce a turn.
enum Halt {
    Cancelled,
    Failed(Error),
}

impl DialogueOrchestrator {
    pub fn new(conversation_id: impl Into<String>, provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            provider,
            retriever: None,
            cancel: CancelToken::new(),
            status: RunStatus::Idle,
        }
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Run the whole conversation.
    ///
    /// `Err` is returned only for an invalid `config`, before any model call.
    /// Gateway failures and cancellation come back as `Ok` with the partial
    /// transcript and a non-`Completed` status.
    pub async fn run(&mut self, config: &ConversationConfig) -> Result<RunOutcome> {
        config.validate()?;

        let span = tracing::info_span!(
            "dialogue_run",
            conversation_id = %self.conversation_id,
            patient_model = %config.patient_model,
            psychologist_model = %config.psychologist_model,
            turn_count = config.turn_count,
        );
        self.status = RunStatus::Running;
        let started = Instant::now();
        let outcome = self.run_rounds(config).instrument(span).await;
        self.status = outcome.status;

        TraceEvent::RunFinished {
            conversation_id: self.conversation_id.clone(),
            status: outcome.status.to_string(),
            turns: outcome.turns.len(),
            duration_ms: started.elapsed().as_millis() as u64,
        }
        .emit();
        Ok(outcome)
    }

    async fn run_rounds(&self, config: &ConversationConfig) -> RunOutcome {
        let mut turns = vec![Turn::utterance(
            0,
            Speaker::Psychologist,
            config.seed.clone(),
            None,
        )];
        tracing::debug!("seed turn placed");

        for round in 1..=config.turn_count {
            self.inject_directives(config, round, &mut turns);

            for speaker in [Speaker::Patient, Speaker::Psychologist] {
                match self.take_turn(config, speaker, &turns).await {
                    Ok(normalized) => self.append(&mut turns, speaker, normalized),
                    Err(Halt::Cancelled) => {
                        tracing::info!(round, %speaker, "run cancelled");
                        return RunOutcome {
                            status: RunStatus::Cancelled,
                            turns,
                            failure: None,
                        };
                    }
                    Err(Halt::Failed(e)) => {
                        tracing::warn!(round, %speaker, error = %e, "model call failed, ending run");
                        return RunOutcome {
                            status: RunStatus::Failed,
                            turns,
                            failure: Some(RunFailure {
                                round,
                                speaker,
                                model: config.model_for(speaker).to_string(),
                                message: e.to_string(),
                            }),
                        };
                    }
                }
            }
        }

        RunOutcome {
            status: RunStatus::Completed,
            turns,
            failure: None,
        }
    }

    fn inject_directives(&self, config: &ConversationConfig, round: u32, turns: &mut Vec<Turn>) {
        for ep in config.episodes.iter().filter(|e| e.before_round == round) {
            let seq = next_sequence(turns);
            turns.push(Turn::directive(seq, ep.kind, ep.audience, ep.content.clone()));
            TraceEvent::DirectiveInjected {
                conversation_id: self.conversation_id.clone(),
                round,
                kind: format!("{:?}", ep.kind).to_lowercase(),
                audience: ep.audience.to_string(),
            }
            .emit();
        }
    }

    /// One gateway call for `speaker`, answering the latest turn of its
    /// counterpart.
    async fn take_turn(
        &self,
        config: &ConversationConfig,
        speaker: Speaker,
        turns: &[Turn],
    ) -> std::result::Result<Normalized, Halt> {
        if self.cancel.is_cancelled() {
            return Err(Halt::Cancelled);
        }

        let counterpart = speaker.counterpart().unwrap_or(Speaker::Psychologist);
        let answered = turns
            .iter()
            .rposition(|t| t.speaker == counterpart)
            .ok_or_else(|| Halt::Failed(Error::Other(format!("no {counterpart} turn to answer"))))?;
        let interlocutor = turns[answered].text.as_str();
        let history: Vec<Turn> = turns
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != answered)
            .map(|(_, t)| t.clone())
            .collect();

        let pack = HistoryBuilder::new(config.history_window).build(&history, speaker, interlocutor);
        pack.report.to_trace_event().emit();

        let mut base_prompt = config.prompt_for(speaker).to_string();
        if speaker == Speaker::Psychologist {
            if let Some(material) = self.reference_material(config, interlocutor).await {
                base_prompt.push_str(&material);
            }
        }
        let model = config.model_for(speaker);
        let system = prompt_adapter::adapt(&base_prompt, model);

        let mut messages = Vec::with_capacity(pack.directives.len() + pack.window.len() + 2);
        messages.push(Message::system(system));
        messages.extend(pack.into_messages());

        let request = ChatRequest::new(model, messages, config.sampling_for(speaker));
        let started = Instant::now();
        let result = self.provider.chat(&request).await;
        TraceEvent::LlmRequest {
            provider: self.provider.provider_id().to_string(),
            model: model.to_string(),
            role: speaker.to_string(),
            duration_ms: started.elapsed().as_millis() as u64,
            ok: result.is_ok(),
        }
        .emit();

        let response = result.map_err(|e| Halt::Failed(e.into_model_call(model)))?;
        let normalized = normalizer::normalize(&response.content);
        tracing::debug!(
            %speaker,
            dialect = ?normalized.dialect,
            reasoning_only = normalized.is_reasoning_only(),
            "response normalized"
        );
        Ok(normalized)
    }

    /// Top-k chunks for the patient's latest message, formatted for the
    /// psychologist's system prompt. `None` when nothing should be added.
    async fn reference_material(&self, config: &ConversationConfig, query: &str) -> Option<String> {
        if config.rag_documents.is_empty() || config.retrieval_k == 0 {
            return None;
        }
        let retriever = self.retriever.as_ref()?;
        match retriever
            .retrieve(query, &config.rag_documents, config.retrieval_k)
            .await
        {
            Ok(chunks) if !chunks.is_empty() => Some(format_reference_material(&chunks)),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "retrieval failed, continuing without reference material");
                None
            }
        }
    }

    fn append(&self, turns: &mut Vec<Turn>, speaker: Speaker, normalized: Normalized) {
        let seq = next_sequence(turns);
        let turn = Turn::utterance(seq, speaker, normalized.visible, normalized.thought);
        TraceEvent::TurnAppended {
            conversation_id: self.conversation_id.clone(),
            sequence: seq,
            speaker: speaker.to_string(),
            visible_chars: turn.text.chars().count(),
            has_thought: turn.thought.is_some(),
        }
        .emit();
        turns.push(turn);
    }
}

fn next_sequence(turns: &[Turn]) -> u64 {
    turns.last().map(|t| t.sequence + 1).unwrap_or(0)
}

fn format_reference_material(chunks: &[String]) -> String {
    format!(
        "\n\n[MATERIAL DE REFERENCIA - usalo solo si es pertinente, sin citarlo textualmente]\n{}\n[FIN DEL MATERIAL]",
        chunks.join("\n---\n")
    )
}
