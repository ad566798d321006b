//! Simulation service shared by `dialoga simulate` and `POST /v1/simulations`.
//!
//! Resolves a request into a [`ConversationConfig`], runs the orchestrator
//! and persists the transcript plus its index entry.

use serde::{Deserialize, Serialize};

use dg_dialogue::{DialogueOrchestrator, RunFailure, RunStatus};
use dg_domain::persona::{self, PersonaProfile};
use dg_domain::turn::{ScheduledDirective, Turn};
use dg_domain::{ConversationConfig, Error, Result, SamplingParams};
use dg_sessions::{ConversationStore, NewConversation};

use crate::state::AppState;

/// A simulation request. Anything left unset falls back to the patient
/// profile and the `[simulation]` config section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimulationRequest {
    /// Stored patient profile to simulate.
    #[serde(default)]
    pub patient_id: Option<String>,
    /// Explicit patient instruction; required when `patient_id` is unset.
    #[serde(default)]
    pub patient_prompt: Option<String>,
    /// Display name for an explicit-prompt patient.
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub psychologist_prompt: Option<String>,
    #[serde(default)]
    pub patient_model: Option<String>,
    #[serde(default)]
    pub psychologist_model: Option<String>,
    #[serde(default)]
    pub patient_sampling: Option<SamplingParams>,
    #[serde(default)]
    pub psychologist_sampling: Option<SamplingParams>,
    #[serde(default)]
    pub turn_count: Option<u32>,
    #[serde(default)]
    pub seed: Option<String>,
    #[serde(default)]
    pub history_window: Option<usize>,
    #[serde(default)]
    pub episodes: Vec<ScheduledDirective>,
    /// Shorthand for "a day has passed" episodes before these rounds.
    #[serde(default)]
    pub new_day_at: Vec<u32>,
    #[serde(default)]
    pub rag_documents: Vec<String>,
    /// Provider id from `[[llm.providers]]`; the default one when unset.
    #[serde(default)]
    pub provider: Option<String>,
}

/// What the caller gets back: the persisted id plus the run outcome.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub conversation_id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<RunFailure>,
    pub turns: Vec<Turn>,
}

/// Patient identity resolved from a request.
#[derive(Debug, Clone)]
pub struct ResolvedPatient {
    pub id: String,
    pub name: String,
}

const CUSTOM_PATIENT_ID: &str = "custom";

/// Build the conversation settings for `req`. Configuration problems
/// surface as [`Error::Configuration`], unknown patients as
/// [`Error::NotFound`].
pub fn resolve(state: &AppState, req: &SimulationRequest) -> Result<(ConversationConfig, ResolvedPatient)> {
    let defaults = &state.config.simulation;

    let (mut cfg, patient) = match req.patient_id.as_deref() {
        Some(id) => {
            let record = state
                .patients
                .get(id)
                .ok_or_else(|| Error::NotFound(format!("patient {id}")))?;
            let cfg = defaults.conversation_for(&record.profile);
            let patient = ResolvedPatient {
                id: record.profile.id.clone(),
                name: record.profile.name.clone(),
            };
            (cfg, patient)
        }
        None => {
            let prompt = req.patient_prompt.clone().ok_or_else(|| {
                Error::Configuration("either patient_id or patient_prompt is required".into())
            })?;
            let name = req
                .patient_name
                .clone()
                .unwrap_or_else(|| "Paciente".into());
            let profile = PersonaProfile {
                id: CUSTOM_PATIENT_ID.into(),
                name: name.clone(),
                age: 0,
                transplant: String::new(),
                medication: String::new(),
                prior_adherence: String::new(),
                context: String::new(),
                education: String::new(),
                communication_style: String::new(),
                strengths: String::new(),
                difficulties: String::new(),
                team_notes: String::new(),
                idiosyncrasy: String::new(),
                preferred_patient_model: None,
            };
            let mut cfg = defaults.conversation_for(&profile);
            cfg.patient_prompt = prompt;
            cfg.seed = persona::opening_message(&profile);
            let patient = ResolvedPatient {
                id: CUSTOM_PATIENT_ID.into(),
                name,
            };
            (cfg, patient)
        }
    };

    if let Some(p) = &req.psychologist_prompt {
        cfg.psychologist_prompt = p.clone();
    }
    if let Some(m) = &req.patient_model {
        cfg.patient_model = m.clone();
    }
    if let Some(m) = &req.psychologist_model {
        cfg.psychologist_model = m.clone();
    }
    if let Some(s) = req.patient_sampling {
        cfg.patient_sampling = s;
    }
    if let Some(s) = req.psychologist_sampling {
        cfg.psychologist_sampling = s;
    }
    if let Some(n) = req.turn_count {
        cfg.turn_count = n;
    }
    if let Some(seed) = &req.seed {
        cfg.seed = seed.clone();
    }
    if let Some(w) = req.history_window {
        cfg.history_window = w;
    }
    cfg.episodes = req.episodes.clone();
    cfg.episodes
        .extend(req.new_day_at.iter().map(|r| ScheduledDirective::new_day(*r)));
    cfg.episodes.sort_by_key(|e| e.before_round);
    cfg.rag_documents = req.rag_documents.clone();

    cfg.validate()?;
    Ok((cfg, patient))
}

/// Resolve, run and persist one simulation.
///
/// `Err` means nothing ran (bad request or no provider). A gateway failure
/// mid-run is reported through `status`/`failure` and the partial
/// transcript is still stored.
pub async fn run_and_persist(state: &AppState, req: &SimulationRequest) -> Result<SimulationReport> {
    let (cfg, patient) = resolve(state, req)?;
    let provider = state.llm.resolve(req.provider.as_deref())?;

    let conversation_id = ConversationStore::mint_id();
    let mut orchestrator = DialogueOrchestrator::new(conversation_id.clone(), provider)
        .with_retriever(state.documents.clone());
    let outcome = orchestrator.run(&cfg).await?;

    state
        .transcripts
        .append_async(&conversation_id, &outcome.turns)
        .await?;
    state.conversations.create(NewConversation {
        id: Some(conversation_id.clone()),
        patient_id: patient.id.clone(),
        patient_name: patient.name.clone(),
        patient_model: cfg.patient_model.clone(),
        psychologist_model: cfg.psychologist_model.clone(),
        status: outcome.status.to_string(),
        failure: outcome.failure.as_ref().map(|f| f.message.clone()),
        turn_count: outcome.turns.len(),
        rag_documents: cfg.rag_documents.clone(),
    });
    state.conversations.flush()?;
    if patient.id != CUSTOM_PATIENT_ID {
        state
            .patients
            .set_last_conversation(&patient.id, &conversation_id)?;
        state.patients.flush()?;
    }

    tracing::info!(
        conversation_id = %conversation_id,
        patient_id = %patient.id,
        status = %outcome.status,
        turns = outcome.turns.len(),
        "simulation stored"
    );

    Ok(SimulationReport {
        conversation_id,
        patient_id: patient.id,
        patient_name: patient.name,
        status: outcome.status,
        failure: outcome.failure,
        turns: outcome.turns,
    })
}
