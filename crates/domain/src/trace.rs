use serde::Serialize;

/// Structured trace events emitted across all dialoga crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    ContextBuilt {
        viewer: String,
        history_turns: usize,
        window_turns: usize,
        dropped_turns: usize,
        preserved_directives: usize,
        suppressed_episodes: usize,
        suffix_attached: bool,
        total_chars: usize,
    },
    LlmRequest {
        provider: String,
        model: String,
        role: String,
        duration_ms: u64,
        ok: bool,
    },
    TurnAppended {
        conversation_id: String,
        sequence: u64,
        speaker: String,
        visible_chars: usize,
        has_thought: bool,
    },
    DirectiveInjected {
        conversation_id: String,
        round: u32,
        kind: String,
        audience: String,
    },
    RunFinished {
        conversation_id: String,
        status: String,
        turns: usize,
        duration_ms: u64,
    },
    TranscriptAppend {
        conversation_id: String,
        lines: usize,
    },
    ConversationSaved {
        conversation_id: String,
        patient_id: String,
        turn_count: usize,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "dg_event");
    }
}
