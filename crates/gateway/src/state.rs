use std::sync::Arc;

use dg_dialogue::KeywordRetriever;
use dg_domain::config::Config;
use dg_providers::ProviderRegistry;
use dg_sessions::{ConversationStore, PatientStore, TranscriptWriter};

/// Shared application state passed to all API handlers and CLI commands.
///
/// Fields are grouped by concern:
/// - **Core services**: config, LLM providers
/// - **Persistence**: conversation index, patient profiles, transcripts
/// - **Retrieval**: documents used to ground the psychologist
#[derive(Clone)]
pub struct AppState {
    // ── Core services ─────────────────────────────────────────────────
    pub config: Arc<Config>,
    pub llm: Arc<ProviderRegistry>,

    // ── Persistence ───────────────────────────────────────────────────
    pub conversations: Arc<ConversationStore>,
    pub patients: Arc<PatientStore>,
    pub transcripts: Arc<TranscriptWriter>,

    // ── Retrieval ─────────────────────────────────────────────────────
    pub documents: Arc<KeywordRetriever>,
}
