//! AppState construction shared by `serve` and the one-shot CLI commands.

use std::sync::Arc;

use anyhow::Context;

use dg_dialogue::KeywordRetriever;
use dg_domain::config::{Config, ConfigSeverity};
use dg_providers::ProviderRegistry;
use dg_sessions::{ConversationStore, PatientStore, TranscriptWriter};

use crate::state::AppState;

/// Validate config, open every store and return a fully-wired [`AppState`].
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let errors = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if errors > 0 {
        anyhow::bail!("config validation failed with {errors} error(s)");
    }

    // ── LLM providers ────────────────────────────────────────────────
    let llm = Arc::new(
        ProviderRegistry::from_config(&config.llm).context("initializing LLM providers")?,
    );
    if llm.is_empty() {
        tracing::warn!("no LLM providers initialized, simulations will fail until one is configured");
    } else {
        tracing::info!(providers = llm.len(), "LLM provider registry ready");
    }

    // ── Persistence ──────────────────────────────────────────────────
    let state_path = &config.storage.state_path;
    let conversations = Arc::new(
        ConversationStore::new(state_path).context("initializing conversation store")?,
    );
    let patients =
        Arc::new(PatientStore::new(state_path).context("initializing patient store")?);
    let transcripts = Arc::new(
        TranscriptWriter::new(&config.storage.transcripts_dir())
            .context("initializing transcript directory")?,
    );
    tracing::info!(path = %state_path.display(), "persistence ready");

    // ── Retrieval ────────────────────────────────────────────────────
    let documents = Arc::new(KeywordRetriever::new());

    Ok(AppState {
        config,
        llm,
        conversations,
        patients,
        transcripts,
        documents,
    })
}

/// Flush every store that buffers writes in memory.
pub fn flush_stores(state: &AppState) {
    if let Err(e) = state.conversations.flush() {
        tracing::warn!(error = %e, "conversation store flush failed");
    }
    if let Err(e) = state.patients.flush() {
        tracing::warn!(error = %e, "patient store flush failed");
    }
}
