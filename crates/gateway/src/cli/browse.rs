//! Read-only commands: `patients`, `conversations`, `show`, `models`.

use std::sync::Arc;

use anyhow::Context;

use dg_domain::config::Config;
use dg_providers::ProviderRegistry;
use dg_sessions::{ConversationStore, PatientStore, TranscriptWriter};

pub fn patients(config: &Config, json: bool) -> anyhow::Result<()> {
    let store = PatientStore::new(&config.storage.state_path).context("opening patient store")?;
    let patients = store.list();
    if json {
        println!("{}", serde_json::to_string_pretty(&patients)?);
        return Ok(());
    }
    for record in &patients {
        let p = &record.profile;
        println!(
            "{:<14} {:<14} {:>3}  {}",
            p.id, p.name, p.age, p.transplant
        );
    }
    Ok(())
}

pub fn conversations(config: &Config, patient: Option<&str>, json: bool) -> anyhow::Result<()> {
    let store = ConversationStore::new(&config.storage.state_path)
        .context("opening conversation store")?;
    let entries = match patient {
        Some(id) => store.by_patient(id),
        None => store.list(),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No conversations stored.");
        return Ok(());
    }
    for e in &entries {
        println!(
            "{}  {:<10} {:>3} turns  {}",
            e.id, e.status, e.turn_count, e.title
        );
    }
    Ok(())
}

pub fn show(config: &Config, conversation_id: &str, thoughts: bool, json: bool) -> anyhow::Result<()> {
    let store = ConversationStore::new(&config.storage.state_path)
        .context("opening conversation store")?;
    let entry = store
        .get(conversation_id)
        .with_context(|| format!("conversation {conversation_id} not found"))?;
    let transcripts = TranscriptWriter::new(&config.storage.transcripts_dir())
        .context("opening transcript directory")?;
    let lines = transcripts.read(conversation_id)?;

    if json {
        let out = serde_json::json!({ "conversation": entry, "transcript": lines });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{}", entry.title);
    println!(
        "patient model: {}  psychologist model: {}  status: {}\n",
        entry.patient_model, entry.psychologist_model, entry.status
    );
    for line in &lines {
        let turn = &line.turn;
        if thoughts {
            if let Some(thought) = &turn.thought {
                println!("  ({} pensó) {}", turn.speaker.label(), thought);
            }
        }
        if turn.is_directive() {
            println!("[{}] {}\n", turn.speaker.label(), turn.text);
        } else {
            println!("{}: {}\n", turn.speaker.label(), turn.text);
        }
    }
    if let Some(failure) = &entry.failure {
        println!("-- run stopped: {failure}");
    }
    Ok(())
}

/// Print the served models, falling back to the configured defaults when
/// the server cannot be reached.
pub async fn models(config: Arc<Config>, provider: Option<&str>) -> anyhow::Result<()> {
    let registry =
        ProviderRegistry::from_config(&config.llm).context("initializing LLM providers")?;
    let provider = registry.resolve(provider)?;
    match provider.list_models().await {
        Ok(models) if !models.is_empty() => {
            for m in models {
                println!("{m}");
            }
        }
        result => {
            if let Err(e) = result {
                eprintln!("could not list models from {}: {e}", provider.provider_id());
            }
            println!("{}", config.simulation.patient_model);
            if config.simulation.psychologist_model != config.simulation.patient_model {
                println!("{}", config.simulation.psychologist_model);
            }
        }
    }
    Ok(())
}
