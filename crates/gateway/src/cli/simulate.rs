use std::sync::Arc;

use anyhow::Context;
use tokio::task::JoinSet;

use dg_domain::config::Config;
use dg_domain::Turn;

use crate::bootstrap;
use crate::cli::SimulateArgs;
use crate::simulation::{self, SimulationReport, SimulationRequest};
use crate::state::AppState;

/// Execute `dialoga simulate`.
pub async fn run(config: Arc<Config>, args: SimulateArgs) -> anyhow::Result<()> {
    if args.patient.is_none() && !args.all {
        anyhow::bail!("pass --patient <ID> or --all");
    }

    let state = bootstrap::build_app_state(config)?;
    for path in &args.index {
        index_file(&state, path)?;
    }

    let patient_ids = match &args.patient {
        Some(id) => vec![id.clone()],
        None => state
            .patients
            .list()
            .into_iter()
            .map(|r| r.profile.id)
            .collect(),
    };

    let reports = if patient_ids.len() == 1 {
        let req = request_for(&args, &patient_ids[0]);
        vec![simulation::run_and_persist(&state, &req)
            .await
            .with_context(|| format!("simulating {}", patient_ids[0]))?]
    } else {
        run_concurrently(&state, &args, patient_ids).await?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else if let [report] = reports.as_slice() {
        print_transcript(&report.turns);
        print_summary(report);
    } else {
        for report in &reports {
            print_summary(report);
        }
    }

    bootstrap::flush_stores(&state);
    if reports.iter().any(|r| r.failure.is_some()) {
        anyhow::bail!("one or more simulations failed");
    }
    Ok(())
}

/// One task per patient. Each conversation owns its orchestrator and
/// transcript; only the stores are shared.
async fn run_concurrently(
    state: &AppState,
    args: &SimulateArgs,
    patient_ids: Vec<String>,
) -> anyhow::Result<Vec<SimulationReport>> {
    let mut set = JoinSet::new();
    for id in patient_ids {
        let state = state.clone();
        let req = request_for(args, &id);
        set.spawn(async move {
            let result = simulation::run_and_persist(&state, &req).await;
            (id, result)
        });
    }

    let mut reports = Vec::new();
    while let Some(joined) = set.join_next().await {
        let (id, result) = joined.context("simulation task panicked")?;
        match result {
            Ok(report) => reports.push(report),
            Err(e) => eprintln!("{id}: {e}"),
        }
    }
    reports.sort_by(|a, b| a.patient_id.cmp(&b.patient_id));
    Ok(reports)
}

fn request_for(args: &SimulateArgs, patient_id: &str) -> SimulationRequest {
    SimulationRequest {
        patient_id: Some(patient_id.to_owned()),
        patient_model: args.patient_model.clone(),
        psychologist_model: args.psychologist_model.clone(),
        turn_count: args.turns,
        new_day_at: args.new_day_at.clone(),
        rag_documents: args.documents.clone(),
        provider: args.provider.clone(),
        ..SimulationRequest::default()
    }
}

fn index_file(state: &AppState, path: &std::path::Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("no usable file name in {}", path.display()))?;
    let chunks = state.documents.add_document(name, &text);
    tracing::info!(document = name, chunks, "document indexed");
    Ok(())
}

pub(crate) fn print_transcript(turns: &[Turn]) {
    for turn in turns {
        if turn.is_directive() {
            println!("[{}] {}\n", turn.speaker.label(), turn.text);
        } else {
            println!("{}: {}\n", turn.speaker.label(), turn.text);
        }
    }
}

fn print_summary(report: &SimulationReport) {
    let content = report.turns.iter().filter(|t| !t.is_directive()).count();
    print!(
        "{:<14} {:<10} {:>3} turns  {}",
        report.patient_id,
        report.status.as_str(),
        content,
        report.conversation_id
    );
    match &report.failure {
        Some(f) => println!("  ({} at round {}: {})", f.speaker, f.round, f.message),
        None => println!(),
    }
}
