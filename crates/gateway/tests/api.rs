use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use dg_dialogue::KeywordRetriever;
use dg_domain::config::Config;
use dg_domain::{Error, Result};
use dg_gateway::api;
use dg_gateway::state::AppState;
use dg_providers::{ChatRequest, ChatResponse, LlmProvider, ProviderRegistry};
use dg_sessions::{ConversationStore, PatientStore, TranscriptWriter};

// ── mock gateways ──

/// Answers every call with a numbered line; the psychologist's replies
/// carry a reasoning block that must never reach the transcript text.
struct CountingProvider {
    calls: AtomicUsize,
}

#[async_trait]
impl LlmProvider for CountingProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let content = format!("<think>plan {n}</think>respuesta {n}");
        Ok(ChatResponse {
            content,
            model: req.model.clone().unwrap_or_default(),
            finish_reason: Some("stop".into()),
            usage: None,
        })
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(vec!["model-a".into(), "model-b".into()])
    }

    fn provider_id(&self) -> &str {
        "counting"
    }
}

/// A model server that is down.
struct DownProvider;

#[async_trait]
impl LlmProvider for DownProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        Err(Error::model_call(
            req.model.clone().unwrap_or_default(),
            "HTTP 500 - boom",
        ))
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        Err(Error::Http("connection refused".into()))
    }

    fn provider_id(&self) -> &str {
        "down"
    }
}

// ── harness ──

struct Harness {
    app: Router,
    _dir: tempfile::TempDir,
}

fn harness_with(provider: Arc<dyn LlmProvider>) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.storage.state_path = dir.path().to_path_buf();
    config.simulation.turn_count = 2;

    let state = AppState {
        llm: Arc::new(ProviderRegistry::from_providers(vec![provider])),
        conversations: Arc::new(ConversationStore::new(dir.path()).unwrap()),
        patients: Arc::new(PatientStore::new(dir.path()).unwrap()),
        transcripts: Arc::new(TranscriptWriter::new(&config.storage.transcripts_dir()).unwrap()),
        documents: Arc::new(KeywordRetriever::new()),
        config: Arc::new(config),
    };
    Harness {
        app: api::router().with_state(state),
        _dir: dir,
    }
}

fn harness() -> Harness {
    harness_with(Arc::new(CountingProvider {
        calls: AtomicUsize::new(0),
    }))
}

impl Harness {
    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(v) => builder
                .header("content-type", "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn simulate(&self, body: Value) -> (StatusCode, Value) {
        self.send("POST", "/v1/simulations", Some(body)).await
    }
}

// ── health / models ──

#[tokio::test]
async fn health_reports_providers() {
    let h = harness();
    let (status, body) = h.send("GET", "/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["providers"], json!(["counting"]));
}

#[tokio::test]
async fn models_come_from_provider() {
    let h = harness();
    let (status, body) = h.send("GET", "/v1/models", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "provider");
    assert_eq!(body["models"], json!(["model-a", "model-b"]));
}

#[tokio::test]
async fn models_fall_back_to_configured_defaults() {
    let h = harness_with(Arc::new(DownProvider));
    let (status, body) = h.send("GET", "/v1/models", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "fallback");
    assert_eq!(
        body["models"],
        json!(["openai/gpt-oss-20b", "deepseek/deepseek-r1-0528-qwen3-8b"])
    );
}

#[tokio::test]
async fn unknown_provider_is_404() {
    let h = harness();
    let (status, body) = h.send("GET", "/v1/models?provider=nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("nope"));
}

// ── patients ──

#[tokio::test]
async fn patients_are_seeded_and_editable() {
    let h = harness();
    let (status, body) = h.send("GET", "/v1/patients", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 6);

    let (status, _) = h.send("GET", "/v1/patients/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = h.send("GET", "/v1/patients/lucia_32", None).await;
    let mut profile = body["patient"].clone();
    profile["communication_style"] = json!("responde con monosílabos");
    let (status, body) = h.send("PUT", "/v1/patients/lucia_32", Some(profile)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["communication_style"], "responde con monosílabos");
    assert_eq!(body["id"], "lucia_32");
}

#[tokio::test]
async fn put_patient_with_empty_name_is_400() {
    let h = harness();
    let (_, body) = h.send("GET", "/v1/patients/mateo_17", None).await;
    let mut profile = body["patient"].clone();
    profile["name"] = json!("  ");
    let (status, _) = h.send("PUT", "/v1/patients/mateo_17", Some(profile)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── simulations & conversations ──

#[tokio::test]
async fn simulation_runs_and_is_stored() {
    let h = harness();
    let (status, report) = h.simulate(json!({ "patient_id": "carlos_68" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["status"], "completed");
    assert!(report.get("failure").is_none());

    let turns = report["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 5);
    assert!(turns[0]["text"].as_str().unwrap().starts_with("Hola Carlos"));
    assert_eq!(turns[1]["speaker"], "patient");
    assert_eq!(turns[1]["text"], "respuesta 1");
    assert_eq!(turns[1]["thought"], "plan 1");
    assert_eq!(turns[2]["speaker"], "psychologist");

    let id = report["conversation_id"].as_str().unwrap().to_owned();

    let (_, list) = h.send("GET", "/v1/conversations", None).await;
    assert_eq!(list["count"], 1);
    assert_eq!(list["conversations"][0]["id"], id.as_str());
    assert_eq!(list["conversations"][0]["turn_count"], 5);

    let (status, detail) = h.send("GET", &format!("/v1/conversations/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["transcript"].as_array().unwrap().len(), 5);
    assert_eq!(detail["conversation"]["patient_id"], "carlos_68");

    let (_, patient) = h.send("GET", "/v1/patients/carlos_68", None).await;
    assert_eq!(patient["patient"]["last_conversation_id"], id.as_str());
    assert_eq!(patient["conversations"], 1);
}

#[tokio::test]
async fn new_day_episode_is_stored_with_the_transcript() {
    let h = harness();
    let (status, report) = h
        .simulate(json!({ "patient_id": "ahmed_39", "turn_count": 2, "new_day_at": [2] }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let turns = report["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 6);
    assert_eq!(turns[3]["speaker"], "system_directive");
}

#[tokio::test]
async fn explicit_prompts_run_without_a_stored_patient() {
    let h = harness();
    let (status, report) = h
        .simulate(json!({
            "patient_prompt": "Sos un paciente que olvida las pastillas.",
            "patient_name": "Ana",
            "turn_count": 1
        }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["patient_id"], "custom");
    assert_eq!(report["turns"].as_array().unwrap().len(), 3);
    assert!(report["turns"][0]["text"].as_str().unwrap().starts_with("Hola Ana"));
}

#[tokio::test]
async fn bad_simulation_requests_are_rejected() {
    let h = harness();

    let (status, body) = h.simulate(json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("patient_prompt"));

    let (status, _) = h.simulate(json!({ "patient_id": "ghost" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = h
        .simulate(json!({ "patient_id": "carlos_68", "patient_model": " " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = h
        .simulate(json!({
            "patient_id": "carlos_68",
            "psychologist_sampling": { "temperature": 3.5 }
        }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, list) = h.send("GET", "/v1/conversations", None).await;
    assert_eq!(list["count"], 0);
}

#[tokio::test]
async fn gateway_failure_keeps_partial_transcript() {
    let h = harness_with(Arc::new(DownProvider));
    let (status, report) = h.simulate(json!({ "patient_id": "fernanda_45" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["status"], "failed");
    assert_eq!(report["failure"]["round"], 1);
    assert_eq!(report["failure"]["speaker"], "patient");
    assert_eq!(report["turns"].as_array().unwrap().len(), 1);

    let (_, stats) = h.send("GET", "/v1/conversations/stats", None).await;
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["by_status"]["failed"], 1);
}

#[tokio::test]
async fn conversations_can_be_filtered_renamed_and_deleted() {
    let h = harness();
    let (_, a) = h.simulate(json!({ "patient_id": "carlos_68" })).await;
    h.simulate(json!({ "patient_id": "lucia_32" })).await;
    let id = a["conversation_id"].as_str().unwrap().to_owned();

    let (_, only) = h
        .send("GET", "/v1/conversations?patient_id=carlos_68", None)
        .await;
    assert_eq!(only["count"], 1);

    let (status, renamed) = h
        .send(
            "PATCH",
            &format!("/v1/conversations/{id}"),
            Some(json!({ "title": "Primera sesión" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["title"], "Primera sesión");

    let (status, _) = h
        .send("PATCH", &format!("/v1/conversations/{id}"), Some(json!({ "title": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = h.send("DELETE", &format!("/v1/conversations/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = h.send("GET", &format!("/v1/conversations/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = h.send("DELETE", &format!("/v1/conversations/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, stats) = h.send("GET", "/v1/conversations/stats", None).await;
    assert_eq!(stats["total"], 1);
}

// ── documents ──

#[tokio::test]
async fn documents_can_be_indexed_queried_and_removed() {
    let h = harness();
    let text = "Las alarmas del celular ayudan a recordar la medicación inmunosupresora. \
                Un pastillero semanal reduce los olvidos.";
    let (status, body) = h
        .send("POST", "/v1/documents", Some(json!({ "name": "guia", "text": text })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["chunks"], 1);

    let (_, list) = h.send("GET", "/v1/documents", None).await;
    assert_eq!(list["count"], 1);
    assert_eq!(list["documents"][0]["name"], "guia");

    let (status, hits) = h
        .send(
            "POST",
            "/v1/documents/query",
            Some(json!({ "query": "pastillero olvidos", "k": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hits["count"], 1);

    let (_, none) = h
        .send(
            "POST",
            "/v1/documents/query",
            Some(json!({ "query": "pastillero", "documents": ["otro"] })),
        )
        .await;
    assert_eq!(none["count"], 0);

    let (status, _) = h.send("DELETE", "/v1/documents/guia", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = h.send("DELETE", "/v1/documents/guia", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_document_is_400() {
    let h = harness();
    let (status, _) = h
        .send("POST", "/v1/documents", Some(json!({ "name": "x", "text": "  " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── analysis ──

#[tokio::test]
async fn analysis_chat_answers_over_stored_conversations() {
    let h = harness();
    let (_, report) = h.simulate(json!({ "patient_id": "carlos_68", "turn_count": 1 })).await;
    let id = report["conversation_id"].as_str().unwrap();

    let (status, answer) = h
        .send(
            "POST",
            "/v1/analysis/chat",
            Some(json!({
                "question": "¿Qué barreras aparecen?",
                "conversation_ids": [id]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    // Two simulation calls happened before this one.
    assert_eq!(answer["answer"], "respuesta 3");
    assert_eq!(answer["thought"], "plan 3");
}

#[tokio::test]
async fn analysis_chat_validates_input() {
    let h = harness();
    let (status, _) = h
        .send(
            "POST",
            "/v1/analysis/chat",
            Some(json!({ "question": "¿Algo?", "conversation_ids": ["missing"] })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = h
        .send(
            "POST",
            "/v1/analysis/chat",
            Some(json!({ "question": "¿Algo?", "conversation_ids": [] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn analysis_gateway_failure_is_502() {
    let h = harness_with(Arc::new(DownProvider));
    let (_, report) = h.simulate(json!({ "patient_id": "carlos_68" })).await;
    let id = report["conversation_id"].as_str().unwrap();
    let (status, body) = h
        .send(
            "POST",
            "/v1/analysis/chat",
            Some(json!({ "question": "¿Algo?", "conversation_ids": [id] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("HTTP 500"));
}
