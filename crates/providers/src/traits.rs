use dg_domain::error::Result;
use dg_domain::message::Message;
use dg_domain::sampling::SamplingParams;
use serde::Serialize;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / Response types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A provider-agnostic chat completion request.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// The conversation messages to send, system prompt first.
    pub messages: Vec<Message>,
    /// Model identifier. When `None`, the provider uses its default.
    pub model: Option<String>,
    /// Forwarded verbatim; providers never clamp or reinterpret them.
    pub sampling: SamplingParams,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>, sampling: SamplingParams) -> Self {
        Self {
            messages,
            model: Some(model.into()),
            sampling,
        }
    }
}

/// Token accounting reported by the server, when it reports any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A provider-agnostic chat completion response.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Raw completion text, reasoning markup included.
    pub content: String,
    /// The model that actually produced the response.
    pub model: String,
    /// The reason the model stopped generating (e.g. "stop", "length").
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core provider trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The model gateway. Every failure (transport, status, body shape) comes
/// back as [`dg_domain::Error::ModelCall`].
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request and wait for the full response.
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse>;

    /// Model identifiers the server currently exposes.
    async fn list_models(&self) -> Result<Vec<String>>;

    /// A unique identifier for this provider instance.
    fn provider_id(&self) -> &str;
}
