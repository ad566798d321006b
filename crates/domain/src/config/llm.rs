use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LLM provider system
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Per-request timeout. Local servers can take minutes to load a cold
    /// model, so the default is generous.
    #[serde(default = "d_600000u")]
    pub default_timeout_ms: u64,
    /// Provider used when a request does not name one. Falls back to the
    /// first registered provider.
    #[serde(default)]
    pub default_provider: Option<String>,
    /// Registered providers. When empty, a single local OpenAI-compatible
    /// endpoint is assumed.
    #[serde(default = "d_providers")]
    pub providers: Vec<ProviderConfig>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: d_600000u(),
            default_provider: None,
            providers: d_providers(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    #[serde(default)]
    pub kind: ProviderKind,
    #[serde(default = "d_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub default_model: Option<String>,
}

impl ProviderConfig {
    /// LM Studio on its default port.
    pub fn local() -> Self {
        Self {
            id: "local".into(),
            kind: ProviderKind::OpenaiCompat,
            base_url: d_base_url(),
            auth: AuthConfig {
                mode: AuthMode::None,
                ..Default::default()
            },
            default_model: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Any `/chat/completions` server: LM Studio, vLLM, Ollama, OpenAI.
    #[default]
    OpenaiCompat,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub mode: AuthMode,
    /// Header name (e.g. "Authorization", "x-api-key").
    #[serde(default)]
    pub header: Option<String>,
    /// Header value prefix (e.g. "Bearer ").
    #[serde(default)]
    pub prefix: Option<String>,
    /// Env var containing the key.
    #[serde(default)]
    pub env: Option<String>,
    /// Direct key (for config-only setups; prefer env).
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    #[default]
    ApiKey,
    None,
}

// ── serde default helpers ───────────────────────────────────────────

fn d_600000u() -> u64 {
    600_000
}
fn d_base_url() -> String {
    "http://127.0.0.1:1234/v1".into()
}
fn d_providers() -> Vec<ProviderConfig> {
    vec![ProviderConfig::local()]
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_local_provider() {
        let cfg = LlmConfig::default();
        assert_eq!(cfg.default_timeout_ms, 600_000);
        assert_eq!(cfg.providers.len(), 1);
        assert_eq!(cfg.providers[0].id, "local");
        assert_eq!(cfg.providers[0].auth.mode, AuthMode::None);
    }

    #[test]
    fn provider_parses_with_defaults() {
        let toml_str = r#"
            [[providers]]
            id = "vllm"
            base_url = "http://gpu-box:8000/v1"
            [providers.auth]
            env = "VLLM_API_KEY"
        "#;
        let cfg: LlmConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.providers.len(), 1);
        let p = &cfg.providers[0];
        assert_eq!(p.kind, ProviderKind::OpenaiCompat);
        assert_eq!(p.auth.mode, AuthMode::ApiKey);
        assert_eq!(p.auth.env.as_deref(), Some("VLLM_API_KEY"));
    }
}
