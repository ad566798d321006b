//! Provider registry.
//!
//! Constructs and holds all configured LLM provider instances. At startup the
//! registry reads the [`LlmConfig`], resolves authentication and instantiates
//! an adapter for each configured provider.

use crate::openai_compat::OpenAiCompatProvider;
use crate::traits::LlmProvider;
use dg_domain::config::{LlmConfig, ProviderKind};
use dg_domain::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ProviderRegistry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Holds all instantiated LLM providers.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    default_id: Option<String>,
}

impl ProviderRegistry {
    /// Build the registry from the application's [`LlmConfig`].
    ///
    /// Providers that fail to initialize are logged and skipped rather than
    /// aborting the entire startup.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let mut providers: HashMap<String, Arc<dyn LlmProvider>> = HashMap::new();
        let mut first_ok: Option<String> = None;

        for pc in &config.providers {
            let result: Result<Arc<dyn LlmProvider>> = match pc.kind {
                ProviderKind::OpenaiCompat => {
                    OpenAiCompatProvider::from_config(pc, config.default_timeout_ms)
                        .map(|p| Arc::new(p) as Arc<dyn LlmProvider>)
                }
            };

            match result {
                Ok(provider) => {
                    tracing::info!(
                        provider_id = %pc.id,
                        kind = ?pc.kind,
                        base_url = %pc.base_url,
                        "registered LLM provider"
                    );
                    first_ok.get_or_insert_with(|| pc.id.clone());
                    providers.insert(pc.id.clone(), provider);
                }
                Err(e) => {
                    tracing::warn!(
                        provider_id = %pc.id,
                        kind = ?pc.kind,
                        error = %e,
                        "failed to initialize LLM provider, skipping"
                    );
                }
            }
        }

        if providers.is_empty() {
            tracing::warn!("no LLM providers initialized; simulations will fail");
        }

        let default_id = match &config.default_provider {
            Some(id) if providers.contains_key(id) => Some(id.clone()),
            Some(id) => {
                return Err(Error::Configuration(format!(
                    "default provider '{id}' is not registered"
                )))
            }
            None => first_ok,
        };

        Ok(Self {
            providers,
            default_id,
        })
    }

    /// A registry around already-built providers. The first one becomes
    /// the default.
    pub fn from_providers(list: Vec<Arc<dyn LlmProvider>>) -> Self {
        let default_id = list.first().map(|p| p.provider_id().to_string());
        let providers = list
            .into_iter()
            .map(|p| (p.provider_id().to_string(), p))
            .collect();
        Self {
            providers,
            default_id,
        }
    }

    /// Look up a provider by its config id.
    pub fn get(&self, provider_id: &str) -> Option<Arc<dyn LlmProvider>> {
        self.providers.get(provider_id).cloned()
    }

    /// The provider used when a caller does not name one.
    pub fn default_provider(&self) -> Option<Arc<dyn LlmProvider>> {
        self.default_id.as_deref().and_then(|id| self.get(id))
    }

    /// `provider_id` when given, else the default.
    pub fn resolve(&self, provider_id: Option<&str>) -> Result<Arc<dyn LlmProvider>> {
        match provider_id {
            Some(id) => self
                .get(id)
                .ok_or_else(|| Error::NotFound(format!("provider '{id}'"))),
            None => self
                .default_provider()
                .ok_or_else(|| Error::Configuration("no LLM provider available".into())),
        }
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// List all registered provider IDs (sorted).
    pub fn list_providers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.providers.keys().cloned().collect();
        ids.sort();
        ids
    }
}
