mod llm;
mod observability;
mod server;
mod simulation;
mod storage;

pub use llm::*;
pub use observability::*;
pub use server::*;
pub use simulation::*;
pub use storage::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues. Empty when
    /// everything looks good.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.server.port == 0 {
            issues.push(ConfigIssue::error("server.port", "port must be greater than 0"));
        }
        if self.server.host.is_empty() {
            issues.push(ConfigIssue::error("server.host", "host must not be empty"));
        }
        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            issues.push(ConfigIssue::warning(
                "server.cors.allowed_origins",
                "wildcard \"*\" allows all origins",
            ));
        }

        if self.llm.providers.is_empty() {
            issues.push(ConfigIssue::error("llm.providers", "no LLM providers configured"));
        }
        for (i, provider) in self.llm.providers.iter().enumerate() {
            if provider.id.is_empty() {
                issues.push(ConfigIssue::error(
                    format!("llm.providers[{i}].id"),
                    "provider id must not be empty",
                ));
            }
            if provider.base_url.is_empty() {
                issues.push(ConfigIssue::error(
                    format!("llm.providers[{i}].base_url"),
                    "provider base_url must not be empty",
                ));
            }
        }
        if let Some(default) = &self.llm.default_provider {
            if !self.llm.providers.iter().any(|p| &p.id == default) {
                issues.push(ConfigIssue::error(
                    "llm.default_provider",
                    format!("\"{default}\" does not match any configured provider"),
                ));
            }
        }
        if self.llm.default_timeout_ms < 30_000 {
            issues.push(ConfigIssue::warning(
                "llm.default_timeout_ms",
                "cold model loads can exceed 30s; calls may time out",
            ));
        }

        let sim = &self.simulation;
        if sim.patient_model.trim().is_empty() {
            issues.push(ConfigIssue::error(
                "simulation.patient_model",
                "model id must not be empty",
            ));
        }
        if sim.psychologist_model.trim().is_empty() {
            issues.push(ConfigIssue::error(
                "simulation.psychologist_model",
                "model id must not be empty",
            ));
        }
        if sim.history_window == 0 {
            issues.push(ConfigIssue::error(
                "simulation.history_window",
                "window must keep at least one turn",
            ));
        }
        if sim.turn_count == 0 {
            issues.push(ConfigIssue::warning(
                "simulation.turn_count",
                "conversations will contain only the opening message",
            ));
        }
        for (field, params) in [
            ("simulation.patient_sampling", &sim.patient_sampling),
            ("simulation.psychologist_sampling", &sim.psychologist_sampling),
        ] {
            if let Err(e) = params.validate(field) {
                issues.push(ConfigIssue::error(field, e.to_string()));
            }
        }

        if !(0.0..=1.0).contains(&self.observability.sample_rate) {
            issues.push(ConfigIssue::error(
                "observability.sample_rate",
                "sample_rate must be within [0, 1]",
            ));
        }

        issues
    }
}
