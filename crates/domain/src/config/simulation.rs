use serde::{Deserialize, Serialize};

use crate::conversation::ConversationConfig;
use crate::persona::{self, PersonaProfile};
use crate::sampling::SamplingParams;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Simulation defaults
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Defaults applied when a simulation request leaves a field unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "d_patient_model")]
    pub patient_model: String,
    #[serde(default = "d_psychologist_model")]
    pub psychologist_model: String,
    /// Patient/psychologist round trips per conversation.
    #[serde(default = "d_10")]
    pub turn_count: u32,
    /// Regular turns kept in each participant's context.
    #[serde(default = "d_6")]
    pub history_window: usize,
    /// Chunks retrieved for psychologist grounding.
    #[serde(default = "d_3")]
    pub retrieval_k: usize,
    #[serde(default)]
    pub patient_sampling: SamplingParams,
    #[serde(default)]
    pub psychologist_sampling: SamplingParams,
    /// Replaces the built-in COM-B psychologist instruction.
    #[serde(default)]
    pub psychologist_prompt: Option<String>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            patient_model: d_patient_model(),
            psychologist_model: d_psychologist_model(),
            turn_count: d_10(),
            history_window: d_6(),
            retrieval_k: d_3(),
            patient_sampling: SamplingParams::default(),
            psychologist_sampling: SamplingParams::default(),
            psychologist_prompt: None,
        }
    }
}

impl SimulationConfig {
    /// Conversation settings for `profile` using these defaults. The
    /// profile's preferred model wins over `patient_model`.
    pub fn conversation_for(&self, profile: &PersonaProfile) -> ConversationConfig {
        ConversationConfig {
            patient_model: profile
                .preferred_patient_model
                .clone()
                .unwrap_or_else(|| self.patient_model.clone()),
            psychologist_model: self.psychologist_model.clone(),
            patient_prompt: persona::render_patient_prompt(profile),
            psychologist_prompt: self
                .psychologist_prompt
                .clone()
                .unwrap_or_else(persona::default_psychologist_prompt),
            patient_sampling: self.patient_sampling,
            psychologist_sampling: self.psychologist_sampling,
            turn_count: self.turn_count,
            seed: persona::opening_message(profile),
            history_window: self.history_window,
            retrieval_k: self.retrieval_k,
            episodes: Vec::new(),
            rag_documents: Vec::new(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_patient_model() -> String {
    "openai/gpt-oss-20b".into()
}
fn d_psychologist_model() -> String {
    "deepseek/deepseek-r1-0528-qwen3-8b".into()
}
fn d_10() -> u32 {
    10
}
fn d_6() -> usize {
    6
}
fn d_3() -> usize {
    3
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::builtin_roster;

    #[test]
    fn conversation_for_builds_valid_config() {
        let sim = SimulationConfig::default();
        let profile = builtin_roster().remove(2);
        let conv = sim.conversation_for(&profile);
        assert_eq!(conv.patient_model, "openai/gpt-oss-20b");
        assert!(conv.seed.starts_with("Hola Mateo"));
        assert!(conv.patient_prompt.contains("Mateo G."));
        conv.validate().unwrap();
    }

    #[test]
    fn preferred_model_overrides_default() {
        let sim = SimulationConfig::default();
        let mut profile = builtin_roster().remove(0);
        profile.preferred_patient_model = Some("mistral-7b-instruct".into());
        let conv = sim.conversation_for(&profile);
        assert_eq!(conv.patient_model, "mistral-7b-instruct");
    }

    #[test]
    fn parses_nested_sampling() {
        let toml_str = r#"
            turn_count = 4
            [psychologist_sampling]
            temperature = 0.4
        "#;
        let cfg: SimulationConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.turn_count, 4);
        assert_eq!(cfg.history_window, 6);
        assert!((cfg.psychologist_sampling.temperature - 0.4).abs() < 1e-6);
        assert_eq!(cfg.psychologist_sampling.max_tokens, 2000);
    }
}
