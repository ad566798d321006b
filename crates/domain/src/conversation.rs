use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sampling::SamplingParams;
use crate::turn::{ScheduledDirective, Speaker};

/// Everything one simulated conversation needs, passed explicitly to the
/// orchestrator. Immutable for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    pub patient_model: String,
    pub psychologist_model: String,
    pub patient_prompt: String,
    pub psychologist_prompt: String,
    #[serde(default)]
    pub patient_sampling: SamplingParams,
    #[serde(default)]
    pub psychologist_sampling: SamplingParams,
    pub turn_count: u32,
    /// Fixed psychologist opening. Never generated by a model.
    pub seed: String,
    #[serde(default = "d_window")]
    pub history_window: usize,
    #[serde(default = "d_k")]
    pub retrieval_k: usize,
    #[serde(default)]
    pub episodes: Vec<ScheduledDirective>,
    /// Documents the psychologist is grounded on. Empty disables retrieval.
    #[serde(default)]
    pub rag_documents: Vec<String>,
}

impl ConversationConfig {
    /// Fail fast on anything that would make a model call pointless.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("patient_model", &self.patient_model),
            ("psychologist_model", &self.psychologist_model),
            ("patient_prompt", &self.patient_prompt),
            ("psychologist_prompt", &self.psychologist_prompt),
            ("seed", &self.seed),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::Configuration(format!("{field} must not be empty")));
            }
        }
        self.patient_sampling.validate("patient_sampling")?;
        self.psychologist_sampling.validate("psychologist_sampling")?;
        if self.history_window == 0 {
            return Err(Error::Configuration(
                "history_window must be greater than 0".into(),
            ));
        }
        for (i, ep) in self.episodes.iter().enumerate() {
            if ep.content.trim().is_empty() {
                return Err(Error::Configuration(format!(
                    "episodes[{i}].content must not be empty"
                )));
            }
            if ep.audience == Speaker::SystemDirective {
                return Err(Error::Configuration(format!(
                    "episodes[{i}].audience must be patient or psychologist"
                )));
            }
        }
        Ok(())
    }

    /// Model id used for `speaker`'s calls.
    pub fn model_for(&self, speaker: Speaker) -> &str {
        match speaker {
            Speaker::Psychologist => &self.psychologist_model,
            _ => &self.patient_model,
        }
    }

    pub fn prompt_for(&self, speaker: Speaker) -> &str {
        match speaker {
            Speaker::Psychologist => &self.psychologist_prompt,
            _ => &self.patient_prompt,
        }
    }

    pub fn sampling_for(&self, speaker: Speaker) -> SamplingParams {
        match speaker {
            Speaker::Psychologist => self.psychologist_sampling,
            _ => self.patient_sampling,
        }
    }
}

fn d_window() -> usize {
    6
}
fn d_k() -> usize {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ConversationConfig {
        ConversationConfig {
            patient_model: "openai/gpt-oss-20b".into(),
            psychologist_model: "deepseek/deepseek-r1".into(),
            patient_prompt: "Sos el paciente.".into(),
            psychologist_prompt: "Sos el psicólogo.".into(),
            patient_sampling: SamplingParams::default(),
            psychologist_sampling: SamplingParams::default(),
            turn_count: 2,
            seed: "Hola, soy tu psicólogo.".into(),
            history_window: 6,
            retrieval_k: 3,
            episodes: Vec::new(),
            rag_documents: Vec::new(),
        }
    }

    #[test]
    fn valid_config_passes() {
        base().validate().unwrap();
    }

    #[test]
    fn empty_model_is_configuration_error() {
        let mut cfg = base();
        cfg.psychologist_model = "  ".into();
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("psychologist_model"));
    }

    #[test]
    fn bad_sampling_is_configuration_error() {
        let mut cfg = base();
        cfg.patient_sampling.top_p = 1.5;
        assert!(matches!(cfg.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn directive_audience_must_be_participant() {
        let mut cfg = base();
        let mut ep = ScheduledDirective::new_day(2);
        ep.audience = Speaker::SystemDirective;
        cfg.episodes.push(ep);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn per_speaker_accessors() {
        let cfg = base();
        assert_eq!(cfg.model_for(Speaker::Patient), "openai/gpt-oss-20b");
        assert_eq!(cfg.prompt_for(Speaker::Psychologist), "Sos el psicólogo.");
    }
}
