use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Sampling parameters
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Per-participant sampling parameters forwarded verbatim to the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    #[serde(default = "d_temperature")]
    pub temperature: f32,
    #[serde(default = "d_top_p")]
    pub top_p: f32,
    #[serde(default = "d_top_k")]
    pub top_k: u32,
    #[serde(default = "d_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "d_presence_penalty")]
    pub presence_penalty: f32,
    #[serde(default = "d_frequency_penalty")]
    pub frequency_penalty: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: d_temperature(),
            top_p: d_top_p(),
            top_k: d_top_k(),
            max_tokens: d_max_tokens(),
            presence_penalty: d_presence_penalty(),
            frequency_penalty: d_frequency_penalty(),
        }
    }
}

impl SamplingParams {
    /// Reject values no serving endpoint accepts. `field` prefixes the
    /// message so callers can tell which participant is misconfigured.
    pub fn validate(&self, field: &str) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::Configuration(format!(
                "{field}.temperature must be within [0, 2], got {}",
                self.temperature
            )));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(Error::Configuration(format!(
                "{field}.top_p must be within (0, 1], got {}",
                self.top_p
            )));
        }
        if self.max_tokens == 0 {
            return Err(Error::Configuration(format!(
                "{field}.max_tokens must be greater than 0"
            )));
        }
        for (name, value) in [
            ("presence_penalty", self.presence_penalty),
            ("frequency_penalty", self.frequency_penalty),
        ] {
            if !(-2.0..=2.0).contains(&value) {
                return Err(Error::Configuration(format!(
                    "{field}.{name} must be within [-2, 2], got {value}"
                )));
            }
        }
        Ok(())
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_temperature() -> f32 {
    0.7
}
fn d_top_p() -> f32 {
    0.9
}
fn d_top_k() -> u32 {
    40
}
fn d_max_tokens() -> u32 {
    2000
}
fn d_presence_penalty() -> f32 {
    0.1
}
fn d_frequency_penalty() -> f32 {
    0.2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        SamplingParams::default().validate("patient_sampling").unwrap();
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        let p = SamplingParams {
            temperature: 2.5,
            ..Default::default()
        };
        let err = p.validate("patient_sampling").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("patient_sampling.temperature"));
    }

    #[test]
    fn rejects_zero_top_p_and_zero_max_tokens() {
        let p = SamplingParams {
            top_p: 0.0,
            ..Default::default()
        };
        assert!(p.validate("x").is_err());

        let p = SamplingParams {
            max_tokens: 0,
            ..Default::default()
        };
        assert!(p.validate("x").is_err());
    }

    #[test]
    fn rejects_large_penalty() {
        let p = SamplingParams {
            frequency_penalty: -3.0,
            ..Default::default()
        };
        let err = p.validate("psychologist_sampling").unwrap_err();
        assert!(err.to_string().contains("frequency_penalty"));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let p: SamplingParams = serde_json::from_str(r#"{"temperature":0.3}"#).unwrap();
        assert_eq!(p.temperature, 0.3);
        assert_eq!(p.top_k, 40);
        assert_eq!(p.max_tokens, 2000);
    }
}
