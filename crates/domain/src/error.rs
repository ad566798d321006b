/// Shared error type used across all dialoga crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    /// Any failure of a model-serving call: transport, non-2xx status,
    /// malformed body, or a body without `choices`.
    #[error("model call to {model} failed: {cause}")]
    ModelCall { model: String, cause: String },

    /// Missing model identifiers, empty prompts or out-of-range sampling
    /// parameters. Raised before any model call is made.
    #[error("configuration: {0}")]
    Configuration(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("auth: {0}")]
    Auth(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Build a [`Error::ModelCall`] for `model`.
    pub fn model_call(model: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::ModelCall {
            model: model.into(),
            cause: cause.into(),
        }
    }

    /// Fold any error raised while talking to a model into
    /// [`Error::ModelCall`]. Errors that already are model-call errors keep
    /// their original model id.
    pub fn into_model_call(self, model: &str) -> Self {
        match self {
            e @ Error::ModelCall { .. } => e,
            other => Error::model_call(model, other.to_string()),
        }
    }

    /// True for errors raised by a model-serving call.
    pub fn is_model_call(&self) -> bool {
        matches!(self, Error::ModelCall { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_folds_into_model_call() {
        let err = Error::Timeout("operation timed out".into()).into_model_call("gpt-oss");
        match err {
            Error::ModelCall { model, cause } => {
                assert_eq!(model, "gpt-oss");
                assert!(cause.contains("operation timed out"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn model_call_keeps_original_model() {
        let err = Error::model_call("deepseek", "HTTP 500").into_model_call("other");
        assert!(err.is_model_call());
        assert!(err.to_string().contains("deepseek"));
        assert!(!err.to_string().contains("other"));
    }
}
