//! The dual-agent dialogue core: response normalization, model-family
//! prompt adaptation, and the turn orchestrator that ties them to the
//! history builder and the model gateway. Retrieval grounding and the
//! post-hoc analysis chat live here too since both speak to the gateway.

pub mod analysis;
pub mod cancel;
pub mod normalizer;
pub mod orchestrator;
pub mod prompt_adapter;
pub mod retrieval;

pub use analysis::{format_for_analysis, AnalysisAnswer, AnalysisChat, AnalysisExchange, AnalysisTranscript};
pub use cancel::CancelToken;
pub use normalizer::{normalize, Normalized, Normalizer, REASONING_ONLY_PLACEHOLDER};
pub use orchestrator::{DialogueOrchestrator, RunFailure, RunOutcome, RunStatus};
pub use prompt_adapter::{adapt, ModelFamily};
pub use retrieval::{DocumentInfo, KeywordRetriever, Retriever};
