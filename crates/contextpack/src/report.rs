use dg_domain::trace::TraceEvent;
use serde::{Deserialize, Serialize};

/// Machine-readable account of one context build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextReport {
    pub viewer: String,
    pub history_turns: usize,
    pub window_turns: usize,
    /// Regular turns older than the window.
    pub dropped_turns: usize,
    pub preserved_directives: usize,
    /// Older Episodes replaced by a newer one.
    pub suppressed_episodes: usize,
    /// Directives addressed to the other participant.
    pub foreign_directives: usize,
    pub suffix_attached: bool,
    pub total_chars: usize,
}

impl ContextReport {
    pub fn to_trace_event(&self) -> TraceEvent {
        TraceEvent::ContextBuilt {
            viewer: self.viewer.clone(),
            history_turns: self.history_turns,
            window_turns: self.window_turns,
            dropped_turns: self.dropped_turns,
            preserved_directives: self.preserved_directives,
            suppressed_episodes: self.suppressed_episodes,
            suffix_attached: self.suffix_attached,
            total_chars: self.total_chars,
        }
    }
}
