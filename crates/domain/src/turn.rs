//! Speaker-tagged turns of a simulated conversation.

use serde::{Deserialize, Serialize};

/// Default content for a "new day" episode directive.
pub const NEW_DAY_EPISODE: &str = "Pasó UN DÍA ENTERO desde la última charla. \
Saludá de nuevo y contá brevemente qué pasó con la medicación desde entonces: \
si pudiste seguir el consejo, si te olvidaste o si surgió algún problema nuevo.";

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Patient,
    Psychologist,
    SystemDirective,
}

impl Speaker {
    /// The other participant, or `None` for directives.
    pub fn counterpart(self) -> Option<Speaker> {
        match self {
            Speaker::Patient => Some(Speaker::Psychologist),
            Speaker::Psychologist => Some(Speaker::Patient),
            Speaker::SystemDirective => None,
        }
    }

    /// Upper-case label used in rendered transcripts.
    pub fn label(self) -> &'static str {
        match self {
            Speaker::Patient => "PATIENT",
            Speaker::Psychologist => "PSYCHOLOGIST",
            Speaker::SystemDirective => "SYSTEM",
        }
    }

    pub fn is_participant(self) -> bool {
        !matches!(self, Speaker::SystemDirective)
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Speaker::Patient => "patient",
            Speaker::Psychologist => "psychologist",
            Speaker::SystemDirective => "system_directive",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveKind {
    /// Elapsed time or a life event. Only the latest one reaches a model.
    Episode,
    /// Generic system note. Always forwarded to its audience.
    Note,
}

/// Routing metadata carried by `SystemDirective` turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub kind: DirectiveKind,
    /// The only participant whose context ever sees this directive.
    pub audience: Speaker,
}

/// A directive the orchestrator injects before the Patient call of
/// `before_round` (1-based).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledDirective {
    pub before_round: u32,
    #[serde(default = "d_episode")]
    pub kind: DirectiveKind,
    #[serde(default = "d_patient")]
    pub audience: Speaker,
    pub content: String,
}

impl ScheduledDirective {
    /// Patient-bound "a day has passed" episode.
    pub fn new_day(before_round: u32) -> Self {
        Self {
            before_round,
            kind: DirectiveKind::Episode,
            audience: Speaker::Patient,
            content: NEW_DAY_EPISODE.into(),
        }
    }
}

fn d_episode() -> DirectiveKind {
    DirectiveKind::Episode
}
fn d_patient() -> Speaker {
    Speaker::Patient
}

/// One attributed utterance. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Strictly increasing within a conversation.
    pub sequence: u64,
    pub speaker: Speaker,
    /// Cleaned visible content.
    pub text: String,
    /// Hidden reasoning. Never shown to the other agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directive: Option<Directive>,
}

impl Turn {
    /// A Patient or Psychologist utterance.
    pub fn utterance(
        sequence: u64,
        speaker: Speaker,
        text: impl Into<String>,
        thought: Option<String>,
    ) -> Self {
        Self {
            sequence,
            speaker,
            text: text.into(),
            thought,
            directive: None,
        }
    }

    /// A `SystemDirective` turn routed to `audience`.
    pub fn directive(
        sequence: u64,
        kind: DirectiveKind,
        audience: Speaker,
        text: impl Into<String>,
    ) -> Self {
        Self {
            sequence,
            speaker: Speaker::SystemDirective,
            text: text.into(),
            thought: None,
            directive: Some(Directive { kind, audience }),
        }
    }

    pub fn is_directive(&self) -> bool {
        self.speaker == Speaker::SystemDirective
    }

    /// True for directives that should reach `viewer`'s context. Directives
    /// without routing metadata are treated as patient-bound notes.
    pub fn is_directive_for(&self, viewer: Speaker) -> bool {
        if !self.is_directive() {
            return false;
        }
        let audience = self
            .directive
            .map(|d| d.audience)
            .unwrap_or(Speaker::Patient);
        audience == viewer
    }

    pub fn is_episode(&self) -> bool {
        matches!(
            self.directive,
            Some(Directive {
                kind: DirectiveKind::Episode,
                ..
            })
        )
    }
}
