use dg_domain::message::{Message, Role};
use dg_domain::turn::{Speaker, Turn};
use serde::Serialize;

use crate::injection;
use crate::report::ContextReport;
use crate::window;

/// Forced-attention text appended to the final user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextSuffix {
    /// Sequence number of the Episode directive it repeats.
    pub source_sequence: u64,
    pub content: String,
}

impl ContextSuffix {
    pub fn render(&self) -> String {
        injection::format_episode_suffix(&self.content)
    }
}

/// The model-facing context for one participant, kept in parts until it is
/// flattened.
#[derive(Debug, Clone)]
pub struct ContextPack {
    /// Preserved directives, as system messages, in sequence order.
    pub directives: Vec<Message>,
    /// Windowed regular turns, oldest first, roles inverted for the viewer.
    pub window: Vec<Message>,
    /// The interlocutor's message being answered, without suffix.
    pub interlocutor: String,
    pub suffix: Option<ContextSuffix>,
    pub report: ContextReport,
}

impl ContextPack {
    /// Content of the final user message with the suffix applied.
    pub fn final_content(&self) -> String {
        match &self.suffix {
            Some(s) => format!("{}{}", self.interlocutor, s.render()),
            None => self.interlocutor.clone(),
        }
    }

    /// `[directives] + [window] + [final user message]`.
    pub fn into_messages(self) -> Vec<Message> {
        let final_content = self.final_content();
        let mut out = self.directives;
        out.extend(self.window);
        out.push(Message::user(final_content));
        out
    }
}

/// Role-inverting history builder.
///
/// Pure: the same history, viewer and message always produce the same
/// context.
#[derive(Debug, Clone, Copy)]
pub struct HistoryBuilder {
    pub window_size: usize,
}

impl HistoryBuilder {
    pub fn new(window_size: usize) -> Self {
        Self { window_size }
    }

    /// Build `viewer`'s context. `history` must not contain the turn being
    /// answered; its text is passed as `interlocutor_message`.
    pub fn build(&self, history: &[Turn], viewer: Speaker, interlocutor_message: &str) -> ContextPack {
        let parts = window::partition(history, viewer);
        let (kept, dropped_turns) = window::window(&parts.regular, self.window_size);
        let (directives, latest_episode, suppressed_episodes) =
            window::suppress_stale_episodes(&parts.directives);

        let directive_msgs: Vec<Message> = directives
            .iter()
            .map(|t| Message::system(injection::format_directive(t)))
            .collect();

        // Thoughts never leave the turn; only visible text is mapped.
        let window_msgs: Vec<Message> = kept
            .iter()
            .map(|t| Message {
                role: wire_role(t.speaker, viewer),
                content: t.text.clone(),
            })
            .collect();

        let suffix = latest_episode.map(|t| ContextSuffix {
            source_sequence: t.sequence,
            content: t.text.clone(),
        });

        let mut pack = ContextPack {
            directives: directive_msgs,
            window: window_msgs,
            interlocutor: interlocutor_message.to_string(),
            suffix,
            report: ContextReport {
                viewer: viewer.to_string(),
                history_turns: history.len(),
                window_turns: kept.len(),
                dropped_turns,
                preserved_directives: directives.len(),
                suppressed_episodes,
                foreign_directives: parts.foreign_directives,
                suffix_attached: latest_episode.is_some(),
                total_chars: 0,
            },
        };
        pack.report.total_chars = pack
            .directives
            .iter()
            .chain(pack.window.iter())
            .map(|m| m.content.len())
            .sum::<usize>()
            + pack.final_content().len();
        pack
    }
}

/// Wire role of a turn authored by `speaker` as seen by `viewer`: the
/// viewer's own turns are "assistant", everything else is "user".
pub fn wire_role(speaker: Speaker, viewer: Speaker) -> Role {
    if speaker == viewer {
        Role::Assistant
    } else {
        Role::User
    }
}

/// Flat form of [`HistoryBuilder::build`].
pub fn build_context(
    history: &[Turn],
    viewer: Speaker,
    interlocutor_message: &str,
    window_size: usize,
) -> Vec<Message> {
    HistoryBuilder::new(window_size)
        .build(history, viewer, interlocutor_message)
        .into_messages()
}
