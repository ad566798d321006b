//! Persistence for dialoga.
//!
//! Append-only JSONL transcripts per conversation, a JSON index of finished
//! runs, and the editable patient profile store.

pub mod patients;
pub mod store;
pub mod transcript;

pub use patients::{PatientRecord, PatientStore};
pub use store::{ConversationEntry, ConversationStats, ConversationStore, NewConversation};
pub use transcript::{TranscriptLine, TranscriptWriter};
