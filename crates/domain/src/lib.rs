pub mod config;
pub mod conversation;
pub mod error;
pub mod message;
pub mod persona;
pub mod sampling;
pub mod trace;
pub mod turn;

pub use conversation::ConversationConfig;
pub use error::{Error, Result};
pub use message::{Message, Role};
pub use persona::PersonaProfile;
pub use sampling::SamplingParams;
pub use turn::{Directive, DirectiveKind, ScheduledDirective, Speaker, Turn};
