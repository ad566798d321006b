//! Role-inverting history builder.
//!
//! Turns a speaker-tagged transcript into the message list one participant
//! sees: its own turns as "assistant", the other's as "user", a bounded
//! window of regular turns, and only the directives addressed to it.

pub mod builder;
pub mod injection;
pub mod report;
pub mod window;

pub use builder::{build_context, wire_role, ContextPack, ContextSuffix, HistoryBuilder};
pub use report::ContextReport;
