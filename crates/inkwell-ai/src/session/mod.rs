//! Streaming chat session.
//!
//! A `ChatSession` owns the conversation history and at most one
//! in-flight assistant turn. `submit` drives a turn from request to a
//! terminal status, appending decoded fragments as they arrive and
//! notifying observers after every change.

mod manager;
mod submit;
mod types;

#[cfg(test)]
mod tests;

pub use manager::ChatSession;
pub use types::{CompletionPolicy, TurnOutcome, TurnPolicy};
