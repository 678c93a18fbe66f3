//! Chat turn policy configuration.

use serde::{Deserialize, Serialize};

/// How a turn that ends in a soft anomaly is resolved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnswerPolicy {
    /// Mark the turn complete.
    #[default]
    Complete,
    /// Mark the turn errored with a diagnostic.
    Error,
}

/// Chat session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Substring in a prompt that attaches the open document as context.
    pub context_trigger: String,
    /// Resolution of a turn that received no content at all.
    pub empty_answer: AnswerPolicy,
    /// Resolution of a stream that ended without the done sentinel.
    pub missing_sentinel: AnswerPolicy,
    /// Cancel a turn that runs longer than this (0 = never).
    pub turn_timeout_secs: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            context_trigger: "@writer".into(),
            empty_answer: AnswerPolicy::Complete,
            missing_sentinel: AnswerPolicy::Complete,
            turn_timeout_secs: 0,
        }
    }
}
