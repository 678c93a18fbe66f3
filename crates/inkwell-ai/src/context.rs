//! Opt-in context injection.
//!
//! Document text is attached to a prompt only when the prompt mentions the
//! trigger marker; there is no sticky setting.

pub const DEFAULT_CONTEXT_TRIGGER: &str = "@writer";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextTrigger {
    marker: String,
}

impl ContextTrigger {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Whether this prompt asks for the document as context.
    pub fn detect(&self, prompt: &str) -> bool {
        !self.marker.is_empty() && prompt.contains(&self.marker)
    }
}

impl Default for ContextTrigger {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_TRIGGER)
    }
}
