//! Conversation turns and their lifecycle.

use inkwell_common::TurnId;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnStatus {
    Pending,
    Streaming,
    Complete,
    Errored,
}

impl TurnStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TurnStatus::Complete | TurnStatus::Errored)
    }
}

/// One message in a conversation.
///
/// Only the owning session mutates a turn. Text grows monotonically while
/// the turn is in flight and is frozen once the status is terminal.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationTurn {
    id: TurnId,
    role: Role,
    text: String,
    status: TurnStatus,
}

impl ConversationTurn {
    pub(crate) fn user(text: impl Into<String>) -> Self {
        Self {
            id: TurnId::new(),
            role: Role::User,
            text: text.into(),
            status: TurnStatus::Complete,
        }
    }

    pub(crate) fn pending_assistant() -> Self {
        Self {
            id: TurnId::new(),
            role: Role::Assistant,
            text: String::new(),
            status: TurnStatus::Pending,
        }
    }

    pub fn id(&self) -> TurnId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn status(&self) -> TurnStatus {
        self.status
    }

    pub fn is_in_flight(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Append a content fragment. The first fragment moves the turn from
    /// pending to streaming, even when it is empty.
    pub(crate) fn append(&mut self, fragment: &str) -> bool {
        if !self.is_in_flight() {
            return false;
        }
        self.status = TurnStatus::Streaming;
        self.text.push_str(fragment);
        true
    }

    pub(crate) fn complete(&mut self) -> bool {
        if !self.is_in_flight() {
            return false;
        }
        self.status = TurnStatus::Complete;
        true
    }

    /// Mark the turn errored. Accumulated text is kept and the diagnostic
    /// is appended after it; an empty placeholder is replaced outright.
    pub(crate) fn fail(&mut self, diagnostic: &str) -> bool {
        if !self.is_in_flight() {
            return false;
        }
        if self.text.is_empty() {
            self.text = diagnostic.to_string();
        } else {
            self.text.push_str("\n\n[");
            self.text.push_str(diagnostic);
            self.text.push(']');
        }
        self.status = TurnStatus::Errored;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_fragment_starts_streaming() {
        let mut turn = ConversationTurn::pending_assistant();
        assert_eq!(turn.status(), TurnStatus::Pending);
        assert!(turn.append(""));
        assert_eq!(turn.status(), TurnStatus::Streaming);
        assert_eq!(turn.text(), "");
    }

    #[test]
    fn terminal_turn_is_frozen() {
        let mut turn = ConversationTurn::pending_assistant();
        turn.append("Hello");
        assert!(turn.complete());
        assert!(!turn.append(" world"));
        assert!(!turn.fail("late"));
        assert_eq!(turn.text(), "Hello");
        assert_eq!(turn.status(), TurnStatus::Complete);
    }

    #[test]
    fn fail_keeps_partial_text() {
        let mut turn = ConversationTurn::pending_assistant();
        turn.append("Partial ans");
        turn.fail("request cancelled");
        assert_eq!(turn.status(), TurnStatus::Errored);
        assert_eq!(turn.text(), "Partial ans\n\n[request cancelled]");
    }

    #[test]
    fn fail_replaces_empty_placeholder() {
        let mut turn = ConversationTurn::pending_assistant();
        turn.fail("HTTP 500: rate limited");
        assert_eq!(turn.text(), "HTTP 500: rate limited");
    }

    #[test]
    fn user_turn_is_terminal() {
        let turn = ConversationTurn::user("hi");
        assert_eq!(turn.role(), Role::User);
        assert!(!turn.is_in_flight());
    }

    #[test]
    fn serializes_lowercase() {
        let turn = ConversationTurn::pending_assistant();
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["status"], "pending");
    }
}
