//! Chat error taxonomy.

/// Everything that can go wrong with a chat turn.
///
/// `Network` and `Status` are transport failures, `Framing` is a per-frame
/// problem that never ends a turn, `Cancelled` is caller-initiated, and
/// `ProtocolIncomplete` / `EmptyAnswer` only surface when the session
/// policy asks for them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("prompt is required")]
    EmptyPrompt,
    #[error("session is busy with another request")]
    TurnInFlight,
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed frame: {0}")]
    Framing(String),
    #[error("stream line exceeds {limit} bytes")]
    LineTooLong { limit: usize },
    #[error("request cancelled")]
    Cancelled,
    #[error("stream ended without a completion marker")]
    ProtocolIncomplete,
    #[error("model returned an empty answer")]
    EmptyAnswer,
}

impl ChatError {
    /// Errors raised before a turn starts; they never touch the history.
    pub fn is_precondition(&self) -> bool {
        matches!(self, ChatError::EmptyPrompt | ChatError::TurnInFlight)
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ChatError::Network(_) | ChatError::Status { .. })
    }
}
