//! Session types, policies, and the busy guard.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::ChatError;
use crate::turn::ConversationTurn;

use super::manager::ChatSession;

/// Resolution of a turn that ended in a soft anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionPolicy {
    #[default]
    Complete,
    Error,
}

/// How a session resolves turns that end without a transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TurnPolicy {
    /// Applied when no content frame arrived at all.
    pub empty_answer: CompletionPolicy,
    /// Applied when the input ended without the done sentinel.
    pub missing_sentinel: CompletionPolicy,
}

/// Final report for one turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The assistant turn in its terminal state.
    pub turn: ConversationTurn,
    /// Event lines that failed to parse and were skipped.
    pub rejected_frames: usize,
    /// Content frames appended, including empty ones.
    pub content_frames: usize,
    pub saw_sentinel: bool,
    /// Why the turn errored, if it did.
    pub error: Option<ChatError>,
}

/// Clears the `busy` flag on drop, so it is released on every exit path
/// including a dropped future.
pub(crate) struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Result<Self, ChatError> {
        if flag
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(ChatError::TurnInFlight);
        }
        Ok(Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Settles the active turn if `submit` is dropped before it finishes, e.g.
/// by a timeout wrapped around it. The turn ends `errored` as cancelled,
/// keeping its partial text.
pub(crate) struct TurnGuard<'a> {
    session: &'a ChatSession,
    armed: bool,
}

impl<'a> TurnGuard<'a> {
    pub(crate) fn new(session: &'a ChatSession) -> Self {
        Self {
            session,
            armed: true,
        }
    }

    /// The turn was finalized normally.
    pub(crate) fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.session.abandon_turn();
        }
    }
}
