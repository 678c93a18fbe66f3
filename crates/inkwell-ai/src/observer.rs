//! Change notifications for presentation layers.

use crate::session::TurnOutcome;
use crate::turn::ConversationTurn;

/// Receives a snapshot of the assistant turn whenever it changes.
///
/// Called on the session's task, outside any internal lock; keep
/// implementations quick (queue work elsewhere if rendering is slow).
pub trait TurnObserver: Send + Sync {
    /// The turn was created, grew, or reached a terminal status.
    fn on_turn_update(&self, turn: &ConversationTurn);

    /// An event line could not be parsed and was skipped.
    fn on_frame_rejected(&self, _turn: &ConversationTurn, _raw: &str) {}

    /// The turn is over and has moved into the history.
    fn on_turn_finished(&self, _outcome: &TurnOutcome) {}
}

impl<F> TurnObserver for F
where
    F: Fn(&ConversationTurn) + Send + Sync,
{
    fn on_turn_update(&self, turn: &ConversationTurn) {
        self(turn)
    }
}
