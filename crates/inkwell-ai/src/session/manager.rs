//! Session struct, history access, and the single turn mutation point.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use inkwell_common::SessionId;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::ChatError;
use crate::frame::FrameFormat;
use crate::observer::TurnObserver;
use crate::transport::ChatTransport;
use crate::turn::{ConversationTurn, Role};

use super::types::{TurnOutcome, TurnPolicy};

/// A conversation with one language-model backend.
pub struct ChatSession {
    pub(super) id: SessionId,
    pub(super) transport: Arc<dyn ChatTransport>,
    pub(super) format: FrameFormat,
    pub(super) policy: TurnPolicy,
    pub(super) state: Mutex<SessionState>,
    pub(super) observers: Mutex<Vec<Arc<dyn TurnObserver>>>,
    /// Whether a turn is currently being driven.
    pub(super) busy: AtomicBool,
}

#[derive(Default)]
pub(super) struct SessionState {
    /// Finished turns, oldest first.
    pub(super) history: Vec<ConversationTurn>,
    /// The one assistant turn in flight.
    pub(super) active: Option<ConversationTurn>,
    pub(super) cancel: Option<CancellationToken>,
}

/// Changes the session may make to the active turn.
pub(super) enum TurnUpdate<'a> {
    Append(&'a str),
    Complete,
    Fail(&'a ChatError),
}

impl ChatSession {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            id: SessionId::new(),
            transport,
            format: FrameFormat::default(),
            policy: TurnPolicy::default(),
            state: Mutex::new(SessionState::default()),
            observers: Mutex::new(Vec::new()),
            busy: AtomicBool::new(false),
        }
    }

    pub fn with_frame_format(mut self, format: FrameFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_policy(mut self, policy: TurnPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn policy(&self) -> TurnPolicy {
        self.policy
    }

    /// Register an observer for turn changes.
    pub fn subscribe(&self, observer: Arc<dyn TurnObserver>) {
        lock(&self.observers).push(observer);
    }

    /// Whether a turn is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// All turns, oldest first, including the one in flight.
    pub fn turns(&self) -> Vec<ConversationTurn> {
        let state = lock(&self.state);
        let mut turns = state.history.clone();
        turns.extend(state.active.clone());
        turns
    }

    /// Snapshot of the assistant turn in flight.
    pub fn active_turn(&self) -> Option<ConversationTurn> {
        lock(&self.state).active.clone()
    }

    /// The most recent finished assistant turn.
    pub fn last_answer(&self) -> Option<ConversationTurn> {
        lock(&self.state)
            .history
            .iter()
            .rev()
            .find(|turn| turn.role() == Role::Assistant)
            .cloned()
    }

    /// Cancel the turn in flight. Returns false when there is nothing to
    /// cancel.
    pub fn cancel(&self) -> bool {
        let state = lock(&self.state);
        match &state.cancel {
            Some(token) if !token.is_cancelled() => {
                token.cancel();
                info!(session = %self.id, "Turn cancellation requested");
                true
            }
            _ => false,
        }
    }

    /// Drop the conversation history.
    pub fn clear(&self) -> Result<(), ChatError> {
        if self.is_busy() {
            return Err(ChatError::TurnInFlight);
        }
        lock(&self.state).history.clear();
        Ok(())
    }

    /// Apply one update to the active turn and notify observers.
    ///
    /// This is the only place the in-flight turn is mutated. Returns the
    /// post-update snapshot, or `None` if nothing changed.
    pub(super) fn apply(&self, update: TurnUpdate<'_>) -> Option<ConversationTurn> {
        let snapshot = {
            let mut state = lock(&self.state);
            let turn = state.active.as_mut()?;
            let changed = match update {
                TurnUpdate::Append(fragment) => turn.append(fragment),
                TurnUpdate::Complete => turn.complete(),
                TurnUpdate::Fail(err) => turn.fail(&err.to_string()),
            };
            if !changed {
                return None;
            }
            turn.clone()
        };
        self.notify(|observer| observer.on_turn_update(&snapshot));
        Some(snapshot)
    }

    /// Call `f` for every observer, outside the observer lock.
    pub(super) fn notify(&self, f: impl Fn(&dyn TurnObserver)) {
        let observers = lock(&self.observers).clone();
        for observer in &observers {
            f(observer.as_ref());
        }
    }

    /// Record the prompt and open a pending assistant turn.
    pub(super) fn begin_turn(&self, prompt: &str) -> (ConversationTurn, CancellationToken) {
        let token = CancellationToken::new();
        let turn = ConversationTurn::pending_assistant();
        {
            let mut state = lock(&self.state);
            state.history.push(ConversationTurn::user(prompt));
            state.active = Some(turn.clone());
            state.cancel = Some(token.clone());
        }
        self.notify(|observer| observer.on_turn_update(&turn));
        (turn, token)
    }

    /// Move the active turn into the history.
    pub(super) fn end_turn(&self) -> Option<ConversationTurn> {
        let mut state = lock(&self.state);
        state.cancel = None;
        let turn = state.active.take()?;
        state.history.push(turn.clone());
        Some(turn)
    }

    /// Fail and record the active turn after its driver went away.
    pub(super) fn abandon_turn(&self) {
        self.apply(TurnUpdate::Fail(&ChatError::Cancelled));
        if let Some(turn) = self.end_turn() {
            warn!(session = %self.id, turn = %turn.id(), "Turn dropped before it finished");
        }
    }

    pub(super) fn notify_finished(&self, outcome: &TurnOutcome) {
        self.notify(|observer| observer.on_turn_finished(outcome));
    }
}

pub(super) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
