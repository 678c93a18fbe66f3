//! Terminal rendering of streaming turns.

use std::io::Write;
use std::sync::{Mutex, MutexGuard};

use inkwell_ai::{ConversationTurn, TurnObserver, TurnOutcome};
use inkwell_common::TurnId;
use tracing::debug;

struct Progress<W> {
    out: W,
    turn: Option<TurnId>,
    printed: usize,
}

/// Prints only the text a turn gained since the last update.
///
/// Turn text only ever grows (failure diagnostics are appended or replace
/// an empty placeholder), so the printed part is always a prefix.
pub struct TerminalRenderer<W: Write + Send> {
    progress: Mutex<Progress<W>>,
}

impl TerminalRenderer<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            progress: Mutex::new(Progress {
                out,
                turn: None,
                printed: 0,
            }),
        }
    }
}

impl<W: Write> Progress<W> {
    /// Write what `turn` gained. `printed` only advances once the write
    /// went through, so a failed write is retried with the next update.
    fn render(&mut self, turn: &ConversationTurn) -> std::io::Result<()> {
        if self.turn != Some(turn.id()) {
            self.turn = Some(turn.id());
            self.printed = 0;
        }

        let text = turn.text();
        let fresh = text.get(self.printed..).unwrap_or_default();
        self.out.write_all(fresh.as_bytes())?;
        self.printed = text.len();

        if turn.status().is_terminal() {
            self.out.write_all(b"\n")?;
        }
        self.out.flush()
    }
}

impl<W: Write + Send> TerminalRenderer<W> {
    fn progress(&self) -> MutexGuard<'_, Progress<W>> {
        self.progress
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> TurnObserver for TerminalRenderer<W> {
    fn on_turn_update(&self, turn: &ConversationTurn) {
        if let Err(e) = self.progress().render(turn) {
            debug!(error = %e, turn = %turn.id(), "Terminal write failed");
        }
    }

    fn on_turn_finished(&self, outcome: &TurnOutcome) {
        if outcome.rejected_frames == 0 {
            return;
        }
        let mut progress = self.progress();
        let written = writeln!(
            progress.out,
            "({} malformed frame(s) skipped)",
            outcome.rejected_frames
        )
        .and_then(|()| progress.out.flush());
        if let Err(e) = written {
            debug!(error = %e, "Terminal write failed");
        }
    }
}
