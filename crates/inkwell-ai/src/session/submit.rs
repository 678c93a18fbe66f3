//! Driving one turn: open, validate, consume frames, finalize.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::error::ChatError;
use crate::frame::{DecodedFrame, FrameStream};
use crate::transport::{read_to_end, status_error, ChatRequest, ERROR_BODY_LIMIT};
use crate::turn::ConversationTurn;

use super::manager::{ChatSession, TurnUpdate};
use super::types::{BusyGuard, CompletionPolicy, TurnGuard, TurnOutcome};

/// What happened while a turn was driven.
#[derive(Debug, Default)]
struct DriveReport {
    content_frames: usize,
    rejected_frames: usize,
    saw_sentinel: bool,
    error: Option<ChatError>,
}

impl ChatSession {
    /// Send a prompt and stream the answer into a new assistant turn.
    ///
    /// `context_text` is sent only when `include_context` is true; callers
    /// decide that per prompt (see [`crate::ContextTrigger`]). Returns `Err`
    /// only when the turn could not start: an empty prompt, or another
    /// turn still in flight. Transport and protocol failures end the turn
    /// in `errored` status and are reported in [`TurnOutcome::error`].
    pub async fn submit(
        &self,
        prompt: &str,
        include_context: bool,
        context_text: &str,
    ) -> Result<TurnOutcome, ChatError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ChatError::EmptyPrompt);
        }
        let _guard = BusyGuard::acquire(&self.busy)?;

        let request = ChatRequest {
            prompt: prompt.to_string(),
            context: if include_context {
                context_text.to_string()
            } else {
                String::new()
            },
        };

        let (turn, cancel) = self.begin_turn(prompt);
        let turn_guard = TurnGuard::new(self);
        let span = info_span!("turn", session = %self.id, turn = %turn.id());

        let outcome = async move {
            info!(context_len = request.context.len(), "Prompt submitted");
            let report = self.drive(&request, &cancel).await;
            self.finalize(report, turn)
        }
        .instrument(span)
        .await;
        turn_guard.disarm();
        Ok(outcome)
    }

    async fn drive(&self, request: &ChatRequest, cancel: &CancellationToken) -> DriveReport {
        let mut report = DriveReport::default();

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                report.error = Some(ChatError::Cancelled);
                return report;
            }
            opened = self.transport.open(request) => opened,
        };
        let mut response = match opened {
            Ok(response) => response,
            Err(err) => {
                report.error = Some(err);
                return report;
            }
        };

        if !response.is_success() {
            let body = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    report.error = Some(ChatError::Cancelled);
                    return report;
                }
                body = read_to_end(response.body.as_mut(), ERROR_BODY_LIMIT) => body.unwrap_or_default(),
            };
            report.error = Some(status_error(response.status, &body));
            return report;
        }

        let mut frames = FrameStream::new(response.body, self.format.clone());
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    report.error = Some(ChatError::Cancelled);
                    break;
                }
                next = frames.next_frame() => next,
            };

            match next {
                Ok(Some(DecodedFrame::Content(fragment))) => {
                    report.content_frames += 1;
                    self.apply(TurnUpdate::Append(&fragment));
                }
                Ok(Some(DecodedFrame::Done)) => {
                    report.saw_sentinel = true;
                    break;
                }
                Ok(Some(DecodedFrame::Unparseable(raw))) => {
                    report.rejected_frames += 1;
                    warn!(error = %ChatError::Framing(raw.clone()), "Skipping frame");
                    if let Some(turn) = self.active_turn() {
                        self.notify(|observer| observer.on_frame_rejected(&turn, &raw));
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    report.error = Some(err);
                    break;
                }
            }
        }
        // Release the body before the turn is resolved.
        drop(frames);

        report
    }

    fn finalize(&self, report: DriveReport, pending: ConversationTurn) -> TurnOutcome {
        let error = match report.error {
            Some(err) => Some(err),
            None if !report.saw_sentinel
                && self.policy.missing_sentinel == CompletionPolicy::Error =>
            {
                Some(ChatError::ProtocolIncomplete)
            }
            None if report.content_frames == 0
                && self.policy.empty_answer == CompletionPolicy::Error =>
            {
                Some(ChatError::EmptyAnswer)
            }
            None => None,
        };

        if !report.saw_sentinel && error.is_none() {
            debug!("Stream ended without completion marker, treating as complete");
        }

        match &error {
            Some(ChatError::Cancelled) => info!("Turn cancelled"),
            Some(err) if err.is_transport() => warn!(error = %err, "Transport failed"),
            Some(err) => warn!(error = %err, "Turn failed"),
            None => info!(
                content_frames = report.content_frames,
                rejected_frames = report.rejected_frames,
                "Turn complete"
            ),
        }

        match &error {
            Some(err) => self.apply(TurnUpdate::Fail(err)),
            None => self.apply(TurnUpdate::Complete),
        };

        let turn = self.end_turn().unwrap_or(pending);

        let outcome = TurnOutcome {
            turn,
            rejected_frames: report.rejected_frames,
            content_frames: report.content_frames,
            saw_sentinel: report.saw_sentinel,
            error,
        };
        self.notify_finished(&outcome);
        outcome
    }
}
