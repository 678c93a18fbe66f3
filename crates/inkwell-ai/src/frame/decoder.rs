//! Incremental line framing and frame classification.

use crate::error::ChatError;

use super::{DecodedFrame, FrameFormat};

/// Turns arbitrarily fragmented chunks into frames.
///
/// Holds the tail of the last unterminated line between chunks. Works on
/// bytes, so a multi-byte character split across two chunks is decoded
/// only once its line is complete.
#[derive(Debug)]
pub struct FrameDecoder {
    format: FrameFormat,
    line_buffer: Vec<u8>,
    done: bool,
}

impl FrameDecoder {
    pub fn new(format: FrameFormat) -> Self {
        Self {
            format,
            line_buffer: Vec::new(),
            done: false,
        }
    }

    /// Whether the completion sentinel has been decoded.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Bytes currently held for an unterminated line.
    pub fn buffered(&self) -> usize {
        self.line_buffer.len()
    }

    /// Feed one chunk, pushing a frame onto `out` for every event line it
    /// completes. Frames decoded before an error stay in `out`.
    pub fn push(&mut self, chunk: &[u8], out: &mut Vec<DecodedFrame>) -> Result<(), ChatError> {
        if self.done {
            return Ok(());
        }

        let mut rest = chunk;
        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            let head = &rest[..pos];
            rest = &rest[pos + 1..];

            let frame = if self.line_buffer.is_empty() {
                self.check_len(head.len())?;
                self.classify(head)
            } else {
                self.line_buffer.extend_from_slice(head);
                let line = std::mem::take(&mut self.line_buffer);
                self.check_len(line.len())?;
                self.classify(&line)
            };

            if let Some(frame) = frame {
                out.push(frame);
                if self.done {
                    return Ok(());
                }
            }
        }

        self.line_buffer.extend_from_slice(rest);
        self.check_len(self.line_buffer.len())
    }

    /// Flush the residual unterminated line at end of input.
    ///
    /// The residual gets one best-effort classification; the buffer is
    /// cleared either way.
    pub fn finish(&mut self) -> Result<Option<DecodedFrame>, ChatError> {
        let line = std::mem::take(&mut self.line_buffer);
        if self.done || line.is_empty() {
            return Ok(None);
        }
        self.check_len(line.len())?;
        Ok(self.classify(&line))
    }

    fn check_len(&self, len: usize) -> Result<(), ChatError> {
        if len > self.format.max_line_bytes {
            return Err(ChatError::LineTooLong {
                limit: self.format.max_line_bytes,
            });
        }
        Ok(())
    }

    fn classify(&mut self, line: &[u8]) -> Option<DecodedFrame> {
        let text = String::from_utf8_lossy(line);
        let frame = classify_line(&self.format, &text);
        if frame == Some(DecodedFrame::Done) {
            self.done = true;
        }
        frame
    }
}

/// Classify one complete line.
///
/// Returns `None` for lines that carry no event (blank lines, comments,
/// other fields, or an event line with an empty payload).
pub fn classify_line(format: &FrameFormat, line: &str) -> Option<DecodedFrame> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let payload = line.strip_prefix(format.event_prefix.as_str())?.trim();

    if payload.is_empty() {
        return None;
    }
    if payload == format.done_sentinel {
        return Some(DecodedFrame::Done);
    }

    let text = serde_json::from_str::<serde_json::Value>(payload)
        .ok()
        .and_then(|value| {
            value
                .get(&format.content_field)
                .and_then(|field| field.as_str())
                .map(String::from)
        });

    Some(match text {
        Some(text) => DecodedFrame::Content(text),
        None => DecodedFrame::Unparseable(payload.to_string()),
    })
}
