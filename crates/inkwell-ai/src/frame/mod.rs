//! Frame decoding for the line-delimited event stream.
//!
//! The backend answers with lines of the form `data: {"response":"..."}`
//! and terminates with `data: [DONE]`. Chunks arrive with arbitrary
//! boundaries, so the decoder buffers the unterminated tail of each chunk
//! and only classifies complete lines.

mod decoder;
mod stream;


pub use decoder::{classify_line, FrameDecoder};
pub use stream::FrameStream;

/// One logical event extracted from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedFrame {
    /// A text fragment to append to the answer.
    Content(String),
    /// The completion sentinel; nothing after it is read.
    Done,
    /// An event line whose payload could not be parsed. Reported, then skipped.
    Unparseable(String),
}

/// Framing parameters of the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameFormat {
    /// Prefix marking an event line (`data:`).
    pub event_prefix: String,
    /// Payload that ends the stream (`[DONE]`).
    pub done_sentinel: String,
    /// JSON field carrying the text fragment (`response`).
    pub content_field: String,
    /// Longest line the decoder will hold.
    pub max_line_bytes: usize,
}

impl Default for FrameFormat {
    fn default() -> Self {
        Self {
            event_prefix: "data:".into(),
            done_sentinel: "[DONE]".into(),
            content_field: "response".into(),
            max_line_bytes: 1024 * 1024,
        }
    }
}
