//! Lazy frame sequence over a chunk source.

use std::collections::VecDeque;

use futures_util::Stream;

use crate::error::ChatError;
use crate::transport::ChunkSource;

use super::{DecodedFrame, FrameDecoder, FrameFormat};

/// Pulls chunks from a source only when the caller asks for the next frame.
///
/// Owns the source for the lifetime of one response; dropping the stream
/// releases it.
pub struct FrameStream<S> {
    source: S,
    decoder: FrameDecoder,
    pending: VecDeque<DecodedFrame>,
    deferred_error: Option<ChatError>,
    input_ended: bool,
    failed: bool,
}

impl<S: ChunkSource> FrameStream<S> {
    pub fn new(source: S, format: FrameFormat) -> Self {
        Self {
            source,
            decoder: FrameDecoder::new(format),
            pending: VecDeque::new(),
            deferred_error: None,
            input_ended: false,
            failed: false,
        }
    }

    /// Whether the completion sentinel was decoded.
    pub fn saw_sentinel(&self) -> bool {
        self.decoder.is_done()
    }

    /// Next frame in transport order, `Ok(None)` at logical end of stream.
    ///
    /// End of stream is either the sentinel (remaining transport bytes are
    /// never read) or the end of input after the residual line is flushed.
    /// After an error the stream yields nothing more.
    pub async fn next_frame(&mut self) -> Result<Option<DecodedFrame>, ChatError> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(Some(frame));
            }
            if self.failed {
                return Ok(None);
            }
            if let Some(err) = self.deferred_error.take() {
                self.failed = true;
                return Err(err);
            }
            if self.decoder.is_done() || self.input_ended {
                return Ok(None);
            }

            let chunk = match self.source.read().await {
                Ok(chunk) => chunk,
                Err(err) => {
                    self.failed = true;
                    return Err(err);
                }
            };

            let mut frames = Vec::new();
            let decoded = match chunk {
                Some(chunk) => self.decoder.push(&chunk, &mut frames),
                None => {
                    self.input_ended = true;
                    self.decoder.finish().map(|residual| frames.extend(residual))
                }
            };
            self.pending.extend(frames);
            if let Err(err) = decoded {
                self.deferred_error = Some(err);
            }
        }
    }

    /// Adapt into a `Stream` of frames for combinator-style consumers.
    pub fn into_stream(self) -> impl Stream<Item = Result<DecodedFrame, ChatError>> {
        futures_util::stream::unfold(self, |mut frames| async move {
            match frames.next_frame().await {
                Ok(Some(frame)) => Some((Ok(frame), frames)),
                Ok(None) => None,
                Err(err) => Some((Err(err), frames)),
            }
        })
    }
}
