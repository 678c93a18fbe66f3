//! Transport seam between the chat session and the model backend.
//!
//! The session only needs two capabilities: open a request and read the
//! response body chunk by chunk. `HttpTransport` provides them over
//! reqwest; `memory` holds scripted doubles for tests and offline use.

mod http;
pub mod memory;

pub use http::{HttpChunkSource, HttpTransport};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// Request body sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    pub context: String,
}

/// Pull-based reader over a response body.
#[async_trait]
pub trait ChunkSource: Send {
    /// Next raw chunk, or `Ok(None)` at end of input.
    async fn read(&mut self) -> Result<Option<Vec<u8>>, ChatError>;
}

#[async_trait]
impl<T: ChunkSource + ?Sized> ChunkSource for Box<T> {
    async fn read(&mut self) -> Result<Option<Vec<u8>>, ChatError> {
        (**self).read().await
    }
}

/// An opened response: status plus the unread body.
pub struct OpenedResponse {
    pub status: u16,
    pub body: Box<dyn ChunkSource>,
}

impl OpenedResponse {
    pub fn new(status: u16, body: impl ChunkSource + 'static) -> Self {
        Self {
            status,
            body: Box::new(body),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for OpenedResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenedResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send the request and return once response headers are in.
    async fn open(&self, request: &ChatRequest) -> Result<OpenedResponse, ChatError>;
}

/// Most bytes of an error body worth reading; only a short message is kept.
pub const ERROR_BODY_LIMIT: usize = 16 * 1024;

/// Read a body until it ends or `limit` bytes are in. Anything past the
/// limit is left unread.
pub async fn read_to_end(
    source: &mut (dyn ChunkSource + '_),
    limit: usize,
) -> Result<Vec<u8>, ChatError> {
    let mut body = Vec::new();
    while body.len() < limit {
        match source.read().await? {
            Some(chunk) => body.extend_from_slice(&chunk),
            None => break,
        }
    }
    body.truncate(limit);
    Ok(body)
}

/// Build the error for a non-success response from its status and body.
///
/// Prefers the JSON `error` field (with `details` when present), then the
/// first 200 characters of a plain body, then a generic message.
pub fn status_error(status: u16, body: &[u8]) -> ChatError {
    ChatError::Status {
        status,
        message: backend_message(body),
    }
}

/// Human-readable message from an error response body.
pub(crate) fn backend_message(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();

    if text.is_empty() {
        "request failed".to_string()
    } else if let Some(message) = json_error_message(text) {
        message
    } else {
        text.chars().take(200).collect()
    }
}

fn json_error_message(text: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(text).ok()?;
    let error = json.get("error")?.as_str()?;
    match json.get("details").and_then(|d| d.as_str()) {
        Some(details) if !details.is_empty() => Some(format!("{error}: {details}")),
        _ => Some(error.to_string()),
    }
}
