//! Backend endpoint and stream framing configuration.

use serde::{Deserialize, Serialize};

/// Where prompts are sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Streaming chat endpoint (POST `{prompt, context}`).
    pub chat_url: String,
    /// Connect timeout in seconds (valid range: 1-120). The stream itself
    /// has no read timeout.
    pub connect_timeout_secs: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            chat_url: "http://localhost:8787/chat".into(),
            connect_timeout_secs: 10,
        }
    }
}

/// Line framing of the response stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FramingConfig {
    /// Prefix marking an event line.
    pub event_prefix: String,
    /// Payload that ends the stream.
    pub done_sentinel: String,
    /// JSON field carrying the text fragment.
    pub content_field: String,
    /// Longest line the decoder will buffer (valid range: 1 KiB - 64 MiB).
    pub max_line_bytes: u32,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            event_prefix: "data:".into(),
            done_sentinel: "[DONE]".into(),
            content_field: "response".into(),
            max_line_bytes: 1024 * 1024,
        }
    }
}
