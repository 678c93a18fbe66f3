//! reqwest-backed transport.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use tracing::debug;

use crate::error::ChatError;

use super::{ChatRequest, ChatTransport, ChunkSource, OpenedResponse};

/// POSTs `{prompt, context}` to the chat endpoint and streams the answer.
///
/// Only the connect phase is bounded; a streaming answer may take as
/// long as the backend needs.
pub struct HttpTransport {
    url: String,
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, connect_timeout: Duration) -> Result<Self, ChatError> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ChatError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            url: url.into(),
            http,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn open(&self, request: &ChatRequest) -> Result<OpenedResponse, ChatError> {
        debug!(
            url = %self.url,
            prompt_len = request.prompt.len(),
            context_len = request.context.len(),
            "Chat stream request"
        );

        let response = self
            .http
            .post(&self.url)
            .header("accept", "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        debug!(status, "Chat stream opened");
        Ok(OpenedResponse::new(status, HttpChunkSource::new(response)))
    }
}

/// Response body as a chunk source. Dropping it closes the connection.
pub struct HttpChunkSource {
    chunks: BoxStream<'static, Result<Vec<u8>, reqwest::Error>>,
}

impl HttpChunkSource {
    pub fn new(response: reqwest::Response) -> Self {
        Self {
            chunks: response
                .bytes_stream()
                .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
                .boxed(),
        }
    }
}

#[async_trait]
impl ChunkSource for HttpChunkSource {
    async fn read(&mut self) -> Result<Option<Vec<u8>>, ChatError> {
        match self.chunks.next().await {
            Some(Ok(chunk)) => Ok(Some(chunk)),
            Some(Err(e)) => Err(ChatError::Network(e.to_string())),
            None => Ok(None),
        }
    }
}
