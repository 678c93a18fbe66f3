//! reqwest-backed document store against the backend's `/files` routes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::transport::{backend_message, ERROR_BODY_LIMIT};

use super::{check_upsert, Document, DocumentError, DocumentStore, DocumentSummary};

pub struct HttpDocumentStore {
    base: Url,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct FileList {
    files: Vec<DocumentSummary>,
}

#[derive(Deserialize)]
struct FileEnvelope {
    file: Document,
}

#[derive(Serialize)]
struct SaveRequest<'a> {
    title: &'a str,
    content: &'a str,
}

impl HttpDocumentStore {
    pub fn new(base_url: &str, connect_timeout: Duration) -> Result<Self, DocumentError> {
        let base = Url::parse(base_url)
            .map_err(|e| DocumentError::Invalid(format!("bad base URL {base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(DocumentError::Invalid(format!(
                "base URL cannot carry a path: {base_url}"
            )));
        }
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| DocumentError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { base, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `{base}/files` or `{base}/files/{title}` with the title percent-encoded.
    fn files_url(&self, title: Option<&str>) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("files");
            if let Some(title) = title {
                segments.push(title);
            }
        }
        url
    }

    async fn check(
        response: reqwest::Response,
        title: Option<&str>,
    ) -> Result<reqwest::Response, DocumentError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = error_body(response).await;
        let message = backend_message(&body);
        debug!(%status, %message, "Document request failed");
        Err(match (status, title) {
            (StatusCode::NOT_FOUND, Some(title)) => DocumentError::NotFound(title.to_string()),
            (StatusCode::BAD_REQUEST, _) => DocumentError::Invalid(message),
            _ => DocumentError::Backend(format!("HTTP {}: {message}", status.as_u16())),
        })
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, DocumentError> {
        response
            .json()
            .await
            .map_err(|e| DocumentError::Backend(format!("unexpected response: {e}")))
    }
}

/// At most `ERROR_BODY_LIMIT` bytes of an error response.
async fn error_body(mut response: reqwest::Response) -> Vec<u8> {
    let mut body = Vec::new();
    while body.len() < ERROR_BODY_LIMIT {
        match response.chunk().await {
            Ok(Some(chunk)) => body.extend_from_slice(&chunk),
            Ok(None) | Err(_) => break,
        }
    }
    body.truncate(ERROR_BODY_LIMIT);
    body
}

fn network(err: reqwest::Error) -> DocumentError {
    DocumentError::Network(err.to_string())
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn list(&self) -> Result<Vec<DocumentSummary>, DocumentError> {
        let response = self
            .http
            .get(self.files_url(None))
            .send()
            .await
            .map_err(network)?;
        let list: FileList = Self::parse(Self::check(response, None).await?).await?;
        Ok(list.files)
    }

    async fn get(&self, title: &str) -> Result<Document, DocumentError> {
        let response = self
            .http
            .get(self.files_url(Some(title)))
            .send()
            .await
            .map_err(network)?;
        let envelope: FileEnvelope = Self::parse(Self::check(response, Some(title)).await?).await?;
        Ok(envelope.file)
    }

    async fn upsert(&self, title: &str, content: &str) -> Result<(), DocumentError> {
        check_upsert(title, content)?;
        let response = self
            .http
            .post(self.files_url(None))
            .json(&SaveRequest { title, content })
            .send()
            .await
            .map_err(network)?;
        Self::check(response, None).await?;
        debug!(title, bytes = content.len(), "Document saved");
        Ok(())
    }

    async fn delete(&self, title: &str) -> Result<(), DocumentError> {
        let response = self
            .http
            .delete(self.files_url(Some(title)))
            .send()
            .await
            .map_err(network)?;
        Self::check(response, Some(title)).await?;
        debug!(title, "Document deleted");
        Ok(())
    }
}
