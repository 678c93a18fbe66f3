//! Document store interface used by the editor and the chat context.
//!
//! Documents are named text blobs keyed by title. The store is a plain
//! key-value collaborator: the chat core only ever reads a document's
//! content to pass it along as context.

mod http;
mod memory;

pub use http::HttpDocumentStore;
pub use memory::MemoryDocumentStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Listing entry for a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: i64,
    pub title: String,
    pub created_at: String,
}

/// A stored document with its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("invalid document: {0}")]
    Invalid(String),
    #[error("document backend error: {0}")]
    Backend(String),
    #[error("network error: {0}")]
    Network(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents, newest first.
    async fn list(&self) -> Result<Vec<DocumentSummary>, DocumentError>;

    async fn get(&self, title: &str) -> Result<Document, DocumentError>;

    /// Create the document or replace its content. Idempotent by title.
    async fn upsert(&self, title: &str, content: &str) -> Result<(), DocumentError>;

    async fn delete(&self, title: &str) -> Result<(), DocumentError>;
}

/// Title and content must both be non-empty.
pub(crate) fn check_upsert(title: &str, content: &str) -> Result<(), DocumentError> {
    if title.trim().is_empty() || content.is_empty() {
        return Err(DocumentError::Invalid(
            "title and content are required".into(),
        ));
    }
    Ok(())
}
