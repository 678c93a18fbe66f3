//! In-process document store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{check_upsert, Document, DocumentError, DocumentStore, DocumentSummary};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
struct Entry {
    id: i64,
    content: String,
    created_at: String,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    entries: BTreeMap<String, Entry>,
}

/// Keeps documents in memory. Same semantics as the HTTP store.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    inner: RwLock<Inner>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list(&self) -> Result<Vec<DocumentSummary>, DocumentError> {
        let inner = self.inner.read().await;
        let mut summaries: Vec<DocumentSummary> = inner
            .entries
            .iter()
            .map(|(title, entry)| DocumentSummary {
                id: entry.id,
                title: title.clone(),
                created_at: entry.created_at.clone(),
            })
            .collect();
        summaries.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(summaries)
    }

    async fn get(&self, title: &str) -> Result<Document, DocumentError> {
        let inner = self.inner.read().await;
        inner
            .entries
            .get(title)
            .map(|entry| Document {
                title: title.to_string(),
                content: entry.content.clone(),
                created_at: entry.created_at.clone(),
            })
            .ok_or_else(|| DocumentError::NotFound(title.to_string()))
    }

    async fn upsert(&self, title: &str, content: &str) -> Result<(), DocumentError> {
        check_upsert(title, content)?;
        let mut inner = self.inner.write().await;
        if let Some(entry) = inner.entries.get_mut(title) {
            entry.content = content.to_string();
            return Ok(());
        }
        inner.next_id += 1;
        let entry = Entry {
            id: inner.next_id,
            content: content.to_string(),
            created_at: chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string(),
        };
        inner.entries.insert(title.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, title: &str) -> Result<(), DocumentError> {
        let mut inner = self.inner.write().await;
        match inner.entries.remove(title) {
            Some(_) => Ok(()),
            None => Err(DocumentError::NotFound(title.to_string())),
        }
    }
}
