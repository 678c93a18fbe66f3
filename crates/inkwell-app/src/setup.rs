//! Builds the chat session and document store from config.

use std::sync::Arc;
use std::time::Duration;

use inkwell_ai::{
    ChatSession, CompletionPolicy, ContextTrigger, DocumentStore, FrameFormat, HttpDocumentStore,
    HttpTransport, TurnPolicy,
};
use inkwell_common::InkwellError;
use inkwell_config::{AnswerPolicy, InkwellConfig};

pub struct Components {
    pub session: Arc<ChatSession>,
    pub documents: Arc<dyn DocumentStore>,
    pub trigger: ContextTrigger,
    pub turn_timeout: Option<Duration>,
}

pub fn frame_format(config: &InkwellConfig) -> FrameFormat {
    let framing = &config.framing;
    FrameFormat {
        event_prefix: framing.event_prefix.clone(),
        done_sentinel: framing.done_sentinel.clone(),
        content_field: framing.content_field.clone(),
        max_line_bytes: framing.max_line_bytes as usize,
    }
}

pub fn turn_policy(config: &InkwellConfig) -> TurnPolicy {
    TurnPolicy {
        empty_answer: completion(config.chat.empty_answer),
        missing_sentinel: completion(config.chat.missing_sentinel),
    }
}

fn completion(policy: AnswerPolicy) -> CompletionPolicy {
    match policy {
        AnswerPolicy::Complete => CompletionPolicy::Complete,
        AnswerPolicy::Error => CompletionPolicy::Error,
    }
}

/// Zero disables the timeout.
pub fn turn_timeout(config: &InkwellConfig) -> Option<Duration> {
    match config.chat.turn_timeout_secs {
        0 => None,
        secs => Some(Duration::from_secs(u64::from(secs))),
    }
}

pub fn build(config: &InkwellConfig, url_override: Option<&str>) -> Result<Components, InkwellError> {
    let connect_timeout = Duration::from_secs(u64::from(config.backend.connect_timeout_secs));
    let chat_url = url_override.unwrap_or(&config.backend.chat_url);

    let transport = HttpTransport::new(chat_url, connect_timeout)
        .map_err(|e| InkwellError::Chat(e.to_string()))?;
    let documents = HttpDocumentStore::new(&config.documents.base_url, connect_timeout)
        .map_err(|e| InkwellError::Document(e.to_string()))?;

    let session = ChatSession::new(Arc::new(transport))
        .with_frame_format(frame_format(config))
        .with_policy(turn_policy(config));

    tracing::info!(
        session = %session.id(),
        chat_url,
        documents_url = %config.documents.base_url,
        "Chat session ready"
    );

    Ok(Components {
        session: Arc::new(session),
        documents: Arc::new(documents),
        trigger: ContextTrigger::new(config.chat.context_trigger.clone()),
        turn_timeout: turn_timeout(config),
    })
}
