//! Streaming chat engine for Inkwell.
//!
//! Provides the pieces behind the editor's AI assistant:
//! - Frame decoding of the line-delimited event stream
//! - A transport seam with an HTTP (reqwest) implementation
//! - A single-turn-in-flight chat session with observers and cancellation
//! - Context injection gated by a prompt marker
//! - The document store interface the editor persists through

pub mod context;
pub mod documents;
pub mod error;
pub mod frame;
pub mod observer;
pub mod session;
pub mod transport;
pub mod turn;

pub use context::ContextTrigger;
pub use documents::{
    Document, DocumentError, DocumentStore, DocumentSummary, HttpDocumentStore,
    MemoryDocumentStore,
};
pub use error::ChatError;
pub use frame::{DecodedFrame, FrameDecoder, FrameFormat, FrameStream};
pub use observer::TurnObserver;
pub use session::{ChatSession, CompletionPolicy, TurnOutcome, TurnPolicy};
pub use transport::{ChatRequest, ChatTransport, ChunkSource, HttpTransport, OpenedResponse};
pub use turn::{ConversationTurn, Role, TurnStatus};
