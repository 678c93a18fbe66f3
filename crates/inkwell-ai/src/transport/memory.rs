//! In-memory transport doubles.
//!
//! `ScriptedChunks` replays a fixed chunk script, `ChannelChunks` lets a
//! test feed chunks while the session is already reading, and
//! `ScriptedTransport` hands out prepared responses while recording every
//! request it receives.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::ChatError;

use super::{ChatRequest, ChatTransport, ChunkSource, OpenedResponse};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A fixed sequence of chunks, optionally ending in a read error.
pub struct ScriptedChunks {
    script: VecDeque<Result<Vec<u8>, ChatError>>,
    remaining: Arc<AtomicUsize>,
    released: Arc<AtomicBool>,
}

impl ScriptedChunks {
    pub fn new<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        let script: VecDeque<_> = chunks.into_iter().map(|c| Ok(c.into())).collect();
        Self {
            remaining: Arc::new(AtomicUsize::new(script.len())),
            script,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::<Vec<u8>>::new())
    }

    /// Fail the read that follows the last scripted chunk.
    pub fn then_fail(mut self, err: ChatError) -> Self {
        self.script.push_back(Err(err));
        self.remaining.fetch_add(1, Ordering::SeqCst);
        self
    }

    /// Number of scripted reads not yet consumed.
    pub fn remaining_handle(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.remaining)
    }

    /// Set once this source has been dropped.
    pub fn release_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.released)
    }
}

impl Drop for ScriptedChunks {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChunkSource for ScriptedChunks {
    async fn read(&mut self) -> Result<Option<Vec<u8>>, ChatError> {
        match self.script.pop_front() {
            Some(next) => {
                self.remaining.fetch_sub(1, Ordering::SeqCst);
                next.map(Some)
            }
            None => Ok(None),
        }
    }
}

/// Chunks pushed live from the other end of a channel.
///
/// Reads wait until the sender pushes something; dropping the sender ends
/// the input.
pub struct ChannelChunks {
    rx: mpsc::UnboundedReceiver<Result<Vec<u8>, ChatError>>,
    released: Arc<AtomicBool>,
}

/// Sending half of [`ChannelChunks`].
#[derive(Clone)]
pub struct ChunkSender {
    tx: mpsc::UnboundedSender<Result<Vec<u8>, ChatError>>,
}

pub fn channel_chunks() -> (ChunkSender, ChannelChunks) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        ChunkSender { tx },
        ChannelChunks {
            rx,
            released: Arc::new(AtomicBool::new(false)),
        },
    )
}

impl ChunkSender {
    /// Push a chunk. Returns false once the reader has been dropped.
    pub fn send(&self, chunk: impl Into<Vec<u8>>) -> bool {
        self.tx.send(Ok(chunk.into())).is_ok()
    }

    /// Make the next read fail.
    pub fn fail(&self, err: ChatError) -> bool {
        self.tx.send(Err(err)).is_ok()
    }

    /// Whether the reading side is gone.
    pub fn is_released(&self) -> bool {
        self.tx.is_closed()
    }
}

impl ChannelChunks {
    pub fn release_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.released)
    }
}

impl Drop for ChannelChunks {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChunkSource for ChannelChunks {
    async fn read(&mut self) -> Result<Option<Vec<u8>>, ChatError> {
        match self.rx.recv().await {
            Some(next) => next.map(Some),
            None => Ok(None),
        }
    }
}

/// Hands out prepared responses in order and records each request.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<OpenedResponse, ChatError>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with the given status and body.
    pub fn respond(self, status: u16, body: impl ChunkSource + 'static) -> Self {
        lock(&self.responses).push_back(Ok(OpenedResponse::new(status, body)));
        self
    }

    /// Queue a failure to open the request at all.
    pub fn refuse(self, err: ChatError) -> Self {
        lock(&self.responses).push_back(Err(err));
        self
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn open(&self, request: &ChatRequest) -> Result<OpenedResponse, ChatError> {
        lock(&self.requests).push(request.clone());
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| Err(ChatError::Network("no scripted response left".into())))
    }
}
