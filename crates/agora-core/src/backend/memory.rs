//! In-memory backend.
//!
//! Records every call and can be told to fail any of them. Used by tests and
//! by the desktop `--memory` mode, which leaves nothing on disk.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use ulid::Ulid;

use super::{forward_broadcast, BlobStore, ChatBackend, FeedEvent, FeedHandler, MessageStore};
use super::{RealtimeFeed, Subscription};
use crate::error::{ChatError, ChatResult};
use crate::message::{Message, NewMessage};

const FEED_CAPACITY: usize = 256;
const URL_PREFIX: &str = "memory://";

/// Which call to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Fetch,
    Insert,
    Delete,
    Upload,
    Download,
    Subscribe,
}

#[derive(Default)]
struct Failures {
    fetch: AtomicBool,
    insert: AtomicBool,
    delete: AtomicBool,
    upload: AtomicBool,
    download: AtomicBool,
    subscribe: AtomicBool,
}

impl Failures {
    fn flag(&self, point: FailPoint) -> &AtomicBool {
        match point {
            FailPoint::Fetch => &self.fetch,
            FailPoint::Insert => &self.insert,
            FailPoint::Delete => &self.delete,
            FailPoint::Upload => &self.upload,
            FailPoint::Download => &self.download,
            FailPoint::Subscribe => &self.subscribe,
        }
    }

    fn check(&self, point: FailPoint) -> ChatResult<()> {
        if self.flag(point).load(Ordering::SeqCst) {
            return Err(ChatError::Backend {
                status: 503,
                body: format!("injected {:?} failure", point),
            });
        }
        Ok(())
    }
}

/// Backend that keeps everything in memory
pub struct MemoryBackend {
    messages: Mutex<Vec<Message>>,
    blobs: Mutex<HashMap<String, Bytes>>,
    inserts: Mutex<Vec<NewMessage>>,
    uploads: Mutex<Vec<(String, String)>>,
    failures: Failures,
    fetch_delay: Mutex<Option<Duration>>,
    events: broadcast::Sender<FeedEvent>,
    opened: AtomicUsize,
    closed: Arc<AtomicUsize>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            messages: Mutex::new(Vec::new()),
            blobs: Mutex::new(HashMap::new()),
            inserts: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            failures: Failures::default(),
            fetch_delay: Mutex::new(None),
            events,
            opened: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make the given call fail (or succeed again)
    pub fn set_failing(&self, point: FailPoint, failing: bool) {
        self.failures.flag(point).store(failing, Ordering::SeqCst);
    }

    /// Delay `fetch_all` after it has taken its snapshot
    pub fn set_fetch_delay(&self, delay: Option<Duration>) {
        *self.fetch_delay.lock() = delay;
    }

    /// Insert a row as another participant would, publishing it on the feed.
    pub fn push_remote(&self, message: NewMessage) -> Message {
        let message = message.into_message(Ulid::new().to_string(), Utc::now());
        self.messages.lock().push(message.clone());
        let _ = self.events.send(FeedEvent::Inserted(message.clone()));
        message
    }

    /// Add rows to history without publishing them
    pub fn seed(&self, messages: impl IntoIterator<Item = Message>) {
        self.messages.lock().extend(messages);
    }

    /// Publish an event without touching the stored rows
    pub fn emit(&self, event: FeedEvent) {
        let _ = self.events.send(event);
    }

    /// Insert payloads received so far, in order
    pub fn inserts(&self) -> Vec<NewMessage> {
        self.inserts.lock().clone()
    }

    /// `(object name, mime)` of every upload so far
    pub fn uploads(&self) -> Vec<(String, String)> {
        self.uploads.lock().clone()
    }

    /// Stored rows
    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().clone()
    }

    pub fn subscriptions_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn subscriptions_closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageStore for MemoryBackend {
    async fn fetch_all(&self) -> ChatResult<Vec<Message>> {
        self.failures.check(FailPoint::Fetch)?;
        let mut snapshot = self.messages.lock().clone();
        snapshot.sort_by_key(|m| m.created_at);

        let delay = *self.fetch_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(snapshot)
    }

    async fn insert(&self, message: NewMessage) -> ChatResult<()> {
        self.failures.check(FailPoint::Insert)?;
        self.inserts.lock().push(message.clone());
        self.push_remote(message);
        Ok(())
    }

    async fn delete(&self, id: &str) -> ChatResult<()> {
        self.failures.check(FailPoint::Delete)?;
        let removed = {
            let mut messages = self.messages.lock();
            let before = messages.len();
            messages.retain(|m| m.id != id);
            messages.len() != before
        };
        if !removed {
            return Err(ChatError::MessageNotFound(id.to_string()));
        }
        let _ = self.events.send(FeedEvent::Deleted { id: id.to_string() });
        Ok(())
    }
}

#[async_trait]
impl RealtimeFeed for MemoryBackend {
    async fn subscribe(&self, handler: FeedHandler) -> ChatResult<Box<dyn Subscription>> {
        self.failures.check(FailPoint::Subscribe)?;
        self.opened.fetch_add(1, Ordering::SeqCst);

        let closed = self.closed.clone();
        let sub = forward_broadcast(self.events.subscribe(), handler).on_close(move || {
            closed.fetch_add(1, Ordering::SeqCst);
        });
        Ok(Box::new(sub))
    }
}

#[async_trait]
impl BlobStore for MemoryBackend {
    async fn put(&self, name: &str, data: Bytes, mime: &str) -> ChatResult<String> {
        self.failures.check(FailPoint::Upload)?;
        self.uploads.lock().push((name.to_string(), mime.to_string()));
        let url = format!("{}{}", URL_PREFIX, name);
        self.blobs.lock().insert(url.clone(), data);
        Ok(url)
    }

    async fn fetch(&self, url: &str) -> ChatResult<Bytes> {
        self.failures.check(FailPoint::Download)?;
        self.blobs
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| ChatError::BlobNotFound(url.to_string()))
    }
}

impl ChatBackend for MemoryBackend {
    fn kind(&self) -> &'static str {
        "memory"
    }
}
