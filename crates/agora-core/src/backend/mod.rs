//! Backend capabilities.
//!
//! The room talks to three narrow capabilities instead of a concrete client:
//!
//! - [`MessageStore`]: list, insert and delete rows of the `messages` table
//! - [`RealtimeFeed`]: push notifications for inserts and deletes
//! - [`BlobStore`]: upload a file and get back a public URL
//!
//! [`ChatBackend`] bundles them. Adapters:
//!
//! - [`LocalBackend`]: redb file plus a blob directory, single process
//! - [`SupabaseBackend`]: hosted REST, storage and realtime endpoints
//! - [`MemoryBackend`]: in-memory, records calls and injects failures

mod local;
mod memory;
mod realtime;
mod supabase;

pub use local::LocalBackend;
pub use memory::{FailPoint, MemoryBackend};
pub use supabase::SupabaseBackend;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, warn};

use crate::error::ChatResult;
use crate::message::{Message, NewMessage};

/// A change pushed by the realtime feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// A row was inserted
    Inserted(Message),
    /// A row was removed
    Deleted { id: String },
    /// The feed stopped on its own; no further events follow
    Disconnected { reason: String },
}

/// Callback invoked for every feed event, from the feed's own task
pub type FeedHandler = Arc<dyn Fn(FeedEvent) + Send + Sync>;

/// A live feed subscription.
///
/// `close` is idempotent. Dropping an open subscription closes it.
pub trait Subscription: Send {
    /// Stop delivering events and release the channel
    fn close(&mut self);

    /// Whether `close` has run
    fn is_closed(&self) -> bool;
}

/// Rows of the shared message table
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// All messages, oldest first
    async fn fetch_all(&self) -> ChatResult<Vec<Message>>;

    /// Insert a message. The new row reaches viewers through the feed.
    async fn insert(&self, message: NewMessage) -> ChatResult<()>;

    /// Remove a message by id
    async fn delete(&self, id: &str) -> ChatResult<()>;
}

/// Push notifications for table changes
#[async_trait]
pub trait RealtimeFeed: Send + Sync {
    /// Start delivering events to `handler`.
    ///
    /// Events that happen after this returns are never missed.
    async fn subscribe(&self, handler: FeedHandler) -> ChatResult<Box<dyn Subscription>>;
}

/// Public object storage for attachments
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `name` and return its public URL
    async fn put(&self, name: &str, data: Bytes, mime: &str) -> ChatResult<String>;

    /// Download the blob behind a public URL
    async fn fetch(&self, url: &str) -> ChatResult<Bytes>;
}

/// Everything the room needs from a backend
pub trait ChatBackend: MessageStore + RealtimeFeed + BlobStore {
    /// Short adapter name for logs and `info` output
    fn kind(&self) -> &'static str;
}

/// Subscription backed by a spawned task that stops on a shutdown signal.
pub(crate) struct TaskSubscription {
    shutdown: Option<oneshot::Sender<()>>,
    on_close: Option<Box<dyn FnOnce() + Send>>,
}

impl TaskSubscription {
    pub(crate) fn new(shutdown: oneshot::Sender<()>) -> Self {
        Self {
            shutdown: Some(shutdown),
            on_close: None,
        }
    }

    /// Run `f` once when the subscription closes
    pub(crate) fn on_close(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_close = Some(Box::new(f));
        self
    }
}

impl Subscription for TaskSubscription {
    fn close(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            // The task may already be gone
            let _ = tx.send(());
            if let Some(f) = self.on_close.take() {
                f();
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.shutdown.is_none()
    }
}

impl Drop for TaskSubscription {
    fn drop(&mut self) {
        self.close();
    }
}

/// Forward an in-process broadcast channel to a feed handler until shut down.
pub(crate) fn forward_broadcast(
    mut rx: broadcast::Receiver<FeedEvent>,
    handler: FeedHandler,
) -> TaskSubscription {
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                event = rx.recv() => match event {
                    Ok(event) => handler(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Feed subscriber lagged, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        handler(FeedEvent::Disconnected {
                            reason: "change feed closed".to_string(),
                        });
                        break;
                    }
                },
            }
        }
        debug!("Feed forwarder stopped");
    });

    TaskSubscription::new(shutdown_tx)
}
