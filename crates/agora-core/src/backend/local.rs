//! Local backend: messages in redb, blobs on disk, feed over a broadcast channel.
//!
//! The feed only reaches subscribers in the same process, and redb holds an
//! exclusive lock on the database file, so one data directory serves one
//! running app at a time.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, info};
use ulid::Ulid;
use url::Url;

use super::{forward_broadcast, BlobStore, ChatBackend, FeedEvent, FeedHandler, MessageStore};
use super::{RealtimeFeed, Subscription};
use crate::error::{ChatError, ChatResult};
use crate::message::{Message, NewMessage};
use crate::storage::Storage;

const FEED_CAPACITY: usize = 256;

/// Backend backed by the local data directory
pub struct LocalBackend {
    storage: Storage,
    bucket_dir: PathBuf,
    events: broadcast::Sender<FeedEvent>,
}

impl LocalBackend {
    /// Create a local backend over an open storage and a blob root.
    ///
    /// Blobs are written to `<blob_root>/<bucket>/`.
    pub fn new(storage: Storage, blob_root: impl AsRef<Path>, bucket: &str) -> Self {
        let (events, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            storage,
            bucket_dir: blob_root.as_ref().join(bucket),
            events,
        }
    }

    /// The underlying storage, shared with the identity gate
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    fn publish(&self, event: FeedEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl MessageStore for LocalBackend {
    async fn fetch_all(&self) -> ChatResult<Vec<Message>> {
        self.storage.list_messages()
    }

    async fn insert(&self, message: NewMessage) -> ChatResult<()> {
        let message = message.into_message(Ulid::new().to_string(), Utc::now());
        self.storage.insert_message(&message)?;
        debug!(id = %message.id, username = %message.username, "Stored message");
        self.publish(FeedEvent::Inserted(message));
        Ok(())
    }

    async fn delete(&self, id: &str) -> ChatResult<()> {
        if !self.storage.remove_message(id)? {
            return Err(ChatError::MessageNotFound(id.to_string()));
        }
        debug!(id, "Removed message");
        self.publish(FeedEvent::Deleted { id: id.to_string() });
        Ok(())
    }
}

#[async_trait]
impl RealtimeFeed for LocalBackend {
    async fn subscribe(&self, handler: FeedHandler) -> ChatResult<Box<dyn Subscription>> {
        let rx = self.events.subscribe();
        Ok(Box::new(forward_broadcast(rx, handler)))
    }
}

#[async_trait]
impl BlobStore for LocalBackend {
    async fn put(&self, name: &str, data: Bytes, mime: &str) -> ChatResult<String> {
        tokio::fs::create_dir_all(&self.bucket_dir).await?;
        let path = self.bucket_dir.join(name);
        tokio::fs::write(&path, &data).await?;

        let url = Url::from_file_path(&path)
            .map_err(|_| ChatError::Storage(format!("not an absolute path: {}", path.display())))?;
        info!(name, mime, size = data.len(), "Stored blob");
        Ok(url.to_string())
    }

    async fn fetch(&self, url: &str) -> ChatResult<Bytes> {
        let path = Url::parse(url)?
            .to_file_path()
            .map_err(|_| ChatError::BlobNotFound(url.to_string()))?;

        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ChatError::BlobNotFound(url.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl ChatBackend for LocalBackend {
    fn kind(&self) -> &'static str {
        "local"
    }
}
