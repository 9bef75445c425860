//! Agora Core Library
//!
//! A minimal public chat room: a name-entry gate, a message list with
//! realtime updates, and a composer with optional single-file attachments.
//!
//! ## Overview
//!
//! Persistence, realtime fan-out and file storage belong to a backend behind
//! three capabilities ([`MessageStore`], [`RealtimeFeed`], [`BlobStore`]).
//! This crate holds the client side: who the viewer is, what they are typing,
//! and which messages are on screen.
//!
//! ## Quick Start
//!
//! ```ignore
//! use agora_core::{ChatConfig, Composer, IdentityGate, RoomController};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ChatConfig::local("~/.agora/data");
//!     let storage = config.open_storage()?;
//!     let backend = config.connect(&storage)?;
//!
//!     let mut gate = IdentityGate::open(storage);
//!     let session = gate.submit("Ada")?;
//!
//!     let room = RoomController::new(backend, session.clone());
//!     room.mount().await;
//!
//!     let mut composer = Composer::new();
//!     composer.set_draft("hello");
//!     if let Some(Ok(submission)) = composer.begin_submit(&session) {
//!         room.send(submission).await;
//!         composer.finish();
//!     }
//!     Ok(())
//! }
//! ```

pub mod attachment;
pub mod backend;
pub mod composer;
pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod message;
pub mod notice;
pub mod room;
pub mod storage;
pub mod view;

// Re-exports
pub use attachment::{format_bytes, AttachmentKind, PendingFile, MAX_ATTACHMENT_BYTES};
pub use backend::{
    BlobStore, ChatBackend, FeedEvent, FeedHandler, MessageStore, RealtimeFeed, Subscription,
};
pub use composer::{Composer, Submission};
pub use config::{BackendConfig, ChatConfig, ChatServices};
pub use error::{ChatError, ChatResult};
pub use identity::{DisplayName, GateState, IdentityGate, IdentityStore, Session};
pub use message::{AttachmentDescriptor, Message, NewMessage};
pub use notice::{Notice, NoticeLevel};
pub use room::{FeedStatus, RoomController, RoomEvent, RoomPhase, RoomSnapshot, RECENT_WINDOW};
pub use storage::Storage;
pub use view::{render_messages, Alignment, AttachmentView, MessageView};
