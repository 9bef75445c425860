//! Room controller.
//!
//! Owns the displayed message set. On mount it opens one realtime
//! subscription and loads history at the same time; live inserts that arrive
//! while history is still loading are held back and appended after it, minus
//! duplicates. A slow or stalled feed never holds up history.
//! Outgoing sends go to the backend only: a message appears when its echo
//! comes back on the feed.
//!
//! State is shared between the feed task and UI handlers behind a
//! `parking_lot::Mutex`; the lock is never held across an await.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::backend::{ChatBackend, FeedEvent, FeedHandler, Subscription};
use crate::composer::Submission;
use crate::error::{ChatError, ChatResult};
use crate::identity::Session;
use crate::message::{AttachmentDescriptor, Message};
use crate::notice::{self, Notice};
use crate::view::{render_messages, MessageView};

/// How long a newly arrived message stays flagged as new
pub const RECENT_WINDOW: Duration = Duration::from_millis(500);

const EVENT_CAPACITY: usize = 256;

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoomPhase {
    #[default]
    Loading,
    Ready,
}

/// State of the realtime subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedStatus {
    #[default]
    Connecting,
    Live,
    /// Could not subscribe, or the feed dropped; no more live changes arrive
    Lost,
}

/// Change notifications for views
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// History replaced the list
    HistoryLoaded { count: usize },
    /// A message was appended at the end
    Appended { id: String },
    /// A message left the list
    Removed { id: String },
    /// A message stopped being new
    Settled { id: String },
    /// The realtime subscription changed state
    Feed { status: FeedStatus },
}

impl RoomEvent {
    /// Whether the displayed set changed (views scroll to the newest row)
    pub fn changes_set(&self) -> bool {
        matches!(
            self,
            RoomEvent::HistoryLoaded { .. } | RoomEvent::Appended { .. } | RoomEvent::Removed { .. }
        )
    }
}

/// Point-in-time copy of the room state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub phase: RoomPhase,
    pub messages: Vec<Message>,
    pub recent: HashSet<String>,
}

#[derive(Default)]
struct RoomState {
    phase: RoomPhase,
    feed: FeedStatus,
    messages: Vec<Message>,
    recent: HashSet<String>,
    // Feed traffic seen before history arrived
    early_inserts: Vec<Message>,
    early_deletes: HashSet<String>,
}

impl RoomState {
    fn contains(&self, id: &str) -> bool {
        self.messages.iter().any(|m| m.id == id)
    }
}

struct Shared {
    state: Mutex<RoomState>,
    events: broadcast::Sender<RoomEvent>,
}

impl Shared {
    fn publish(&self, event: RoomEvent) {
        let _ = self.events.send(event);
    }

    fn apply(self: &Arc<Self>, event: FeedEvent) {
        match event {
            FeedEvent::Disconnected { reason } => {
                warn!(reason = %reason, "Realtime feed lost");
                self.set_feed(FeedStatus::Lost);
            }
            FeedEvent::Inserted(message) => {
                let id = message.id.clone();
                let appended = {
                    let mut state = self.state.lock();
                    let phase = state.phase;
                    match phase {
                        RoomPhase::Loading => {
                            if !state.early_inserts.iter().any(|m| m.id == id) {
                                state.early_inserts.push(message);
                            }
                            false
                        }
                        RoomPhase::Ready if state.contains(&id) => false,
                        RoomPhase::Ready => {
                            state.messages.push(message);
                            state.recent.insert(id.clone());
                            true
                        }
                    }
                };
                if appended {
                    debug!(id = %id, "Live message appended");
                    self.publish(RoomEvent::Appended { id: id.clone() });
                    self.settle_later(id);
                }
            }
            FeedEvent::Deleted { id } => {
                let removed = {
                    let mut state = self.state.lock();
                    state.recent.remove(&id);
                    if state.phase == RoomPhase::Loading {
                        state.early_inserts.retain(|m| m.id != id);
                        state.early_deletes.insert(id.clone());
                    }
                    let before = state.messages.len();
                    state.messages.retain(|m| m.id != id);
                    state.messages.len() != before
                };
                if removed {
                    debug!(id = %id, "Message removed");
                    self.publish(RoomEvent::Removed { id });
                }
            }
        }
    }

    /// Move the feed to `status`. `Lost` is final; `Live` only follows
    /// `Connecting`.
    fn set_feed(&self, status: FeedStatus) {
        let changed = {
            let mut state = self.state.lock();
            let allowed = match status {
                FeedStatus::Connecting => false,
                FeedStatus::Live => state.feed == FeedStatus::Connecting,
                FeedStatus::Lost => state.feed != FeedStatus::Lost,
            };
            if allowed {
                state.feed = status;
            }
            allowed
        };
        if changed {
            self.publish(RoomEvent::Feed { status });
        }
    }

    /// Clear the new flag once the window has passed
    fn settle_later(self: &Arc<Self>, id: String) {
        let shared = Arc::downgrade(self);
        tokio::spawn(async move {
            tokio::time::sleep(RECENT_WINDOW).await;
            if let Some(shared) = shared.upgrade() {
                let cleared = shared.state.lock().recent.remove(&id);
                if cleared {
                    shared.publish(RoomEvent::Settled { id });
                }
            }
        });
    }

    /// Replace the list with history and fold in early feed traffic
    fn finish_loading(self: &Arc<Self>, history: Vec<Message>) -> usize {
        let (count, appended) = {
            let mut state = self.state.lock();
            let early_deletes = std::mem::take(&mut state.early_deletes);
            let early_inserts = std::mem::take(&mut state.early_inserts);

            state.messages = history
                .into_iter()
                .filter(|m| !early_deletes.contains(&m.id))
                .collect();

            let mut appended = Vec::new();
            for message in early_inserts {
                if !state.contains(&message.id) {
                    appended.push(message.id.clone());
                    state.recent.insert(message.id.clone());
                    state.messages.push(message);
                }
            }
            state.phase = RoomPhase::Ready;
            (state.messages.len(), appended)
        };

        self.publish(RoomEvent::HistoryLoaded { count });
        for id in appended {
            self.publish(RoomEvent::Appended { id: id.clone() });
            self.settle_later(id);
        }
        count
    }
}

/// The chat room as seen by one viewer
pub struct RoomController {
    backend: Arc<dyn ChatBackend>,
    session: Session,
    shared: Arc<Shared>,
    subscription: Mutex<Option<Box<dyn Subscription>>>,
}

impl RoomController {
    pub fn new(backend: Arc<dyn ChatBackend>, session: Session) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            backend,
            session,
            shared: Arc::new(Shared {
                state: Mutex::new(RoomState::default()),
                events,
            }),
            subscription: Mutex::new(None),
        }
    }

    /// Listen for changes to the displayed set
    pub fn events(&self) -> broadcast::Receiver<RoomEvent> {
        self.shared.events.subscribe()
    }

    /// Subscribe to the feed and load history concurrently.
    ///
    /// The feed handler is registered on the first poll, ahead of the history
    /// fetch, so nothing inserted in between is lost. Returns once both have
    /// finished, with notices for anything that went wrong; the room is
    /// usable either way, and reaches `Ready` as soon as history is in even
    /// if the subscription is still connecting.
    pub async fn mount(&self) -> Vec<Notice> {
        let (subscribed, history) = tokio::join!(self.subscribe(), self.load_history());

        let mut notices = Vec::new();
        if subscribed.is_err() {
            notices.push(Notice::error(notice::LIVE_UPDATES_UNAVAILABLE));
        }
        notices.extend(history);
        notices
    }

    /// Open the realtime subscription. Does nothing if one is open.
    ///
    /// On failure the feed status becomes `Lost`.
    pub async fn subscribe(&self) -> ChatResult<()> {
        if self.subscription.lock().is_some() {
            return Ok(());
        }

        let shared = self.shared.clone();
        let handler: FeedHandler = Arc::new(move |event| shared.apply(event));
        let sub = match self.backend.subscribe(handler).await {
            Ok(sub) => sub,
            Err(e) => {
                warn!(error = %e, "Realtime subscription failed");
                self.shared.set_feed(FeedStatus::Lost);
                return Err(e);
            }
        };

        {
            let mut slot = self.subscription.lock();
            if slot.is_some() {
                // A concurrent subscribe won; `sub` closes on drop
                return Ok(());
            }
            *slot = Some(sub);
        }
        info!(backend = self.backend.kind(), "Subscribed to room feed");
        self.shared.set_feed(FeedStatus::Live);
        Ok(())
    }

    /// State of the realtime subscription
    pub fn feed_status(&self) -> FeedStatus {
        self.shared.state.lock().feed
    }

    /// Load all messages, oldest first.
    ///
    /// On failure the room becomes ready with whatever the feed delivered in
    /// the meantime, and a notice comes back.
    pub async fn load_history(&self) -> Option<Notice> {
        match self.backend.fetch_all().await {
            Ok(history) => {
                let count = self.shared.finish_loading(history);
                info!(count, "Loaded message history");
                None
            }
            Err(e) => {
                warn!(error = %e, "Failed to load message history");
                self.shared.finish_loading(Vec::new());
                Some(Notice::error(notice::LOAD_FAILED))
            }
        }
    }

    /// Upload the attachment (if any) and insert the message.
    ///
    /// Nothing is appended locally.
    pub async fn send(&self, submission: Submission) -> Option<Notice> {
        let result = async {
            let payload = submission.prepare(self.backend.as_ref()).await?;
            self.backend.insert(payload).await
        }
        .await;

        match result {
            Ok(()) => {
                debug!("Message sent");
                None
            }
            Err(e) => {
                warn!(error = %e, "Failed to send message");
                Some(Notice::error(notice::SEND_FAILED))
            }
        }
    }

    /// Delete one of the viewer's own messages.
    ///
    /// The row leaves the list when the feed reports the removal.
    pub async fn delete(&self, id: &str) -> Option<Notice> {
        let owned = {
            let state = self.shared.state.lock();
            state
                .messages
                .iter()
                .any(|m| m.id == id && m.is_authored_by(self.session.viewer_name()))
        };
        if !owned {
            warn!(id, "Refusing to delete a message the viewer does not own");
            return Some(Notice::error(notice::DELETE_FAILED));
        }

        match self.backend.delete(id).await {
            Ok(()) => {
                info!(id, "Deleted message");
                None
            }
            Err(e) => {
                warn!(id, error = %e, "Failed to delete message");
                Some(Notice::error(notice::DELETE_FAILED))
            }
        }
    }

    /// Download the attachment of a message in the room
    pub async fn download(&self, id: &str) -> ChatResult<(AttachmentDescriptor, Bytes)> {
        let attachment = {
            let state = self.shared.state.lock();
            let message = state
                .messages
                .iter()
                .find(|m| m.id == id)
                .ok_or_else(|| ChatError::MessageNotFound(id.to_string()))?;
            message
                .attachment
                .clone()
                .ok_or_else(|| ChatError::BlobNotFound(format!("message {} has no attachment", id)))?
        };
        let data = self.backend.fetch(&attachment.url).await?;
        Ok((attachment, data))
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        let state = self.shared.state.lock();
        RoomSnapshot {
            phase: state.phase,
            messages: state.messages.clone(),
            recent: state.recent.clone(),
        }
    }

    pub fn phase(&self) -> RoomPhase {
        self.shared.state.lock().phase
    }

    /// Rendered rows for the current state
    pub fn views(&self, can_delete: bool) -> Vec<MessageView> {
        let state = self.shared.state.lock();
        render_messages(
            &state.messages,
            self.session.viewer_name(),
            &state.recent,
            can_delete,
        )
    }

    /// Release the feed subscription. Safe to call more than once.
    pub fn unmount(&self) {
        if let Some(mut sub) = self.subscription.lock().take() {
            sub.close();
            info!("Unsubscribed from room feed");
        }
    }
}

impl Drop for RoomController {
    fn drop(&mut self) {
        self.unmount();
    }
}
