//! Room flow integration tests
//!
//! Drives the composer and room controller against the in-memory backend.
//! Timing tests run on a paused clock so the 500 ms window is exact.

use std::sync::Arc;

use agora_core::backend::{
    BlobStore, ChatBackend, FailPoint, FeedEvent, FeedHandler, MemoryBackend, MessageStore,
    RealtimeFeed, Subscription,
};
use agora_core::notice::{self, NoticeLevel};
use agora_core::{
    ChatResult, Composer, DisplayName, FeedStatus, Message, NewMessage, PendingFile,
    RoomController, RoomEvent, RoomPhase, Session, MAX_ATTACHMENT_BYTES, RECENT_WINDOW,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::broadcast;
use tokio::time::{advance, timeout, Duration};

fn named(name: &str) -> Session {
    Session::Named(DisplayName::parse(name).unwrap())
}

fn history_row(id: &str, author: &str, body: &str, minutes_ago: i64) -> agora_core::Message {
    NewMessage::new(author, body, None)
        .unwrap()
        .into_message(id.to_string(), Utc::now() - ChronoDuration::minutes(minutes_ago))
}

async fn next_event(rx: &mut broadcast::Receiver<RoomEvent>) -> RoomEvent {
    timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("room event within 5s")
        .expect("event channel open")
}

/// Backend whose realtime handshake never completes
struct StalledFeed(MemoryBackend);

#[async_trait]
impl MessageStore for StalledFeed {
    async fn fetch_all(&self) -> ChatResult<Vec<Message>> {
        self.0.fetch_all().await
    }

    async fn insert(&self, message: NewMessage) -> ChatResult<()> {
        self.0.insert(message).await
    }

    async fn delete(&self, id: &str) -> ChatResult<()> {
        self.0.delete(id).await
    }
}

#[async_trait]
impl RealtimeFeed for StalledFeed {
    async fn subscribe(&self, _handler: FeedHandler) -> ChatResult<Box<dyn Subscription>> {
        std::future::pending().await
    }
}

#[async_trait]
impl BlobStore for StalledFeed {
    async fn put(&self, name: &str, data: Bytes, mime: &str) -> ChatResult<String> {
        self.0.put(name, data, mime).await
    }

    async fn fetch(&self, url: &str) -> ChatResult<Bytes> {
        self.0.fetch(url).await
    }
}

impl ChatBackend for StalledFeed {
    fn kind(&self) -> &'static str {
        "stalled"
    }
}

async fn next_appended(rx: &mut broadcast::Receiver<RoomEvent>) -> String {
    loop {
        if let RoomEvent::Appended { id } = next_event(rx).await {
            return id;
        }
    }
}

#[tokio::test]
async fn test_mount_loads_history_oldest_first() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed([
        history_row("b", "bob", "second", 5),
        history_row("a", "ada", "first", 10),
    ]);

    let room = RoomController::new(backend.clone(), named("ada"));
    assert_eq!(room.phase(), RoomPhase::Loading);

    let notices = room.mount().await;
    assert!(notices.is_empty());
    assert_eq!(room.phase(), RoomPhase::Ready);

    let bodies: Vec<_> = room
        .snapshot()
        .messages
        .into_iter()
        .map(|m| m.body)
        .collect();
    assert_eq!(bodies, vec!["first", "second"]);

    // History is not "new"
    assert!(room.snapshot().recent.is_empty());
}

#[tokio::test]
async fn test_text_only_send_payload_is_exact() {
    let backend = Arc::new(MemoryBackend::new());
    let session = named("ada");
    let room = RoomController::new(backend.clone(), session.clone());
    room.mount().await;

    let mut composer = Composer::new();
    composer.set_draft("hello");
    let submission = composer.begin_submit(&session).unwrap().unwrap();
    assert!(room.send(submission).await.is_none());
    composer.finish();

    let inserts = backend.inserts();
    assert_eq!(inserts.len(), 1);
    assert_eq!(
        serde_json::to_value(&inserts[0]).unwrap(),
        serde_json::json!({ "username": "ada", "message": "hello" })
    );
    assert!(backend.uploads().is_empty());
    assert_eq!(composer.draft(), "");
}

#[tokio::test]
async fn test_send_does_not_append_locally() {
    let backend = Arc::new(MemoryBackend::new());
    let session = named("ada");
    // No subscription: only the echo could make the message appear
    let room = RoomController::new(backend.clone(), session.clone());
    room.load_history().await;

    let mut composer = Composer::new();
    composer.set_draft("hello");
    let submission = composer.begin_submit(&session).unwrap().unwrap();
    room.send(submission).await;

    assert_eq!(backend.messages().len(), 1);
    assert!(room.snapshot().messages.is_empty());
}

#[tokio::test]
async fn test_echo_appends_sent_message() {
    let backend = Arc::new(MemoryBackend::new());
    let session = named("ada");
    let room = RoomController::new(backend.clone(), session.clone());
    room.mount().await;
    let mut events = room.events();

    let mut composer = Composer::new();
    composer.set_draft("  trimmed  ");
    let submission = composer.begin_submit(&session).unwrap().unwrap();
    room.send(submission).await;

    let id = next_appended(&mut events).await;
    let views = room.views(true);
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].id, id);
    assert_eq!(views[0].body, "trimmed");
    assert!(views[0].is_own());
    assert!(views[0].can_delete);
}

#[tokio::test]
async fn test_image_send_uploads_before_insert() {
    let backend = Arc::new(MemoryBackend::new());
    let session = named("ada");
    let room = RoomController::new(backend.clone(), session.clone());
    room.mount().await;

    let mut composer = Composer::new();
    composer
        .select_file(PendingFile::new("cat.png", vec![9u8; 2048]))
        .unwrap();
    let submission = composer.begin_submit(&session).unwrap().unwrap();
    assert!(room.send(submission).await.is_none());

    let uploads = backend.uploads();
    assert_eq!(uploads.len(), 1);
    let (object, mime) = &uploads[0];
    assert_eq!(mime, "image/png");

    let attachment = backend.inserts()[0].attachment.clone().unwrap();
    assert_eq!(attachment.url, format!("memory://{}", object));
    assert_eq!(attachment.name, "cat.png");
    assert_eq!(attachment.mime, "image/png");
    assert_eq!(attachment.size, 2048);
}

#[tokio::test]
async fn test_failed_upload_skips_insert_and_clears_composer() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set_failing(FailPoint::Upload, true);
    let session = named("ada");
    let room = RoomController::new(backend.clone(), session.clone());
    room.mount().await;

    let mut composer = Composer::new();
    composer.set_draft("see attached");
    composer
        .select_file(PendingFile::new("report.pdf", vec![1, 2, 3]))
        .unwrap();
    let submission = composer.begin_submit(&session).unwrap().unwrap();

    let shown = room.send(submission).await.unwrap();
    composer.finish();

    assert_eq!(shown.level, NoticeLevel::Error);
    assert_eq!(shown.text, notice::SEND_FAILED);
    assert!(backend.inserts().is_empty());
    assert_eq!(composer.draft(), "");
    assert!(composer.file().is_none());
    assert!(!composer.is_busy());
}

#[tokio::test]
async fn test_failed_insert_surfaces_notice() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set_failing(FailPoint::Insert, true);
    let session = named("ada");
    let room = RoomController::new(backend.clone(), session.clone());
    room.mount().await;

    let mut composer = Composer::new();
    composer.set_draft("hello");
    let submission = composer.begin_submit(&session).unwrap().unwrap();

    assert_eq!(
        room.send(submission).await.map(|n| n.text),
        Some(notice::SEND_FAILED.to_string())
    );
    assert!(room.snapshot().messages.is_empty());
}

#[tokio::test]
async fn test_oversized_file_never_uploads() {
    let backend = Arc::new(MemoryBackend::new());
    let mut composer = Composer::new();

    let huge = PendingFile::new("huge.jpg", vec![0u8; MAX_ATTACHMENT_BYTES as usize + 1]);
    let shown = composer.select_file(huge).unwrap_err();

    assert_eq!(shown.text, notice::FILE_TOO_LARGE);
    assert!(!composer.is_busy());
    assert!(composer.begin_submit(&named("ada")).is_none());
    assert!(backend.uploads().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_live_insert_is_new_for_exactly_the_window() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed([history_row("old", "bob", "earlier", 3)]);
    let room = RoomController::new(backend.clone(), named("ada"));
    room.mount().await;
    let mut events = room.events();

    let live = backend.push_remote(NewMessage::new("bob", "just now", None).unwrap());
    assert_eq!(next_event(&mut events).await, RoomEvent::Appended { id: live.id.clone() });

    let snapshot = room.snapshot();
    assert_eq!(snapshot.messages.last().unwrap().id, live.id);
    assert!(snapshot.recent.contains(&live.id));

    advance(RECENT_WINDOW - Duration::from_millis(1)).await;
    tokio::task::yield_now().await;
    assert!(room.snapshot().recent.contains(&live.id));

    advance(Duration::from_millis(1)).await;
    assert_eq!(next_event(&mut events).await, RoomEvent::Settled { id: live.id.clone() });
    assert!(room.snapshot().recent.is_empty());
    assert_eq!(room.snapshot().messages.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_live_inserts_during_loading_follow_history() {
    let backend = Arc::new(MemoryBackend::new());
    let in_history = history_row("h1", "bob", "from history", 1);
    backend.seed([in_history.clone()]);
    backend.set_fetch_delay(Some(Duration::from_millis(100)));

    let room = Arc::new(RoomController::new(backend.clone(), named("ada")));
    let mounting = {
        let room = room.clone();
        tokio::spawn(async move { room.mount().await })
    };

    // Mount subscribes and takes the history snapshot in its first poll
    while backend.subscriptions_opened() == 0 {
        tokio::task::yield_now().await;
    }

    let live = backend.push_remote(NewMessage::new("cy", "while loading", None).unwrap());
    // The same row delivered live and in history shows once
    backend.emit(FeedEvent::Inserted(in_history.clone()));
    tokio::task::yield_now().await;
    assert_eq!(room.phase(), RoomPhase::Loading);

    assert!(mounting.await.unwrap().is_empty());

    let ids: Vec<_> = room.snapshot().messages.into_iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![in_history.id, live.id.clone()]);
    assert!(room.snapshot().recent.contains(&live.id));
}

#[tokio::test(start_paused = true)]
async fn test_delete_during_loading_drops_history_row() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed([
        history_row("keep", "bob", "stays", 2),
        history_row("gone", "bob", "goes", 1),
    ]);
    backend.set_fetch_delay(Some(Duration::from_millis(100)));

    let room = Arc::new(RoomController::new(backend.clone(), named("ada")));
    let mounting = {
        let room = room.clone();
        tokio::spawn(async move { room.mount().await })
    };
    while backend.subscriptions_opened() == 0 {
        tokio::task::yield_now().await;
    }

    backend.emit(FeedEvent::Deleted { id: "gone".into() });
    tokio::task::yield_now().await;
    mounting.await.unwrap();

    let ids: Vec<_> = room.snapshot().messages.into_iter().map(|m| m.id).collect();
    assert_eq!(ids, vec!["keep".to_string()]);
}

#[tokio::test]
async fn test_delete_own_message_removes_via_feed() {
    let backend = Arc::new(MemoryBackend::new());
    let mine = backend.push_remote(NewMessage::new("ada", "oops", None).unwrap());
    backend.push_remote(NewMessage::new("bob", "hi", None).unwrap());

    let room = RoomController::new(backend.clone(), named("ada"));
    room.mount().await;
    let mut events = room.events();

    let views = room.views(true);
    assert!(views[0].can_delete);
    assert!(!views[1].can_delete);

    assert!(room.delete(&mine.id).await.is_none());
    assert_eq!(next_event(&mut events).await, RoomEvent::Removed { id: mine.id.clone() });

    let remaining: Vec<_> = room.snapshot().messages.into_iter().map(|m| m.body).collect();
    assert_eq!(remaining, vec!["hi"]);
}

#[tokio::test]
async fn test_guest_cannot_delete() {
    let backend = Arc::new(MemoryBackend::new());
    let guest_row = backend.push_remote(NewMessage::new("Guest", "anon", None).unwrap());

    let room = RoomController::new(backend.clone(), Session::Guest);
    room.mount().await;

    assert!(!room.views(true)[0].can_delete);
    assert!(room.delete(&guest_row.id).await.is_some());
    assert_eq!(backend.messages().len(), 1);
}

#[tokio::test]
async fn test_subscription_released_once_per_mount() {
    let backend = Arc::new(MemoryBackend::new());

    for _ in 0..3 {
        let room = RoomController::new(backend.clone(), named("ada"));
        room.mount().await;
        room.unmount();
        // Drop runs unmount again
    }

    assert_eq!(backend.subscriptions_opened(), 3);
    assert_eq!(backend.subscriptions_closed(), 3);
}

#[tokio::test]
async fn test_subscribe_failure_still_loads_history() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed([history_row("a", "bob", "hello", 1)]);
    backend.set_failing(FailPoint::Subscribe, true);

    let room = RoomController::new(backend.clone(), named("ada"));
    let notices = room.mount().await;

    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].text, notice::LIVE_UPDATES_UNAVAILABLE);
    assert_eq!(room.snapshot().messages.len(), 1);
    assert_eq!(room.feed_status(), FeedStatus::Lost);
}

#[tokio::test]
async fn test_history_loads_while_subscribe_is_stalled() {
    let inner = MemoryBackend::new();
    inner.seed([history_row("a", "bob", "hello", 1)]);
    let room = Arc::new(RoomController::new(
        Arc::new(StalledFeed(inner)),
        named("ada"),
    ));
    let mut events = room.events();

    let mounting = {
        let room = room.clone();
        tokio::spawn(async move { room.mount().await })
    };

    assert_eq!(
        next_event(&mut events).await,
        RoomEvent::HistoryLoaded { count: 1 }
    );
    assert_eq!(room.phase(), RoomPhase::Ready);
    assert_eq!(room.snapshot().messages[0].body, "hello");
    assert_eq!(room.feed_status(), FeedStatus::Connecting);

    mounting.abort();
}

#[tokio::test]
async fn test_dropped_feed_goes_offline() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed([history_row("a", "bob", "hello", 1)]);
    let room = RoomController::new(backend.clone(), named("ada"));
    let mut events = room.events();

    assert!(room.mount().await.is_empty());
    assert_eq!(room.feed_status(), FeedStatus::Live);

    backend.emit(FeedEvent::Disconnected {
        reason: "socket closed".into(),
    });
    loop {
        let event = next_event(&mut events).await;
        if event == (RoomEvent::Feed { status: FeedStatus::Lost }) {
            assert!(!event.changes_set());
            break;
        }
    }
    assert_eq!(room.feed_status(), FeedStatus::Lost);
    // History survives the loss
    assert_eq!(room.snapshot().messages.len(), 1);
}

#[tokio::test]
async fn test_download_attachment() {
    let backend = Arc::new(MemoryBackend::new());
    let session = named("ada");
    let room = RoomController::new(backend.clone(), session.clone());
    room.mount().await;
    let mut events = room.events();

    let mut composer = Composer::new();
    composer
        .select_file(PendingFile::new("notes.txt", b"remember the milk".to_vec()))
        .unwrap();
    room.send(composer.begin_submit(&session).unwrap().unwrap())
        .await;
    let id = next_appended(&mut events).await;

    let (attachment, data) = room.download(&id).await.unwrap();
    assert_eq!(attachment.name, "notes.txt");
    assert_eq!(&data[..], b"remember the milk");
}
