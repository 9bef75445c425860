//! Local backend integration tests
//!
//! Exercises the redb + blob directory adapter end to end, including the
//! identity gate sharing its database.

use std::sync::Arc;

use agora_core::backend::{BlobStore, FeedEvent, LocalBackend, MessageStore, RealtimeFeed};
use agora_core::{
    ChatConfig, ChatError, Composer, IdentityGate, NewMessage, PendingFile, RoomController,
    RoomEvent, Storage,
};
use bytes::Bytes;
use parking_lot::Mutex;
use tempfile::tempdir;
use tokio::time::{timeout, Duration};

fn open_backend(dir: &std::path::Path) -> LocalBackend {
    let storage = Storage::new(dir.join("agora.redb")).unwrap();
    LocalBackend::new(storage, dir.join("blobs"), "chat-files")
}

#[tokio::test]
async fn test_messages_persist_across_reopen() {
    let temp = tempdir().unwrap();

    {
        let backend = open_backend(temp.path());
        backend
            .insert(NewMessage::new("ada", "first", None).unwrap())
            .await
            .unwrap();
        backend
            .insert(NewMessage::new("bob", "second", None).unwrap())
            .await
            .unwrap();
    }

    let backend = open_backend(temp.path());
    let messages = backend.fetch_all().await.unwrap();
    let bodies: Vec<_> = messages.iter().map(|m| m.body.as_str()).collect();
    assert_eq!(bodies, vec!["first", "second"]);
    assert!(messages[0].created_at <= messages[1].created_at);
    assert_ne!(messages[0].id, messages[1].id);
}

#[tokio::test]
async fn test_feed_delivers_inserts_and_deletes() {
    let temp = tempdir().unwrap();
    let backend = open_backend(temp.path());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let sink = seen.clone();
    let mut sub = backend
        .subscribe(Arc::new(move |event: FeedEvent| {
            sink.lock().push(event);
            let _ = tx.send(());
        }))
        .await
        .unwrap();

    backend
        .insert(NewMessage::new("ada", "hello", None).unwrap())
        .await
        .unwrap();
    timeout(Duration::from_secs(5), rx.recv()).await.unwrap();

    let id = match &seen.lock()[0] {
        FeedEvent::Inserted(message) => message.id.clone(),
        other => panic!("expected insert, got {:?}", other),
    };

    backend.delete(&id).await.unwrap();
    timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
    assert_eq!(seen.lock()[1], FeedEvent::Deleted { id: id.clone() });

    sub.close();
    assert!(sub.is_closed());

    assert!(matches!(
        backend.delete(&id).await,
        Err(ChatError::MessageNotFound(_))
    ));
}

#[tokio::test]
async fn test_blobs_written_under_bucket() {
    let temp = tempdir().unwrap();
    let backend = open_backend(temp.path());

    let url = backend
        .put("1700000000000-abcd1234.txt", Bytes::from_static(b"hi"), "text/plain")
        .await
        .unwrap();

    assert!(url.starts_with("file://"));
    assert!(temp
        .path()
        .join("blobs/chat-files/1700000000000-abcd1234.txt")
        .exists());
    assert_eq!(backend.fetch(&url).await.unwrap(), Bytes::from_static(b"hi"));

    let missing = url.replace("abcd1234", "zzzzzzzz");
    assert!(matches!(
        backend.fetch(&missing).await,
        Err(ChatError::BlobNotFound(_))
    ));
}

#[tokio::test]
async fn test_gate_and_room_share_one_database() {
    let temp = tempdir().unwrap();
    let config = ChatConfig::local(temp.path());
    let storage = config.open_storage().unwrap();
    let backend = config.connect(&storage).unwrap();

    let mut gate = IdentityGate::open(storage.clone());
    let session = gate.submit("  Ada  ").unwrap();
    assert_eq!(storage.load_display_name().unwrap().as_deref(), Some("Ada"));

    let room = RoomController::new(backend, session.clone());
    room.mount().await;
    let mut events = room.events();

    let mut composer = Composer::new();
    composer.set_draft("with a file");
    composer
        .select_file(PendingFile::new("notes.txt", b"local blob".to_vec()))
        .unwrap();
    let submission = composer.begin_submit(&session).unwrap().unwrap();
    assert!(room.send(submission).await.is_none());
    composer.finish();

    let id = loop {
        let event = timeout(Duration::from_secs(5), events.recv())
            .await
            .unwrap()
            .unwrap();
        if let RoomEvent::Appended { id } = event {
            break id;
        }
    };

    let (attachment, data) = room.download(&id).await.unwrap();
    assert_eq!(attachment.name, "notes.txt");
    assert_eq!(attachment.mime, "text/plain");
    assert_eq!(&data[..], b"local blob");
}

#[tokio::test]
async fn test_gate_restores_name_after_restart() {
    let temp = tempdir().unwrap();
    let db = temp.path().join("agora.redb");

    {
        let mut gate = IdentityGate::open(Storage::new(&db).unwrap());
        gate.submit("Grace").unwrap();
    }

    let gate = IdentityGate::open(Storage::new(&db).unwrap());
    assert_eq!(gate.session().unwrap().viewer_name(), Some("Grace"));
}
