//! Realtime channel client (Phoenix channels over a websocket).
//!
//! Joins one channel filtered to INSERT and DELETE on `public.messages`,
//! heartbeats every 30 seconds and leaves the channel on close.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tokio::time::{interval_at, timeout, Instant};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};
use url::Url;

use super::{FeedEvent, FeedHandler, TaskSubscription};
use crate::error::{ChatError, ChatResult};
use crate::message::{Message, RowId};

/// Channel topic for the room
pub(crate) const CHANNEL_TOPIC: &str = "realtime:messages-channel";

const PHOENIX_TOPIC: &str = "phoenix";
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const JOIN_TIMEOUT: Duration = Duration::from_secs(10);

/// One Phoenix protocol frame (JSON serializer, vsn 1.0.0)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Frame {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

impl Frame {
    fn new(topic: &str, event: &str, payload: Value, reference: u64) -> Self {
        Self {
            topic: topic.to_string(),
            event: event.to_string(),
            payload,
            reference: Some(reference.to_string()),
        }
    }

    fn to_ws(&self) -> ChatResult<WsMessage> {
        Ok(WsMessage::Text(serde_json::to_string(self)?.into()))
    }
}

pub(crate) fn join_frame(access_token: &str, reference: u64) -> Frame {
    Frame::new(
        CHANNEL_TOPIC,
        "phx_join",
        json!({
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [
                    { "event": "INSERT", "schema": "public", "table": "messages" },
                    { "event": "DELETE", "schema": "public", "table": "messages" },
                ],
            },
            "access_token": access_token,
        }),
        reference,
    )
}

pub(crate) fn heartbeat_frame(reference: u64) -> Frame {
    Frame::new(PHOENIX_TOPIC, "heartbeat", json!({}), reference)
}

pub(crate) fn leave_frame(reference: u64) -> Frame {
    Frame::new(CHANNEL_TOPIC, "phx_leave", json!({}), reference)
}

/// Outcome of a `phx_reply` to the frame with `reference`, if this is one.
pub(crate) fn reply_status(frame: &Frame, reference: u64) -> Option<Result<(), String>> {
    let expected = reference.to_string();
    if frame.event != "phx_reply" || frame.reference.as_deref() != Some(expected.as_str()) {
        return None;
    }
    match frame.payload.get("status").and_then(Value::as_str) {
        Some("ok") => Some(Ok(())),
        Some(status) => Some(Err(format!("{}: {}", status, frame.payload["response"]))),
        None => Some(Err("reply without status".to_string())),
    }
}

/// Decode a change notification into a feed event.
///
/// Accepts both the `postgres_changes` envelope and the older per-event
/// frames. Anything else yields `None`.
pub(crate) fn parse_change(frame: &Frame) -> Option<FeedEvent> {
    if frame.topic != CHANNEL_TOPIC {
        return None;
    }
    let data = match frame.event.as_str() {
        "postgres_changes" => frame.payload.get("data")?,
        "INSERT" | "DELETE" => &frame.payload,
        _ => return None,
    };

    match data.get("type").and_then(Value::as_str)? {
        "INSERT" => {
            let record = data.get("record")?.clone();
            match serde_json::from_value::<Message>(record) {
                Ok(message) => Some(FeedEvent::Inserted(message)),
                Err(e) => {
                    warn!(error = %e, "Dropping malformed insert payload");
                    None
                }
            }
        }
        "DELETE" => {
            let id = data.get("old_record")?.get("id")?.clone();
            match serde_json::from_value::<RowId>(id) {
                Ok(id) => Some(FeedEvent::Deleted { id: id.into() }),
                Err(e) => {
                    warn!(error = %e, "Dropping delete without a usable id");
                    None
                }
            }
        }
        _ => None,
    }
}

/// Connect, join the room channel and start forwarding changes.
///
/// Returns once the join has been acknowledged. If the socket later fails,
/// the handler receives [`FeedEvent::Disconnected`].
pub(crate) async fn connect(
    url: Url,
    access_token: &str,
    handler: FeedHandler,
) -> ChatResult<TaskSubscription> {
    let (stream, _) = timeout(CONNECT_TIMEOUT, connect_async(url.as_str()))
        .await
        .map_err(|_| ChatError::Realtime("timed out connecting".to_string()))??;
    let (mut write, mut read) = stream.split();
    let mut next_ref: u64 = 1;

    let join_ref = next_ref;
    next_ref += 1;
    write.send(join_frame(access_token, join_ref).to_ws()?).await?;

    let joined = timeout(JOIN_TIMEOUT, async {
        while let Some(msg) = read.next().await {
            let WsMessage::Text(text) = msg? else { continue };
            let frame: Frame = match serde_json::from_str(&text) {
                Ok(frame) => frame,
                Err(_) => continue,
            };
            if let Some(status) = reply_status(&frame, join_ref) {
                return status.map_err(ChatError::Realtime);
            }
        }
        Err(ChatError::Realtime("socket closed before join reply".to_string()))
    })
    .await
    .map_err(|_| ChatError::Realtime("timed out joining channel".to_string()))?;
    joined?;

    info!(topic = CHANNEL_TOPIC, "Joined realtime channel");

    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let mut heartbeat = interval_at(Instant::now() + HEARTBEAT_INTERVAL, HEARTBEAT_INTERVAL);

        let lost = loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    if let Ok(frame) = leave_frame(next_ref).to_ws() {
                        let _ = write.send(frame).await;
                    }
                    let _ = write.close().await;
                    debug!("Left realtime channel");
                    break None;
                }
                _ = heartbeat.tick() => {
                    let frame = heartbeat_frame(next_ref);
                    next_ref += 1;
                    let sent = match frame.to_ws() {
                        Ok(msg) => write.send(msg).await.map_err(ChatError::from),
                        Err(e) => Err(e),
                    };
                    if let Err(e) = sent {
                        break Some(format!("heartbeat failed: {}", e));
                    }
                }
                msg = read.next() => match msg {
                    Some(Ok(WsMessage::Text(text))) => {
                        match serde_json::from_str::<Frame>(&text) {
                            Ok(frame) => {
                                if let Some(event) = parse_change(&frame) {
                                    handler(event);
                                } else if frame.event == "phx_error" || frame.event == "phx_close" {
                                    break Some(format!("channel closed by server ({})", frame.event));
                                }
                            }
                            Err(e) => debug!(error = %e, "Ignoring unparseable frame"),
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => {
                        break Some("socket closed".to_string());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        break Some(format!("socket error: {}", e));
                    }
                },
            }
        };

        if let Some(reason) = lost {
            warn!(reason = %reason, "Realtime feed stopped");
            handler(FeedEvent::Disconnected { reason });
        }
    });

    Ok(TaskSubscription::new(shutdown_tx))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(value: Value) -> Frame {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_join_frame_filters_messages_table() {
        let value = serde_json::to_value(join_frame("anon", 1)).unwrap();
        assert_eq!(value["topic"], "realtime:messages-channel");
        assert_eq!(value["event"], "phx_join");
        assert_eq!(value["ref"], "1");

        let changes = value["payload"]["config"]["postgres_changes"]
            .as_array()
            .unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0]["event"], "INSERT");
        assert_eq!(changes[1]["event"], "DELETE");
        assert_eq!(changes[0]["table"], "messages");
    }

    #[test]
    fn test_heartbeat_goes_to_phoenix_topic() {
        let value = serde_json::to_value(heartbeat_frame(7)).unwrap();
        assert_eq!(value["topic"], "phoenix");
        assert_eq!(value["event"], "heartbeat");
    }

    #[test]
    fn test_reply_status() {
        let ok = frame(json!({
            "topic": CHANNEL_TOPIC, "event": "phx_reply", "ref": "1",
            "payload": { "status": "ok", "response": {} }
        }));
        assert_eq!(reply_status(&ok, 1), Some(Ok(())));
        assert_eq!(reply_status(&ok, 2), None);

        let err = frame(json!({
            "topic": CHANNEL_TOPIC, "event": "phx_reply", "ref": "1",
            "payload": { "status": "error", "response": { "reason": "unauthorized" } }
        }));
        assert!(matches!(reply_status(&err, 1), Some(Err(_))));
    }

    #[test]
    fn test_parse_insert() {
        let f = frame(json!({
            "topic": CHANNEL_TOPIC,
            "event": "postgres_changes",
            "ref": null,
            "payload": {
                "ids": [1],
                "data": {
                    "type": "INSERT",
                    "schema": "public",
                    "table": "messages",
                    "commit_timestamp": "2024-05-01T10:15:00Z",
                    "record": {
                        "id": "7b1c",
                        "username": "bob",
                        "message": "hello",
                        "created_at": "2024-05-01T10:15:00.5+00:00",
                        "file_url": null,
                        "file_name": null,
                        "file_type": null,
                        "file_size": null
                    }
                }
            }
        }));
        match parse_change(&f) {
            Some(FeedEvent::Inserted(m)) => {
                assert_eq!(m.id, "7b1c");
                assert_eq!(m.body, "hello");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_delete() {
        let f = frame(json!({
            "topic": CHANNEL_TOPIC,
            "event": "postgres_changes",
            "payload": { "data": { "type": "DELETE", "old_record": { "id": "7b1c" } } }
        }));
        assert_eq!(
            parse_change(&f),
            Some(FeedEvent::Deleted { id: "7b1c".into() })
        );
    }

    #[test]
    fn test_numeric_ids_match_between_insert_and_delete() {
        let insert = frame(json!({
            "topic": CHANNEL_TOPIC,
            "event": "postgres_changes",
            "payload": { "data": {
                "type": "INSERT",
                "record": {
                    "id": 17,
                    "username": "bob",
                    "message": "hello",
                    "created_at": "2024-05-01T10:15:00+00:00"
                }
            } }
        }));
        let delete = frame(json!({
            "topic": CHANNEL_TOPIC,
            "event": "postgres_changes",
            "payload": { "data": { "type": "DELETE", "old_record": { "id": 17 } } }
        }));

        let inserted_id = match parse_change(&insert) {
            Some(FeedEvent::Inserted(m)) => m.id,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(inserted_id, "17");
        assert_eq!(
            parse_change(&delete),
            Some(FeedEvent::Deleted { id: inserted_id })
        );
    }

    #[test]
    fn test_parse_ignores_other_topics_and_events() {
        let presence = frame(json!({
            "topic": CHANNEL_TOPIC, "event": "presence_state", "payload": {}
        }));
        assert_eq!(parse_change(&presence), None);

        let other = frame(json!({
            "topic": "realtime:elsewhere",
            "event": "postgres_changes",
            "payload": { "data": { "type": "DELETE", "old_record": { "id": "1" } } }
        }));
        assert_eq!(parse_change(&other), None);
    }
}
