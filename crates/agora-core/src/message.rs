//! Chat message types
//!
//! [`Message`] is a row of the shared `messages` table as the room sees it.
//! [`NewMessage`] is the insert payload the room sends; it serializes to
//! exactly the columns the backend expects and leaves the file columns out
//! entirely when there is no attachment.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ChatError, ChatResult};

/// Maximum body length in characters
pub const MAX_BODY_CHARS: usize = 500;

/// Descriptor of an uploaded file referenced by a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentDescriptor {
    /// Public URL of the blob
    #[serde(rename = "file_url")]
    pub url: String,
    /// Original file name, used when saving a download
    #[serde(rename = "file_name")]
    pub name: String,
    /// MIME type
    #[serde(rename = "file_type")]
    pub mime: String,
    /// Size in bytes
    #[serde(rename = "file_size")]
    pub size: u64,
}

/// A message in the room.
///
/// Immutable once created; the only change a message ever sees is removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MessageRow", into = "MessageRow")]
pub struct Message {
    /// Backend-assigned identifier
    pub id: String,
    /// Author display name
    pub username: String,
    /// Body text (may be empty when an attachment is present)
    pub body: String,
    /// Server-assigned creation time
    pub created_at: DateTime<Utc>,
    /// Optional attachment
    pub attachment: Option<AttachmentDescriptor>,
}

impl Message {
    /// Whether the viewer with the given name authored this message.
    ///
    /// Guests (no name) never own a message.
    pub fn is_authored_by(&self, viewer: Option<&str>) -> bool {
        viewer.is_some_and(|name| name == self.username)
    }

    /// Local `HH:mm` label for the creation time
    pub fn time_label(&self) -> String {
        self.created_at.with_timezone(&Local).format("%H:%M").to_string()
    }
}

/// Row id as the backend sends it: text (uuid, ulid) or a bigint key
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub(crate) enum RowId {
    Text(String),
    Number(i64),
}

impl From<RowId> for String {
    fn from(id: RowId) -> Self {
        match id {
            RowId::Text(s) => s,
            RowId::Number(n) => n.to_string(),
        }
    }
}

fn deserialize_row_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    RowId::deserialize(deserializer).map(String::from)
}

/// Wire shape of a row in the `messages` table
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MessageRow {
    #[serde(deserialize_with = "deserialize_row_id")]
    id: String,
    username: String,
    #[serde(default)]
    message: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    file_url: Option<String>,
    #[serde(default)]
    file_name: Option<String>,
    #[serde(default)]
    file_type: Option<String>,
    #[serde(default)]
    file_size: Option<u64>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        let attachment = row.file_url.map(|url| AttachmentDescriptor {
            name: row.file_name.unwrap_or_else(|| file_name_from_url(&url)),
            mime: row
                .file_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            size: row.file_size.unwrap_or(0),
            url,
        });
        Self {
            id: row.id,
            username: row.username,
            body: row.message.unwrap_or_default(),
            created_at: row.created_at,
            attachment,
        }
    }
}

impl From<Message> for MessageRow {
    fn from(msg: Message) -> Self {
        let (file_url, file_name, file_type, file_size) = match msg.attachment {
            Some(a) => (Some(a.url), Some(a.name), Some(a.mime), Some(a.size)),
            None => (None, None, None, None),
        };
        Self {
            id: msg.id,
            username: msg.username,
            message: Some(msg.body),
            created_at: msg.created_at,
            file_url,
            file_name,
            file_type,
            file_size,
        }
    }
}

fn file_name_from_url(url: &str) -> String {
    url.rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("download")
        .to_string()
}

/// Insert payload for a new message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMessage {
    /// Author display name
    pub username: String,
    /// Trimmed body text
    pub message: String,
    /// File columns, only present when a file was attached
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<AttachmentDescriptor>,
}

impl NewMessage {
    /// Build an insert payload, enforcing the message invariants.
    ///
    /// The body is trimmed. Fails when the trimmed body is longer than
    /// [`MAX_BODY_CHARS`], or when body and attachment are both empty.
    pub fn new(
        username: impl Into<String>,
        body: &str,
        attachment: Option<AttachmentDescriptor>,
    ) -> ChatResult<Self> {
        let message = body.trim().to_string();
        if message.chars().count() > MAX_BODY_CHARS {
            return Err(ChatError::InvalidMessage(format!(
                "body exceeds {} characters",
                MAX_BODY_CHARS
            )));
        }
        if message.is_empty() && attachment.is_none() {
            return Err(ChatError::InvalidMessage(
                "message needs text or an attachment".to_string(),
            ));
        }
        Ok(Self {
            username: username.into(),
            message,
            attachment,
        })
    }

    /// Materialize the row the backend would create for this payload.
    ///
    /// Used by backends that assign ids and timestamps themselves.
    pub fn into_message(self, id: String, created_at: DateTime<Utc>) -> Message {
        Message {
            id,
            username: self.username,
            body: self.message,
            created_at,
            attachment: self.attachment,
        }
    }
}
