//! Error types for Agora

use thiserror::Error;

/// Main error type for Agora operations
#[derive(Error, Debug)]
pub enum ChatError {
    /// Display name failed validation
    #[error("Invalid display name: {0}")]
    InvalidName(String),

    /// Message body and attachment were both empty, or the body is too long
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Selected file exceeds the attachment size cap
    #[error("File too large: {size} bytes (max {max})")]
    FileTooLarge {
        /// Size of the rejected file in bytes
        size: u64,
        /// Configured maximum in bytes
        max: u64,
    },

    /// Selected file has a MIME type outside the allowed set
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Message was not found in the backend
    #[error("Message not found: {0}")]
    MessageNotFound(String),

    /// Blob was not found in object storage
    #[error("Blob not found: {0}")]
    BlobNotFound(String),

    /// Hosted backend answered with a non-success status
    #[error("Backend error ({status}): {body}")]
    Backend {
        /// HTTP status code
        status: u16,
        /// Response body, as returned by the backend
        body: String,
    },

    /// Realtime channel failure (join rejected, socket closed, bad frame)
    #[error("Realtime error: {0}")]
    Realtime(String),

    /// Configuration is incomplete or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error during storage operations (redb)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database creation/opening error
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    /// Transaction error
    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    /// Table error
    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    /// Storage operation error
    #[error("Storage operation error: {0}")]
    StorageOp(#[from] redb::StorageError),

    /// Commit error
    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    /// Error during serialization/deserialization
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP transport error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Websocket transport error
    #[error("Websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Malformed URL
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChatError {
    /// Whether the error was raised by client-side file validation,
    /// before anything reached the backend.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ChatError::FileTooLarge { .. }
                | ChatError::UnsupportedFileType(_)
                | ChatError::InvalidName(_)
                | ChatError::InvalidMessage(_)
        )
    }
}

/// Result type alias using ChatError
pub type ChatResult<T> = Result<T, ChatError>;
