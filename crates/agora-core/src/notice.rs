//! User-facing notices.
//!
//! Recoverable failures never interrupt the room; they surface as a short
//! notice (a toast on the desktop, a stderr line in the CLI).

use std::fmt;

/// Shown when the initial history load fails
pub const LOAD_FAILED: &str = "Failed to load messages";
/// Shown when an upload or insert fails
pub const SEND_FAILED: &str = "Failed to send message";
/// Shown when a delete fails
pub const DELETE_FAILED: &str = "Failed to delete message";
/// Shown when a file is over the size cap
pub const FILE_TOO_LARGE: &str = "File is too large (max 10 MB)";
/// Shown when a file type is not accepted
pub const FILE_TYPE_REJECTED: &str = "File type not supported";
/// Shown when the realtime subscription cannot be opened
pub const LIVE_UPDATES_UNAVAILABLE: &str = "Live updates unavailable";
/// Shown when a download fails
pub const DOWNLOAD_FAILED: &str = "Failed to download file";
/// Shown when the clipboard rejects a copy
pub const COPY_FAILED: &str = "Failed to copy message";
/// Shown after a successful copy
pub const COPIED: &str = "Copied to clipboard";
/// Shown when a picked or dropped file cannot be read
pub const FILE_UNREADABLE: &str = "Could not read file";

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A short message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
