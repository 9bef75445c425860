//! Attachment selection, validation and naming.
//!
//! Validation runs entirely on the client, before any upload, so a rejected
//! file never reaches object storage.

use std::path::Path;

use bytes::Bytes;
use rand::Rng;

use crate::error::{ChatError, ChatResult};
use crate::message::AttachmentDescriptor;

/// Maximum attachment size: 10 MiB
pub const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

/// Object storage bucket used when none is configured
pub const DEFAULT_BUCKET: &str = "chat-files";

/// MIME types accepted for upload
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
    "image/bmp",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
];

/// File extensions offered by the file picker
pub const PICKER_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "bmp", "pdf", "doc", "docx", "txt",
];

const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const SUFFIX_LEN: usize = 8;

/// How an attachment is presented in the message list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    /// Inline preview, click to open full size
    Image,
    /// File card with name, size and a download action
    Document,
}

impl AttachmentKind {
    /// Classify a MIME type.
    pub fn of(mime: &str) -> Self {
        if mime.starts_with("image/") {
            AttachmentKind::Image
        } else {
            AttachmentKind::Document
        }
    }
}

/// Infer a MIME type from a file name's extension.
pub fn mime_for_file_name(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Check a file against the size cap and the allowed type set.
pub fn validate(size: u64, mime: &str) -> ChatResult<()> {
    if size > MAX_ATTACHMENT_BYTES {
        return Err(ChatError::FileTooLarge {
            size,
            max: MAX_ATTACHMENT_BYTES,
        });
    }
    if !ALLOWED_MIME_TYPES.contains(&mime) {
        return Err(ChatError::UnsupportedFileType(mime.to_string()));
    }
    Ok(())
}

/// Generate a collision-resistant object name for an upload.
///
/// Format: `<unix millis>-<8 lowercase alphanumerics>[.<original extension>]`.
pub fn object_name<R: Rng + ?Sized>(original: &str, now_ms: i64, rng: &mut R) -> String {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.random_range(0..SUFFIX_CHARSET.len())] as char)
        .collect();

    match Path::new(original).extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!("{}-{}.{}", now_ms, suffix, ext),
        _ => format!("{}-{}", now_ms, suffix),
    }
}

/// Format a byte count for display: `0 Bytes`, `1 KB`, `1.46 KB`, `3.5 MB`.
///
/// Picks the largest unit that keeps the value at or above 1, rounds to two
/// decimals and drops trailing zeros.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

/// A file chosen in the composer but not yet uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    /// Original file name
    pub name: String,
    /// MIME type (inferred from the name unless overridden)
    pub mime: String,
    /// File contents
    pub data: Bytes,
}

impl PendingFile {
    /// Build a pending file from in-memory bytes (drag-and-drop path).
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let name = name.into();
        let mime = mime_for_file_name(&name).to_string();
        Self {
            name,
            mime,
            data: data.into(),
        }
    }

    /// Read a file from disk (file-picker path).
    ///
    /// The size is checked against the cap before the contents are read, so an
    /// oversized pick is rejected without loading it.
    pub async fn from_path(path: impl AsRef<Path>) -> ChatResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string();

        let meta = tokio::fs::metadata(path).await?;
        let mime = mime_for_file_name(&name);
        validate(meta.len(), mime)?;

        let data = tokio::fs::read(path).await?;
        Ok(Self::new(name, data))
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Validate against the size cap and allowed types.
    pub fn validate(&self) -> ChatResult<()> {
        validate(self.size(), &self.mime)
    }

    /// Presentation kind
    pub fn kind(&self) -> AttachmentKind {
        AttachmentKind::of(&self.mime)
    }

    /// Descriptor for this file once it is reachable at `url`.
    pub fn describe(&self, url: String) -> AttachmentDescriptor {
        AttachmentDescriptor {
            url,
            name: self.name.clone(),
            mime: self.mime.clone(),
            size: self.size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(1), "1 Bytes");
        assert_eq!(format_bytes(1023), "1023 Bytes");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1500), "1.46 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(10 * 1024 * 1024), "10 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3 GB");
    }

    #[test]
    fn test_validate_size_cap() {
        assert!(validate(MAX_ATTACHMENT_BYTES, "image/png").is_ok());
        let err = validate(MAX_ATTACHMENT_BYTES + 1, "image/png").unwrap_err();
        assert!(matches!(err, ChatError::FileTooLarge { .. }));
    }

    #[test]
    fn test_validate_type() {
        for mime in ALLOWED_MIME_TYPES {
            assert!(validate(1, mime).is_ok(), "{} should be allowed", mime);
        }
        assert!(matches!(
            validate(1, "image/svg+xml"),
            Err(ChatError::UnsupportedFileType(_))
        ));
        assert!(validate(1, "application/zip").is_err());
    }

    #[test]
    fn test_size_checked_before_type() {
        let err = validate(MAX_ATTACHMENT_BYTES + 1, "application/zip").unwrap_err();
        assert!(matches!(err, ChatError::FileTooLarge { .. }));
    }

    #[test]
    fn test_mime_for_file_name() {
        assert_eq!(mime_for_file_name("photo.JPG"), "image/jpeg");
        assert_eq!(mime_for_file_name("notes.txt"), "text/plain");
        assert_eq!(
            mime_for_file_name("cv.docx"),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(mime_for_file_name("archive"), "application/octet-stream");
    }

    #[test]
    fn test_object_name_keeps_extension() {
        let mut rng = StdRng::seed_from_u64(7);
        let name = object_name("Holiday Photo.jpeg", 1_700_000_000_000, &mut rng);
        assert!(name.starts_with("1700000000000-"));
        assert!(name.ends_with(".jpeg"));

        let suffix = &name["1700000000000-".len()..name.len() - ".jpeg".len()];
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_object_name_without_extension() {
        let mut rng = StdRng::seed_from_u64(7);
        let name = object_name("README", 5, &mut rng);
        assert!(name.starts_with("5-"));
        assert!(!name.contains('.'));
    }

    #[test]
    fn test_object_names_differ() {
        let mut rng = StdRng::seed_from_u64(1);
        let a = object_name("a.png", 1, &mut rng);
        let b = object_name("a.png", 1, &mut rng);
        assert_ne!(a, b);
    }

    #[test]
    fn test_pending_file_describe() {
        let file = PendingFile::new("cat.png", vec![0u8; 2048]);
        assert_eq!(file.mime, "image/png");
        assert_eq!(file.kind(), AttachmentKind::Image);

        let descriptor = file.describe("https://cdn/x.png".into());
        assert_eq!(descriptor.name, "cat.png");
        assert_eq!(descriptor.mime, "image/png");
        assert_eq!(descriptor.size, 2048);
    }

    #[tokio::test]
    async fn test_from_path_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let file = PendingFile::from_path(&path).await.unwrap();
        assert_eq!(file.name, "notes.txt");
        assert_eq!(file.mime, "text/plain");
        assert_eq!(file.size(), 5);
    }

    #[tokio::test]
    async fn test_from_path_rejects_disallowed_type() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tool.exe");
        std::fs::write(&path, b"MZ").unwrap();

        let err = PendingFile::from_path(&path).await.unwrap_err();
        assert!(matches!(err, ChatError::UnsupportedFileType(_)));
    }
}
