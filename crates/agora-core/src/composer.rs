//! Message composer state.
//!
//! Holds the draft text, at most one selected file and the busy flag. The
//! composer never writes to the message table itself: a [`Submission`] uploads
//! its file and hands a ready [`NewMessage`] to the room controller.

use chrono::Utc;
use tracing::{debug, warn};

use crate::attachment::{object_name, PendingFile};
use crate::backend::BlobStore;
use crate::error::{ChatError, ChatResult};
use crate::identity::Session;
use crate::message::{NewMessage, MAX_BODY_CHARS};
use crate::notice::{self, Notice};

/// Notice for a file that failed client-side validation
pub fn file_rejection(err: &ChatError) -> Notice {
    match err {
        ChatError::FileTooLarge { .. } => Notice::error(notice::FILE_TOO_LARGE),
        ChatError::UnsupportedFileType(_) => Notice::error(notice::FILE_TYPE_REJECTED),
        other => Notice::error(other.to_string()),
    }
}

/// Draft, file slot and busy flag
#[derive(Debug, Default)]
pub struct Composer {
    draft: String,
    file: Option<PendingFile>,
    busy: bool,
    disabled: bool,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn file(&self) -> Option<&PendingFile> {
        self.file.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Lock or unlock the composer from outside (e.g. while the room loads)
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Whether inputs should accept changes
    pub fn is_locked(&self) -> bool {
        self.busy || self.disabled
    }

    /// Replace the draft, cut to the body length limit.
    pub fn set_draft(&mut self, text: &str) {
        if self.is_locked() {
            return;
        }
        self.draft = text.chars().take(MAX_BODY_CHARS).collect();
    }

    /// Put a file in the slot, replacing any previous selection.
    ///
    /// A file that fails validation is not kept; the previous selection, if
    /// any, stays.
    pub fn select_file(&mut self, file: PendingFile) -> Result<(), Notice> {
        if self.is_locked() {
            return Ok(());
        }
        if let Err(e) = file.validate() {
            warn!(name = %file.name, error = %e, "Rejected attachment");
            return Err(file_rejection(&e));
        }
        debug!(name = %file.name, size = file.size(), "Selected attachment");
        self.file = Some(file);
        Ok(())
    }

    /// Empty the file slot
    pub fn remove_file(&mut self) {
        if !self.is_locked() {
            self.file = None;
        }
    }

    /// Whether a submit would do anything
    pub fn can_submit(&self) -> bool {
        !self.is_locked() && (!self.draft.trim().is_empty() || self.file.is_some())
    }

    /// Start a submission and enter the busy state.
    ///
    /// Returns `None` when submission is blocked (busy, disabled, or nothing to
    /// send). A selected file is checked again here; if it fails, it is
    /// dropped, the draft is kept, busy stays off and a notice comes back.
    pub fn begin_submit(&mut self, session: &Session) -> Option<Result<Submission, Notice>> {
        if !self.can_submit() {
            return None;
        }

        if let Some(file) = &self.file {
            if let Err(e) = file.validate() {
                warn!(name = %file.name, error = %e, "Attachment failed validation at submit");
                self.file = None;
                return Some(Err(file_rejection(&e)));
            }
        }

        self.busy = true;
        Some(Ok(Submission {
            author: session.author_name().to_string(),
            body: self.draft.clone(),
            file: self.file.clone(),
        }))
    }

    /// End a submission. Draft and file are cleared whatever the outcome.
    pub fn finish(&mut self) {
        self.draft.clear();
        self.file = None;
        self.busy = false;
    }
}

/// Snapshot of the composer taken at submit time
#[derive(Debug, Clone)]
pub struct Submission {
    author: String,
    body: String,
    file: Option<PendingFile>,
}

impl Submission {
    /// Upload the file (if any) and build the insert payload.
    ///
    /// The upload always completes before the payload exists, so an insert can
    /// never reference a blob that is not there.
    pub async fn prepare<B: BlobStore + ?Sized>(self, blobs: &B) -> ChatResult<NewMessage> {
        let attachment = match self.file {
            Some(file) => {
                file.validate()?;
                let name = {
                    let mut rng = rand::rng();
                    object_name(&file.name, Utc::now().timestamp_millis(), &mut rng)
                };
                let url = blobs.put(&name, file.data.clone(), &file.mime).await?;
                debug!(object = %name, url = %url, "Attachment uploaded");
                Some(file.describe(url))
            }
            None => None,
        };
        NewMessage::new(self.author, &self.body, attachment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::MAX_ATTACHMENT_BYTES;
    use crate::backend::{FailPoint, MemoryBackend};
    use crate::identity::DisplayName;
    use crate::notice::NoticeLevel;

    fn ada() -> Session {
        Session::Named(DisplayName::parse("ada").unwrap())
    }

    fn big_file() -> PendingFile {
        PendingFile::new("huge.png", vec![0u8; MAX_ATTACHMENT_BYTES as usize + 1])
    }

    #[test]
    fn test_empty_composer_cannot_submit() {
        let mut composer = Composer::new();
        composer.set_draft("   ");
        assert!(!composer.can_submit());
        assert!(composer.begin_submit(&ada()).is_none());
        assert!(!composer.is_busy());
    }

    #[test]
    fn test_draft_is_capped() {
        let mut composer = Composer::new();
        composer.set_draft(&"a".repeat(MAX_BODY_CHARS + 20));
        assert_eq!(composer.draft().chars().count(), MAX_BODY_CHARS);
    }

    #[test]
    fn test_oversized_selection_rejected() {
        let mut composer = Composer::new();
        let notice = composer.select_file(big_file()).unwrap_err();

        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.text, crate::notice::FILE_TOO_LARGE);
        assert!(composer.file().is_none());
        assert!(!composer.is_busy());
    }

    #[test]
    fn test_new_selection_replaces_previous() {
        let mut composer = Composer::new();
        composer.select_file(PendingFile::new("a.png", vec![1])).unwrap();
        composer.select_file(PendingFile::new("b.pdf", vec![2])).unwrap();
        assert_eq!(composer.file().unwrap().name, "b.pdf");
    }

    #[test]
    fn test_rejected_selection_keeps_previous() {
        let mut composer = Composer::new();
        composer.select_file(PendingFile::new("a.png", vec![1])).unwrap();
        assert!(composer.select_file(PendingFile::new("x.exe", vec![2])).is_err());
        assert_eq!(composer.file().unwrap().name, "a.png");
    }

    #[test]
    fn test_busy_blocks_second_submit() {
        let mut composer = Composer::new();
        composer.set_draft("hello");
        assert!(matches!(composer.begin_submit(&ada()), Some(Ok(_))));
        assert!(composer.is_busy());

        assert!(composer.begin_submit(&ada()).is_none());
        composer.set_draft("changed");
        assert_eq!(composer.draft(), "hello");

        composer.finish();
        assert!(!composer.is_busy());
        assert_eq!(composer.draft(), "");
    }

    #[test]
    fn test_disabled_blocks_submit() {
        let mut composer = Composer::new();
        composer.set_draft("hello");
        composer.set_disabled(true);
        assert!(composer.begin_submit(&ada()).is_none());
    }

    #[test]
    fn test_submit_revalidates_file() {
        let mut composer = Composer::new();
        composer.set_draft("keep me");
        // Bypass selection-time validation
        composer.file = Some(big_file());

        let result = composer.begin_submit(&ada()).unwrap();
        assert!(result.is_err());
        assert!(composer.file().is_none());
        assert_eq!(composer.draft(), "keep me");
        assert!(!composer.is_busy());
    }

    #[tokio::test]
    async fn test_prepare_text_only_skips_upload() {
        let backend = MemoryBackend::new();
        let mut composer = Composer::new();
        composer.set_draft("  hello  ");

        let submission = composer.begin_submit(&ada()).unwrap().unwrap();
        let payload = submission.prepare(&backend).await.unwrap();

        assert_eq!(payload.username, "ada");
        assert_eq!(payload.message, "hello");
        assert!(payload.attachment.is_none());
        assert!(backend.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_prepare_uploads_then_describes() {
        let backend = MemoryBackend::new();
        let mut composer = Composer::new();
        composer
            .select_file(PendingFile::new("cat.png", vec![7u8; 1500]))
            .unwrap();

        let submission = composer.begin_submit(&ada()).unwrap().unwrap();
        let payload = submission.prepare(&backend).await.unwrap();

        let uploads = backend.uploads();
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0].0.ends_with(".png"));
        assert_eq!(uploads[0].1, "image/png");

        let attachment = payload.attachment.unwrap();
        assert_eq!(attachment.url, format!("memory://{}", uploads[0].0));
        assert_eq!(attachment.name, "cat.png");
        assert_eq!(attachment.mime, "image/png");
        assert_eq!(attachment.size, 1500);
        assert_eq!(payload.message, "");
    }

    #[tokio::test]
    async fn test_prepare_upload_failure() {
        let backend = MemoryBackend::new();
        backend.set_failing(FailPoint::Upload, true);

        let mut composer = Composer::new();
        composer
            .select_file(PendingFile::new("doc.pdf", vec![1, 2, 3]))
            .unwrap();
        let submission = composer.begin_submit(&ada()).unwrap().unwrap();

        assert!(submission.prepare(&backend).await.is_err());
        composer.finish();
        assert!(composer.file().is_none());
        assert!(!composer.is_busy());
    }

    #[test]
    fn test_guest_submits_as_guest_author() {
        let mut composer = Composer::new();
        composer.set_draft("hi");
        let submission = composer.begin_submit(&Session::Guest).unwrap().unwrap();
        assert_eq!(submission.author, crate::identity::GUEST_AUTHOR);
    }
}
