//! Attachment Preview
//!
//! Images render inline (click for full size, download on hover); anything
//! else renders as a file card with name, size and a download action.
//! Downloads always save under the original file name.

use agora_core::notice::{self, Notice};
use agora_core::{AttachmentKind, AttachmentView, BlobStore};
use base64::Engine;
use dioxus::prelude::*;
use rfd::FileDialog;

use crate::context::{show_notice, use_room, use_services, use_toasts, RoomHandle};

/// Source usable in an `img` tag.
///
/// Hosted blobs load straight from their URL; local and in-memory blobs are
/// read through the backend and inlined as a data URI.
async fn image_source<B: BlobStore + ?Sized>(url: String, mime: String, blobs: &B) -> Option<String> {
    if url.starts_with("http://") || url.starts_with("https://") {
        return Some(url);
    }
    match blobs.fetch(&url).await {
        Ok(data) => {
            let encoded = base64::engine::general_purpose::STANDARD.encode(&data);
            Some(format!("data:{};base64,{}", mime, encoded))
        }
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Failed to load image preview");
            None
        }
    }
}

/// Fetch a message's attachment and save it where the user picks
async fn save_attachment(room: RoomHandle, message_id: String) -> Result<Option<String>, String> {
    let (attachment, data) = room
        .download(&message_id)
        .await
        .map_err(|e| e.to_string())?;

    let file_name = attachment.name.clone();
    let target = tokio::task::spawn_blocking(move || {
        FileDialog::new()
            .set_title("Save attachment")
            .set_file_name(&file_name)
            .save_file()
    })
    .await
    .map_err(|e| e.to_string())?;

    let Some(path) = target else {
        return Ok(None);
    };
    tokio::fs::write(&path, &data)
        .await
        .map_err(|e| e.to_string())?;
    tracing::info!(path = ?path, size = data.len(), "Saved attachment");
    Ok(Some(attachment.name))
}

#[component]
pub fn AttachmentPreview(message_id: String, attachment: AttachmentView) -> Element {
    let room = use_room();
    let services = use_services();
    let toasts = use_toasts();
    let mut expanded = use_signal(|| false);
    let mut saving = use_signal(|| false);

    let preview = {
        let url = attachment.url.clone();
        let mime = attachment.mime.clone();
        let is_image = attachment.kind == AttachmentKind::Image;
        use_resource(move || {
            let url = url.clone();
            let mime = mime.clone();
            let backend = services.backend.clone();
            async move {
                if !is_image {
                    return None;
                }
                image_source(url, mime, backend.as_ref()).await
            }
        })
    };

    let download = move |_| {
        if saving() {
            return;
        }
        saving.set(true);
        let room = room.clone();
        let message_id = message_id.clone();
        spawn(async move {
            match save_attachment(room, message_id).await {
                Ok(Some(name)) => show_notice(toasts, Notice::success(format!("Saved {}", name))),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to download attachment");
                    show_notice(toasts, Notice::error(notice::DOWNLOAD_FAILED));
                }
            }
            saving.set(false);
        });
    };

    match attachment.kind {
        AttachmentKind::Image => {
            let picture = match preview.read().clone().flatten() {
                Some(src) => rsx! {
                    img {
                        src: "{src}",
                        alt: "{attachment.name}",
                        onclick: move |_| expanded.set(true),
                    }
                    if expanded() {
                        div {
                            class: "lightbox",
                            onclick: move |_| expanded.set(false),
                            img { class: "lightbox-image", src: "{src}", alt: "{attachment.name}" }
                        }
                    }
                },
                None => rsx! {
                    div { class: "attachment-image-placeholder", "{attachment.name}" }
                },
            };
            rsx! {
                div { class: "attachment-image",
                    {picture}
                    button {
                        class: "attachment-download-overlay",
                        title: "Download",
                        disabled: saving(),
                        onclick: download,
                        "\u{2B07}"
                    }
                }
            }
        }
        AttachmentKind::Document => rsx! {
            div { class: "attachment-card",
                span { class: "attachment-icon", "\u{1F4C4}" }
                div { class: "attachment-meta",
                    span { class: "attachment-name", "{attachment.name}" }
                    span { class: "attachment-size", "{attachment.size_label}" }
                }
                button {
                    class: "attachment-download",
                    disabled: saving(),
                    onclick: download,
                    if saving() { "Saving..." } else { "Download" }
                }
            }
        },
    }
}
