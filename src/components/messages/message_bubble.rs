//! Message Bubble Component
//!
//! One row of the room. Own messages sit on the right without an author
//! label; others on the left with one. Copy and delete appear on hover.

use agora_core::notice::{self, Notice};
use agora_core::MessageView;
use agora_ui::IconButton;
use dioxus::prelude::*;

use super::AttachmentPreview;
use crate::context::{show_notice, use_room, use_toasts};

#[component]
pub fn MessageBubble(view: MessageView) -> Element {
    let room = use_room();
    let toasts = use_toasts();
    let mut deleting = use_signal(|| false);

    let (row_class, bubble_class) = if view.is_own() {
        ("message-row message-row-sent", "message-bubble message-bubble-sent")
    } else {
        ("message-row message-row-received", "message-bubble message-bubble-received")
    };
    let row_class = if view.is_new {
        format!("{} message-enter", row_class)
    } else {
        row_class.to_string()
    };

    let copy = {
        let body = view.body.clone();
        move |_| {
            if body.is_empty() {
                return;
            }
            match arboard::Clipboard::new().and_then(|mut c| c.set_text(body.clone())) {
                Ok(()) => show_notice(toasts, Notice::success(notice::COPIED)),
                Err(e) => {
                    tracing::warn!("Clipboard not available: {}", e);
                    show_notice(toasts, Notice::error(notice::COPY_FAILED));
                }
            }
        }
    };

    let delete = {
        let id = view.id.clone();
        move |_| {
            if deleting() {
                return;
            }
            deleting.set(true);
            let room = room.clone();
            let id = id.clone();
            spawn(async move {
                if let Some(shown) = room.delete(&id).await {
                    show_notice(toasts, shown);
                }
                deleting.set(false);
            });
        }
    };

    rsx! {
        div { class: "{row_class}",
            div { class: "{bubble_class}",
                if let Some(author) = &view.author_label {
                    div { class: "message-bubble-sender", "{author}" }
                }

                if let Some(attachment) = &view.attachment {
                    AttachmentPreview {
                        message_id: view.id.clone(),
                        attachment: attachment.clone(),
                    }
                }

                if !view.body.is_empty() {
                    div { class: "message-bubble-content", "{view.body}" }
                }

                div { class: "message-bubble-footer",
                    span { class: "message-bubble-time", "{view.time_label}" }
                    div { class: "message-actions",
                        if view.can_copy {
                            IconButton {
                                aria_label: "Copy message".to_string(),
                                onclick: copy,
                                "\u{2398}"
                            }
                        }
                        if view.can_delete {
                            IconButton {
                                aria_label: "Delete message".to_string(),
                                class: "icon-btn-danger".to_string(),
                                disabled: deleting(),
                                onclick: delete,
                                "\u{1F5D1}"
                            }
                        }
                    }
                }
            }
        }
    }
}
