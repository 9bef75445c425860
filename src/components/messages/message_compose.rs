//! Message Composer
//!
//! Text field, attach button, drop zone, selected-file chip and send button,
//! all driven by a [`Composer`]. Enter sends.

use std::path::{Path, PathBuf};

use agora_core::attachment::PICKER_EXTENSIONS;
use agora_core::message::MAX_BODY_CHARS;
use agora_core::notice::{self, Notice};
use agora_core::{format_bytes, Composer, PendingFile, Session};
use agora_ui::{Button, ButtonVariant, CloseButton, IconButton, Input};
use dioxus::html::HasFileData;
use dioxus::prelude::*;
use rfd::FileDialog;

use crate::context::{show_notice, use_room, use_toasts};

/// Last path component of a dropped file
fn display_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
        .to_string()
}

#[component]
pub fn MessageCompose(
    /// Who the message is posted as
    session: Session,
    /// Locks the composer (e.g. while history loads)
    #[props(default = false)]
    disabled: bool,
) -> Element {
    let room = use_room();
    let toasts = use_toasts();
    let mut composer = use_signal(Composer::new);
    let mut drag_over = use_signal(|| false);

    let (draft, file, busy, can_submit) = {
        let c = composer.read();
        (
            c.draft().to_string(),
            c.file().cloned(),
            c.is_busy(),
            c.can_submit() && !disabled,
        )
    };
    let locked = busy || disabled;

    let mut select = move |file: PendingFile| {
        let result = composer.write().select_file(file);
        if let Err(rejected) = result {
            show_notice(toasts, rejected);
        }
    };

    let send = {
        let room = room.clone();
        move || {
            let begun = {
                let mut c = composer.write();
                c.set_disabled(disabled);
                c.begin_submit(&session)
            };
            match begun {
                None => {}
                Some(Err(rejected)) => show_notice(toasts, rejected),
                Some(Ok(submission)) => {
                    let room = room.clone();
                    spawn(async move {
                        let outcome = room.send(submission).await;
                        composer.write().finish();
                        if let Some(failed) = outcome {
                            show_notice(toasts, failed);
                        }
                    });
                }
            }
        }
    };
    let mut send_on_enter = send.clone();
    let mut send_on_click = send;

    let pick_file = move |_| {
        spawn(async move {
            let picked: Option<PathBuf> = tokio::task::spawn_blocking(|| {
                FileDialog::new()
                    .add_filter("Attachments", PICKER_EXTENSIONS)
                    .set_title("Attach a file")
                    .pick_file()
            })
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("File dialog failed: {}", e);
                None
            });

            let Some(path) = picked else {
                return;
            };
            match PendingFile::from_path(&path).await {
                Ok(file) => select(file),
                Err(e) => {
                    tracing::warn!(path = ?path, error = %e, "Failed to read attachment");
                    show_notice(toasts, Notice::error(notice::FILE_UNREADABLE));
                }
            }
        });
    };

    let on_drop = move |evt: DragEvent| {
        evt.prevent_default();
        drag_over.set(false);
        if locked {
            return;
        }
        let Some(engine) = evt.files() else {
            return;
        };
        let Some(first) = engine.files().into_iter().next() else {
            return;
        };
        spawn(async move {
            match engine.read_file(&first).await {
                Some(bytes) => select(PendingFile::new(display_name(&first), bytes)),
                None => {
                    tracing::warn!(file = %first, "Failed to read dropped file");
                    show_notice(toasts, Notice::error(notice::FILE_UNREADABLE));
                }
            }
        });
    };

    let zone_class = if drag_over() {
        "composer drag-over"
    } else {
        "composer"
    };

    rsx! {
        div {
            class: "{zone_class}",
            ondragover: move |evt| {
                evt.prevent_default();
                drag_over.set(true);
            },
            ondragleave: move |_| drag_over.set(false),
            ondrop: on_drop,

            if let Some(file) = file {
                div { class: "file-chip",
                    span { class: "file-chip-name", "{file.name}" }
                    span { class: "file-chip-size", "{format_bytes(file.size())}" }
                    if !locked {
                        CloseButton {
                            aria_label: "Remove file".to_string(),
                            onclick: move |_| composer.write().remove_file(),
                        }
                    }
                }
            }

            div { class: "composer-row",
                IconButton {
                    aria_label: "Attach a file".to_string(),
                    disabled: locked,
                    onclick: pick_file,
                    "\u{1F4CE}"
                }
                Input {
                    value: draft,
                    oninput: move |value: String| composer.write().set_draft(&value),
                    onenter: move |_| send_on_enter(),
                    placeholder: "Type a message...".to_string(),
                    max_chars: MAX_BODY_CHARS,
                    disabled: locked,
                    class: "composer-input".to_string(),
                }
                Button {
                    variant: ButtonVariant::Primary,
                    disabled: !can_submit,
                    busy: busy,
                    onclick: move |_| send_on_click(),
                    "Send"
                }
            }
        }
    }
}
