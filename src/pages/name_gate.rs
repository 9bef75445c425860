//! Name Gate
//!
//! Blocking form shown until the viewer picks a display name or continues
//! as a guest.

use agora_core::identity::MAX_NAME_CHARS;
use agora_core::{DisplayName, Notice};
use agora_ui::{Button, ButtonVariant, Input};
use dioxus::prelude::*;

use crate::context::{show_notice, use_gate, use_toasts};

#[component]
pub fn NameGate() -> Element {
    let mut gate = use_gate();
    let toasts = use_toasts();
    let mut name = use_signal(String::new);

    let valid = DisplayName::parse(&name()).is_ok();

    let mut submit = move || {
        let raw = name();
        // Bind first so the write guard ends before any toast is shown
        let result = gate.write().submit(&raw);
        match result {
            Ok(session) => {
                tracing::info!(name = %session.author_name(), "Entered the room");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Display name rejected");
                show_notice(toasts, Notice::error(e.to_string()));
            }
        }
    };

    let continue_as_guest = move |_| {
        gate.write().continue_as_guest();
        tracing::info!("Entered the room as a guest");
    };

    rsx! {
        div { class: "gate-page",
            div { class: "gate-card",
                h1 { class: "gate-title", "Agora" }
                p { class: "gate-subtitle", "A public chat room. Pick a name to join." }

                Input {
                    value: name(),
                    oninput: move |value: String| name.set(value),
                    onenter: move |_| {
                        if valid {
                            submit();
                        }
                    },
                    label: "Your name".to_string(),
                    placeholder: "e.g. Ada".to_string(),
                    max_chars: MAX_NAME_CHARS,
                    autofocus: true,
                }

                div { class: "gate-actions",
                    Button {
                        variant: ButtonVariant::Primary,
                        disabled: !valid,
                        onclick: move |_| submit(),
                        "Join chat"
                    }
                    Button {
                        variant: ButtonVariant::Ghost,
                        onclick: continue_as_guest,
                        "Continue as guest"
                    }
                }
            }
        }
    }
}
