//! Message List Component
//!
//! Renders the room's rows oldest first, with loading and empty states. An
//! anchor after the last row is the scroll target for new messages.

use agora_core::MessageView;
use dioxus::prelude::*;

use super::MessageBubble;

#[component]
pub fn MessageList(
    /// Rendered rows, oldest first
    views: Vec<MessageView>,
    /// History is still loading
    #[props(default = false)]
    loading: bool,
) -> Element {
    if loading {
        return rsx! {
            div { class: "message-list loading",
                div { class: "loading-spinner" }
                p { class: "loading-text", "Loading messages..." }
            }
        };
    }

    if views.is_empty() {
        return rsx! {
            div { class: "message-list empty",
                p { class: "empty-state-message", "No messages yet" }
                p { class: "empty-state-hint", "Say hello to start the conversation." }
                div { id: "messages-end" }
            }
        };
    }

    rsx! {
        div { class: "message-list",
            for view in views {
                MessageBubble { key: "{view.id}", view: view.clone() }
            }
            div { id: "messages-end" }
        }
    }
}
