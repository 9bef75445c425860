//! Toast Notifications
//!
//! Transient notices stacked in a corner of the window. The stack itself is
//! plain data ([`ToastQueue`]); the shell pushes notices and schedules the
//! dismissal after [`TOAST_DURATION`].

use std::time::Duration;

use agora_core::{Notice, NoticeLevel};
use dioxus::prelude::*;
use tracing::debug;

/// How long a toast stays up
pub const TOAST_DURATION: Duration = Duration::from_secs(4);

/// Oldest toasts are dropped beyond this many
pub const MAX_VISIBLE_TOASTS: usize = 4;

/// One visible notice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub notice: Notice,
}

impl Toast {
    pub fn class(&self) -> &'static str {
        match self.notice.level {
            NoticeLevel::Info => "toast toast-info",
            NoticeLevel::Success => "toast toast-success",
            NoticeLevel::Error => "toast toast-error",
        }
    }
}

/// Ordered toasts, newest last
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToastQueue {
    next_id: u64,
    toasts: Vec<Toast>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a notice; returns the id to dismiss it with
    pub fn push(&mut self, notice: Notice) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        debug!(id, level = ?notice.level, text = %notice.text, "Showing toast");
        self.toasts.push(Toast { id, notice });
        if self.toasts.len() > MAX_VISIBLE_TOASTS {
            let excess = self.toasts.len() - MAX_VISIBLE_TOASTS;
            self.toasts.drain(..excess);
        }
        id
    }

    /// Remove a toast. Unknown ids are ignored.
    pub fn dismiss(&mut self, id: u64) {
        self.toasts.retain(|t| t.id != id);
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

/// Renders the queue; clicking a toast dismisses it
#[component]
pub fn ToastStack(toasts: Vec<Toast>, ondismiss: EventHandler<u64>) -> Element {
    rsx! {
        div { class: "toast-stack", role: "status", "aria-live": "polite",
            for toast in toasts {
                div {
                    key: "{toast.id}",
                    class: "{toast.class()}",
                    onclick: move |_| ondismiss.call(toast.id),
                    "{toast.notice.text}"
                }
            }
        }
    }
}
