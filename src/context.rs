//! Shared state for the desktop shell.
//!
//! `App` opens the [`ChatServices`] once and provides them, the identity gate
//! and the toast queue to every component via context.
//!
//! ## Usage
//!
//! ```ignore
//! let services = use_services();
//! let mut gate = use_gate();
//! let toasts = use_toasts();
//! show_notice(toasts, Notice::error("Failed to send message"));
//! ```

use std::sync::Arc;

use agora_core::{ChatServices, IdentityGate, IdentityStore, Notice, RoomController};
use agora_ui::{ToastQueue, TOAST_DURATION};
use dioxus::prelude::*;

/// Identity gate over whichever store the services provide
pub type Gate = IdentityGate<Arc<dyn IdentityStore>>;

/// Room controller shared by the room page and its children.
///
/// Compared by pointer so it can be passed through props and context.
#[derive(Clone)]
pub struct RoomHandle(pub Arc<RoomController>);

impl PartialEq for RoomHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::ops::Deref for RoomHandle {
    type Target = RoomController;

    fn deref(&self) -> &RoomController {
        &self.0
    }
}

/// Hook to access the identity store and backend.
pub fn use_services() -> ChatServices {
    use_context::<ChatServices>()
}

/// Hook to access the identity gate.
///
/// Writing to the gate switches between the name form and the room.
pub fn use_gate() -> Signal<Gate> {
    use_context::<Signal<Gate>>()
}

/// Hook to access the toast queue.
pub fn use_toasts() -> Signal<ToastQueue> {
    use_context::<Signal<ToastQueue>>()
}

/// Hook to access the room of the current page.
pub fn use_room() -> RoomHandle {
    use_context::<RoomHandle>()
}

/// Show a notice as a toast and dismiss it after [`TOAST_DURATION`].
pub fn show_notice(mut toasts: Signal<ToastQueue>, notice: Notice) {
    let id = toasts.write().push(notice);
    spawn(async move {
        tokio::time::sleep(TOAST_DURATION).await;
        toasts.write().dismiss(id);
    });
}
