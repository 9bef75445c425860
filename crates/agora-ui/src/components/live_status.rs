//! Live Status Indicator
//!
//! Shows whether the room receives live updates:
//! - "connecting" while the room loads
//! - "live" once history is in and the feed is open
//! - "offline" when the feed could not be opened

use dioxus::prelude::*;

/// Feed state as shown in the room header
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum LiveState {
    #[default]
    Connecting,
    Live,
    Offline,
}

impl LiveState {
    /// Returns the display label for this state
    pub fn label(&self) -> &'static str {
        match self {
            LiveState::Connecting => "connecting",
            LiveState::Live => "live",
            LiveState::Offline => "offline",
        }
    }

    /// Dot class; only the live state pulses
    pub fn dot_class(&self) -> &'static str {
        match self {
            LiveState::Connecting => "status-dot pending",
            LiveState::Live => "status-dot active",
            LiveState::Offline => "status-dot",
        }
    }
}

/// Dot and label for the feed state
///
/// # Example
///
/// ```rust,ignore
/// rsx! {
///     LiveStatus { state: LiveState::Live }
/// }
/// ```
#[component]
pub fn LiveStatus(state: LiveState) -> Element {
    let label = state.label();

    rsx! {
        div { class: "live-status",
            span {
                class: "{state.dot_class()}",
                role: "img",
                "aria-label": "{label}",
            }
            span { class: "status-label", "{label}" }
        }
    }
}
