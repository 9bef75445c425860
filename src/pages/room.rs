//! Room Page
//!
//! Mounts a [`RoomController`] for the session, forwards its events into a
//! render counter, and lays out the header, message list and composer.
//! History and the live subscription start independently, so a feed that
//! never connects leaves the room usable.

use std::sync::Arc;

use agora_core::notice::LIVE_UPDATES_UNAVAILABLE;
use agora_core::{FeedStatus, Notice, RoomController, RoomEvent, RoomPhase, Session};
use agora_ui::{Button, ButtonVariant, LiveState, LiveStatus};
use dioxus::prelude::*;
use tokio::sync::broadcast::error::RecvError;

use crate::components::messages::{MessageCompose, MessageList};
use crate::context::{show_notice, use_gate, use_services, use_toasts, RoomHandle};

/// Smoothly scroll the newest message into view
const SCROLL_TO_NEWEST: &str = r#"
    const anchor = document.getElementById("messages-end");
    if (anchor) { anchor.scrollIntoView({ behavior: "smooth", block: "end" }); }
"#;

fn live_state(status: FeedStatus) -> LiveState {
    match status {
        FeedStatus::Connecting => LiveState::Connecting,
        FeedStatus::Live => LiveState::Live,
        FeedStatus::Lost => LiveState::Offline,
    }
}

#[component]
pub fn Room(session: Session) -> Element {
    let services = use_services();
    let toasts = use_toasts();
    let mut gate = use_gate();

    let room = use_hook(|| {
        RoomHandle(Arc::new(RoomController::new(
            services.backend.clone(),
            session.clone(),
        )))
    });
    use_context_provider(|| room.clone());

    // Bumped on every room event so the list re-renders
    let mut revision = use_signal(|| 0u64);
    let mut live = use_signal(LiveState::default);

    // Mount once: listen first, then subscribe and load history
    use_hook(|| {
        let room = room.clone();
        let mut events = room.events();

        let listener_room = room.clone();
        spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        revision += 1;
                        if event.changes_set() {
                            let _ = document::eval(SCROLL_TO_NEWEST);
                        }
                        match event {
                            RoomEvent::HistoryLoaded { count } => {
                                tracing::debug!(count, "Room ready");
                            }
                            RoomEvent::Feed { status } => {
                                live.set(live_state(status));
                                if status == FeedStatus::Lost {
                                    show_notice(toasts, Notice::error(LIVE_UPDATES_UNAVAILABLE));
                                }
                            }
                            _ => {}
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Room view fell behind");
                        revision += 1;
                        live.set(live_state(listener_room.feed_status()));
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        // A failed subscribe comes back as a lost-feed event
        let feed_room = room.clone();
        spawn(async move {
            let _ = feed_room.subscribe().await;
        });

        spawn(async move {
            if let Some(notice) = room.load_history().await {
                show_notice(toasts, notice);
            }
        });
    });

    {
        let room = room.clone();
        use_drop(move || room.unmount());
    }

    // Subscribe to the counter
    let _ = revision();
    let loading = room.phase() == RoomPhase::Loading;
    let views = room.views(true);

    let welcome = match session.viewer_name() {
        Some(name) => format!("Welcome, {}", name),
        None => "You are browsing as a guest".to_string(),
    };

    let change_name = move |_| {
        let result = gate.write().reset();
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to clear display name");
            show_notice(toasts, Notice::error(e.to_string()));
        }
    };

    rsx! {
        div { class: "room-page",
            header { class: "room-header",
                div { class: "room-heading",
                    h1 { class: "room-title", "Agora" }
                    span { class: "room-badge", "Public Chat" }
                    LiveStatus { state: live() }
                }
                div { class: "room-welcome",
                    span { "{welcome}" }
                    Button {
                        variant: ButtonVariant::Ghost,
                        onclick: change_name,
                        if session.is_guest() { "Pick a name" } else { "Change name" }
                    }
                }
            }

            MessageList { views, loading }

            MessageCompose { session: session.clone(), disabled: loading }
        }
    }
}
