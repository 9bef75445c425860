use agora_core::{ChatServices, GateState, IdentityGate};
use agora_ui::{ToastQueue, ToastStack};
use dioxus::prelude::*;

use crate::chat_config;
use crate::context::Gate;
use crate::pages::{NameGate, Room};
use crate::theme::GLOBAL_STYLES;

/// Root application component.
///
/// Opens the services, provides context and switches between the name gate
/// and the room. There is no router: the gate state is the only navigation.
#[component]
pub fn App() -> Element {
    let services = use_hook(|| {
        chat_config().open().map_err(|e| {
            tracing::error!("Failed to open chat services: {}", e);
            e.to_string()
        })
    });

    match services {
        Ok(services) => rsx! {
            style { {GLOBAL_STYLES} }
            Shell { services }
        },
        Err(error) => rsx! {
            style { {GLOBAL_STYLES} }
            div { class: "fatal-screen",
                h1 { "Agora could not start" }
                p { class: "fatal-detail", "{error}" }
            }
        },
    }
}

#[derive(Clone, Props)]
struct ShellProps {
    services: ChatServices,
}

impl PartialEq for ShellProps {
    fn eq(&self, other: &Self) -> bool {
        std::sync::Arc::ptr_eq(&self.services.backend, &other.services.backend)
    }
}

fn Shell(props: ShellProps) -> Element {
    let services = use_context_provider(|| props.services.clone());
    let gate: Signal<Gate> = use_signal(|| IdentityGate::open(services.identity.clone()));
    let mut toasts = use_signal(ToastQueue::new);

    use_context_provider(|| gate);
    use_context_provider(|| toasts);

    let session = match gate.read().state() {
        GateState::Entered(session) => Some(session.clone()),
        GateState::Prompt => None,
    };

    rsx! {
        div { class: "app-shell",
            if let Some(session) = session {
                Room { key: "{session.author_name()}-{session.is_guest()}", session }
            } else {
                NameGate {}
            }
        }
        ToastStack {
            toasts: toasts.read().toasts().to_vec(),
            ondismiss: move |id| toasts.write().dismiss(id),
        }
    }
}
