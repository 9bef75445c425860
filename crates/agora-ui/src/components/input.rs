//! Text Input
//!
//! Single-line input used by the name gate and the composer. Enter calls
//! `onenter`; a `max_chars` limit shows a counter and is enforced by the
//! element itself.

use std::sync::atomic::{AtomicU32, Ordering};

use dioxus::prelude::*;

use super::button::with_extra;

/// Properties for the Input component
#[derive(Clone, PartialEq, Props)]
pub struct InputProps {
    /// Current input value
    pub value: String,
    /// Handler called when input changes
    pub oninput: EventHandler<String>,
    /// Handler called on Enter (without Shift)
    #[props(default)]
    pub onenter: Option<EventHandler<()>>,
    /// Placeholder text
    #[props(default)]
    pub placeholder: Option<String>,
    /// Input label text
    #[props(default)]
    pub label: Option<String>,
    /// Character limit; also renders a `n/max` counter
    #[props(default)]
    pub max_chars: Option<usize>,
    /// Whether the input is disabled
    #[props(default = false)]
    pub disabled: bool,
    #[props(default = false)]
    pub autofocus: bool,
    /// Optional ID for label association
    #[props(default)]
    pub id: Option<String>,
    /// Optional additional CSS classes
    #[props(default)]
    pub class: Option<String>,
}

/// Text input field
///
/// # Example
///
/// ```rust,ignore
/// let mut name = use_signal(String::new);
///
/// rsx! {
///     Input {
///         value: name(),
///         oninput: move |s| name.set(s),
///         onenter: move |_| submit(),
///         placeholder: "Your name".to_string(),
///         max_chars: 30,
///         autofocus: true,
///     }
/// }
/// ```
#[component]
pub fn Input(props: InputProps) -> Element {
    let id = props.id.clone().unwrap_or_else(|| format!("input-{}", next_id()));
    let input_class = with_extra("input-field", props.class.as_deref());
    let counter = props
        .max_chars
        .map(|max| counter_label(&props.value, max));
    let maxlength = props.max_chars.map(|max| max.to_string());

    rsx! {
        div { class: "form-field",
            if let Some(label) = &props.label {
                label { class: "input-label", r#for: "{id}", "{label}" }
            }
            input {
                id: "{id}",
                class: "{input_class}",
                r#type: "text",
                value: "{props.value}",
                placeholder: props.placeholder.as_deref().unwrap_or(""),
                maxlength: maxlength,
                disabled: props.disabled,
                autofocus: props.autofocus,
                autocomplete: "off",
                oninput: move |e| props.oninput.call(e.value()),
                onkeydown: move |e| {
                    if e.key() == Key::Enter && !e.modifiers().shift() {
                        if let Some(handler) = &props.onenter {
                            e.prevent_default();
                            handler.call(());
                        }
                    }
                },
            }
            if let Some(counter) = counter {
                span { class: "input-counter", "{counter}" }
            }
        }
    }
}

/// `used/max` in characters
pub fn counter_label(value: &str, max: usize) -> String {
    format!("{}/{}", value.chars().count(), max)
}

/// Unique suffix for element IDs
fn next_id() -> u32 {
    static NEXT: AtomicU32 = AtomicU32::new(0);
    NEXT.fetch_add(1, Ordering::Relaxed)
}
