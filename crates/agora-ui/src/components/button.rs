//! Button Components
//!
//! - Primary: send, enter the room
//! - Ghost: secondary actions such as "change name" or "continue as guest"
//! - Danger: delete
//! - Icon buttons for compact per-message actions

use dioxus::prelude::*;

/// Button style variants
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ButtonVariant {
    /// Filled indigo button for the main action
    #[default]
    Primary,
    /// Borderless, muted text
    Ghost,
    /// Rose text, filled on hover
    Danger,
}

impl ButtonVariant {
    /// Returns the CSS class for this variant
    pub fn class(&self) -> &'static str {
        match self {
            ButtonVariant::Primary => "btn-primary",
            ButtonVariant::Ghost => "btn-ghost",
            ButtonVariant::Danger => "btn-danger",
        }
    }
}

/// Join a base class with optional extra classes
pub(crate) fn with_extra(base: &str, extra: Option<&str>) -> String {
    match extra {
        Some(extra) if !extra.is_empty() => format!("{} {}", base, extra),
        _ => base.to_string(),
    }
}

/// Properties for the Button component
#[derive(Clone, PartialEq, Props)]
pub struct ButtonProps {
    /// Visual style variant
    #[props(default)]
    pub variant: ButtonVariant,
    /// Button content (text, icons, etc.)
    pub children: Element,
    /// Click handler
    #[props(default)]
    pub onclick: Option<EventHandler<()>>,
    /// Whether the button is disabled
    #[props(default = false)]
    pub disabled: bool,
    /// Shows a spinner in place of the content
    #[props(default = false)]
    pub busy: bool,
    /// Optional type attribute (button, submit, reset)
    #[props(default = "button".to_string())]
    pub button_type: String,
    /// Optional additional CSS classes
    #[props(default)]
    pub class: Option<String>,
}

/// Styled button
///
/// A busy button is also disabled.
///
/// # Example
///
/// ```rust,ignore
/// rsx! {
///     Button {
///         variant: ButtonVariant::Primary,
///         busy: sending(),
///         disabled: !can_send,
///         onclick: move |_| submit(),
///         "Send"
///     }
/// }
/// ```
#[component]
pub fn Button(props: ButtonProps) -> Element {
    let full_class = with_extra(props.variant.class(), props.class.as_deref());

    rsx! {
        button {
            class: "{full_class}",
            r#type: "{props.button_type}",
            disabled: props.disabled || props.busy,
            "aria-busy": if props.busy { "true" } else { "false" },
            onclick: move |_| {
                if let Some(handler) = &props.onclick {
                    handler.call(());
                }
            },
            if props.busy {
                span { class: "spinner", role: "status", "aria-label": "Working" }
            } else {
                {props.children}
            }
        }
    }
}

/// Icon button for compact actions (copy, delete, remove file)
#[derive(Clone, PartialEq, Props)]
pub struct IconButtonProps {
    /// The icon content (character or element)
    pub children: Element,
    /// Click handler
    pub onclick: EventHandler<()>,
    /// Accessible label, also used as the tooltip
    pub aria_label: String,
    #[props(default = false)]
    pub disabled: bool,
    /// Optional additional CSS classes
    #[props(default)]
    pub class: Option<String>,
}

#[component]
pub fn IconButton(props: IconButtonProps) -> Element {
    let full_class = with_extra("icon-btn", props.class.as_deref());

    rsx! {
        button {
            class: "{full_class}",
            r#type: "button",
            title: "{props.aria_label}",
            "aria-label": "{props.aria_label}",
            disabled: props.disabled,
            onclick: move |evt| {
                evt.stop_propagation();
                props.onclick.call(());
            },
            {props.children}
        }
    }
}

/// Close button with X icon
#[component]
pub fn CloseButton(onclick: EventHandler<()>, #[props(default)] aria_label: Option<String>) -> Element {
    rsx! {
        IconButton {
            onclick: onclick,
            aria_label: aria_label.unwrap_or_else(|| "Close".to_string()),
            class: "close-btn".to_string(),
            "\u{00D7}"
        }
    }
}
