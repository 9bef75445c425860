//! Agora UI Components
//!
//! Dioxus building blocks shared by the desktop shell.
//!
//! ## Look
//!
//! A light chat surface:
//! - **Indigo (#4f46e5)**: own messages, primary actions, focus rings
//! - **Slate (#f1f5f9)**: other people's messages, inputs
//! - **Rose (#e11d48)**: destructive actions and error toasts
//! - **Emerald (#059669)**: success toasts, live indicator

pub mod components;

pub use components::*;
