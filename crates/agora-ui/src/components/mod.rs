//! Reusable UI components
//!
//! Class names match the stylesheet injected by the desktop shell.

mod button;
mod input;
mod live_status;
mod toast;

pub use button::*;
pub use input::*;
pub use live_status::*;
pub use toast::*;
