//! Theme: the global stylesheet injected by `App`.

mod styles;

pub use styles::GLOBAL_STYLES;
