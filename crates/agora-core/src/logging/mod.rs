//! Diagnostic logging.
//!
//! Binaries log to the console through `tracing_subscriber::fmt` and, at the
//! same time, append every event as one JSON object per line under
//! `<data_dir>/logs/`:
//!
//! ```text
//! logs/
//! ├── 2026-10-17_desktop.jsonl
//! └── 2026-10-17_cli.jsonl
//! ```
//!
//! ```bash
//! # Failed sends across all instances
//! jq 'select(.msg == "Failed to send message")' logs/*.jsonl
//! ```

pub mod entry;
pub mod layer;
pub mod writer;

pub use entry::LogEntry;
pub use layer::{JsonlLayer, LoggingBuilder};
pub use writer::{read_entries, LogWriter};
