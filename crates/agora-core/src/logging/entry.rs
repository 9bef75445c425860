//! One diagnostic log line.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A log event as written to the JSONL file.
///
/// Lines are self-contained so a file can be tailed, grepped or piped into
/// `jq` without any framing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// RFC 3339 UTC timestamp with milliseconds
    pub ts: String,
    /// trace, debug, info, warn or error
    pub level: String,
    /// Which app wrote the line (`desktop`, `cli`, or a `--instance` name)
    pub instance: String,
    /// Module path of the event
    pub target: String,
    pub msg: String,
    /// Structured fields such as `id` or `error`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Value>,
    /// Enclosing spans, root first, joined with ` > `
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<String>,
}

impl LogEntry {
    pub fn new(
        level: impl Into<String>,
        instance: impl Into<String>,
        target: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self {
            ts: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            level: level.into(),
            instance: instance.into(),
            target: target.into(),
            msg: msg.into(),
            fields: None,
            span: None,
        }
    }

    pub fn with_fields(mut self, fields: Value) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn with_span(mut self, span: impl Into<String>) -> Self {
        self.span = Some(span.into());
        self
    }

    /// Whether the entry is at `level` or more severe
    pub fn at_least(&self, level: &str) -> bool {
        severity(&self.level) >= severity(level)
    }

    /// One line of JSON, no trailing newline
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Compact human-readable rendering for terminals
    pub fn display_line(&self) -> String {
        let mut line = format!(
            "{} {:>5} {}: {}",
            self.ts,
            self.level.to_uppercase(),
            self.target,
            self.msg
        );
        if let Some(Value::Object(fields)) = &self.fields {
            for (key, value) in fields {
                match value {
                    Value::String(s) => line.push_str(&format!(" {}={}", key, s)),
                    other => line.push_str(&format!(" {}={}", key, other)),
                }
            }
        }
        line
    }
}

fn severity(level: &str) -> u8 {
    match level.to_ascii_lowercase().as_str() {
        "trace" => 0,
        "debug" => 1,
        "info" => 2,
        "warn" => 3,
        "error" => 4,
        _ => 0,
    }
}
