use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{Level, LevelFilter, Log, Metadata, Record};
use serde::Serialize;
use serde_json::Value;

/// One JSON object per line on stderr.
#[derive(Clone, Debug, Serialize)]
pub struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    pub timestamp_ms: u64,
    pub level: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

impl StructuredLogLine {
    pub fn message(level: Level, target: &str, message: String) -> Self {
        Self {
            timestamp_ms: now_ms(),
            level: level_key(level).to_string(),
            target: target.to_string(),
            event: None,
            message: Some(message),
            details: Value::Null,
        }
    }

    pub fn event(level: Level, target: &str, event: &str, details: Value) -> Self {
        Self {
            timestamp_ms: now_ms(),
            level: level_key(level).to_string(),
            target: target.to_string(),
            event: Some(event.to_string()),
            message: None,
            details,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|error| {
            format!(r#"{{"level":"error","message":"log line failed to serialize: {error}"}}"#)
        })
    }
}

pub struct JsonLineLogger {
    level: LevelFilter,
}

impl JsonLineLogger {
    pub fn new(level: LevelFilter) -> Self {
        Self { level }
    }
}

impl Log for JsonLineLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = StructuredLogLine::message(
            record.level(),
            record.target(),
            record.args().to_string(),
        );
        let _ = writeln!(std::io::stderr().lock(), "{}", line.to_json());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Installs the JSON-line logger. A second call is a no-op.
pub fn init(level: LevelFilter) {
    if log::set_boxed_logger(Box::new(JsonLineLogger::new(level))).is_ok() {
        log::set_max_level(level);
    }
}

/// Structured event outside the `log` macros, for run summaries and session lifecycle.
pub fn emit_event(level: Level, event: &str, details: Value) {
    if level > log::max_level() {
        return;
    }
    let line = StructuredLogLine::event(level, "fill_blank_quiz", event, details);
    let _ = writeln!(std::io::stderr().lock(), "{}", line.to_json());
}

fn level_key(level: Level) -> &'static str {
    match level {
        Level::Error => "error",
        Level::Warn => "warn",
        Level::Info => "info",
        Level::Debug => "debug",
        Level::Trace => "trace",
    }
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
