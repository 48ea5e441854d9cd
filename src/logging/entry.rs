//! Log entry model
//!
//! A `LogEntry` is immutable once built, and building one always runs the
//! redaction pass over its context.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::redaction::redact;

/// Structured context attached to an entry (insertion ordered)
pub type Context = Map<String, Value>;

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Get the display name for this level
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Check if this level is a warning or error
    pub fn is_alert(&self) -> bool {
        matches!(self, LogLevel::Warn | LogLevel::Error)
    }

    /// Map a level string reported by the wallet engine.
    ///
    /// Unrecognized strings fall back to `Info`.
    pub fn from_engine(level: &str) -> Self {
        level.parse().unwrap_or(LogLevel::Info)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a level string is not recognized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level: {0}")]
pub struct UnknownLevel(pub String);

impl FromStr for LogLevel {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" | "debug" => Ok(LogLevel::Debug),
            "info" | "information" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" | "fatal" => Ok(LogLevel::Error),
            _ => Err(UnknownLevel(s.to_string())),
        }
    }
}

/// A single log entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    timestamp: DateTime<Utc>,
    level: LogLevel,
    category: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<Context>,
}

impl LogEntry {
    /// Create a new entry stamped with the current time.
    ///
    /// The context is redacted before the entry exists, so an unredacted
    /// value is never held by a `LogEntry`.
    pub fn new(
        level: LogLevel,
        category: impl Into<String>,
        message: impl Into<String>,
        context: Option<Context>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            category: category.into(),
            message: message.into(),
            context: context.map(redact),
        }
    }

    /// When the entry was created
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Severity of the entry
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Subsystem the entry belongs to
    pub fn category(&self) -> &str {
        &self.category
    }

    /// The message as logged, line breaks included
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Redacted context, if any
    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    /// Render as `[<timestamp>] <LEVEL> [<category>] <message> <json-context>`
    ///
    /// Always a single physical line: line breaks in the category or message
    /// are escaped.
    pub fn format_line(&self) -> String {
        let timestamp = self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut line = format!(
            "[{}] {} [{}] {}",
            timestamp,
            self.level,
            escape_line_breaks(&self.category),
            escape_line_breaks(&self.message)
        );
        if let Some(context) = &self.context {
            line.push(' ');
            line.push_str(&context_to_string(context));
        }
        line
    }
}

fn escape_line_breaks(text: &str) -> String {
    text.replace('\r', "\\r").replace('\n', "\\n")
}

/// Serialize a context for text export, degrading instead of failing
fn context_to_string(context: &Context) -> String {
    serde_json::to_string(context)
        .unwrap_or_else(|e| format!("[unserializable context: {}]", e))
}
