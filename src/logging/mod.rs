//! Structured logging for the wallet
//!
//! Provides the redacting log entry model, the in-memory ring buffer, the
//! categorized logger, the wallet engine bridge and the side-channel
//! diagnostics subscriber.

mod buffer;
mod diagnostics;
mod engine;
mod entry;
mod logger;
mod redaction;

pub use buffer::{LogBuffer, DEFAULT_MAX_ENTRIES};
pub use diagnostics::{init_diagnostics, DEFAULT_FILTER};
pub use engine::{
    engine_listener, pipe_engine_stream, register_engine_logging, EngineLogListener,
    EngineLogRecord, LogListenerRegistry,
};
pub use entry::{Context, LogEntry, LogLevel, UnknownLevel};
pub use logger::{category, Logger, CONSOLE_TARGET};
pub use redaction::{is_sensitive_key, redact, REDACTED, SENSITIVE_KEYS};
