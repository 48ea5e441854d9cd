//! Structured logger
//!
//! Every call funnels through [`Logger::log`], which never fails: contexts are
//! redacted while the entry is built, the entry is appended to the ring
//! buffer, and it is optionally mirrored to the console sink.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use serde_json::{json, Map, Value};

use super::buffer::{LogBuffer, DEFAULT_MAX_ENTRIES};
use super::entry::{Context, LogEntry, LogLevel};

/// Tracing target used for console mirroring
pub const CONSOLE_TARGET: &str = "logvault::console";

/// Fixed categories used by the helper methods
pub mod category {
    pub const APP: &str = "app";
    pub const AUTH: &str = "auth";
    pub const WALLET: &str = "wallet";
    pub const PAYMENT: &str = "payment";
    pub const NETWORK: &str = "network";
    pub const ENGINE: &str = "engine";
    pub const EXPORT: &str = "export";
}

/// Categorized, leveled logger backed by a ring buffer
#[derive(Debug)]
pub struct Logger {
    buffer: LogBuffer,
    console_mirroring: AtomicBool,
}

impl Logger {
    /// Create a logger keeping at most `max_entries` entries
    pub fn new(max_entries: usize, console_mirroring: bool) -> Self {
        Self {
            buffer: LogBuffer::new(max_entries),
            console_mirroring: AtomicBool::new(console_mirroring),
        }
    }

    /// Toggle mirroring of new entries to the console sink
    pub fn set_console_mirroring(&self, enabled: bool) {
        self.console_mirroring.store(enabled, Ordering::Relaxed);
    }

    /// Whether new entries are mirrored to the console sink
    pub fn console_mirroring(&self) -> bool {
        self.console_mirroring.load(Ordering::Relaxed)
    }

    /// Record an entry.
    ///
    /// An object context is used as-is, `null` means no context, and any
    /// other value is wrapped as `{"value": ...}`.
    pub fn log(
        &self,
        level: LogLevel,
        category: &str,
        message: impl Into<String>,
        context: Option<Value>,
    ) {
        let context = context.and_then(into_context);
        let entry = LogEntry::new(level, category, message, context);

        if self.console_mirroring() {
            mirror(&entry);
        }

        self.buffer.push(entry);
    }

    /// Record an entry with any serializable context.
    ///
    /// A context that fails to serialize is replaced by a textual marker so
    /// the entry is still kept.
    pub fn log_with<T>(
        &self,
        level: LogLevel,
        category: &str,
        message: impl Into<String>,
        context: &T,
    ) where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(context)
            .unwrap_or_else(|e| json!({ "context": format!("[unserializable: {}]", e) }));
        self.log(level, category, message, Some(value));
    }

    /// Record a DEBUG entry
    pub fn debug(&self, category: &str, message: impl Into<String>, context: Option<Value>) {
        self.log(LogLevel::Debug, category, message, context);
    }

    /// Record an INFO entry
    pub fn info(&self, category: &str, message: impl Into<String>, context: Option<Value>) {
        self.log(LogLevel::Info, category, message, context);
    }

    /// Record a WARN entry
    pub fn warn(&self, category: &str, message: impl Into<String>, context: Option<Value>) {
        self.log(LogLevel::Warn, category, message, context);
    }

    /// Record an ERROR entry
    pub fn error(&self, category: &str, message: impl Into<String>, context: Option<Value>) {
        self.log(LogLevel::Error, category, message, context);
    }

    // Fixed-category helpers

    /// A successful unlock or sign-in
    pub fn auth_success(&self, method: &str) {
        self.info(
            category::AUTH,
            "Authentication succeeded",
            Some(json!({ "method": method })),
        );
    }

    /// A rejected unlock or sign-in
    pub fn auth_failed(&self, method: &str, reason: &str) {
        self.warn(
            category::AUTH,
            "Authentication failed",
            Some(json!({ "method": method, "reason": reason })),
        );
    }

    /// The wallet engine connected
    pub fn wallet_connected(&self) {
        self.info(category::WALLET, "Wallet connected", None);
    }

    /// The wallet engine disconnected, with an optional reason
    pub fn wallet_disconnected(&self, reason: Option<&str>) {
        self.info(
            category::WALLET,
            "Wallet disconnected",
            reason.map(|r| json!({ "reason": r })),
        );
    }

    /// A failed wallet operation
    pub fn wallet_error(&self, operation: &str, error: &str) {
        self.error(
            category::WALLET,
            format!("Wallet operation failed: {}", operation),
            Some(json!({ "error": error })),
        );
    }

    /// A payment of `kind` was started
    pub fn payment_initiated(&self, kind: &str, amount_sats: Option<u64>) {
        self.info(
            category::PAYMENT,
            "Payment initiated",
            Some(json!({ "type": kind, "amountSats": amount_sats })),
        );
    }

    /// A payment of `kind` settled
    pub fn payment_succeeded(&self, kind: &str, amount_sats: Option<u64>) {
        self.info(
            category::PAYMENT,
            "Payment succeeded",
            Some(json!({ "type": kind, "amountSats": amount_sats })),
        );
    }

    /// A payment of `kind` failed
    pub fn payment_failed(&self, kind: &str, error: &str) {
        self.error(
            category::PAYMENT,
            "Payment failed",
            Some(json!({ "type": kind, "error": error })),
        );
    }

    /// Connectivity changed; offline is logged as a warning
    pub fn network_status(&self, online: bool) {
        if online {
            self.info(category::NETWORK, "Network online", None);
        } else {
            self.warn(category::NETWORK, "Network offline", None);
        }
    }

    /// An application lifecycle event
    pub fn app_lifecycle(&self, event: &str) {
        self.info(category::APP, format!("Lifecycle: {}", event), None);
    }

    /// An export archive was produced
    pub fn export_completed(&self, file_name: &str, files: usize) {
        self.info(
            category::EXPORT,
            "Logs exported",
            Some(json!({ "fileName": file_name, "files": files })),
        );
    }

    /// An export could not be produced
    pub fn export_failed(&self, error: &str) {
        self.error(
            category::EXPORT,
            "Log export failed",
            Some(json!({ "error": error })),
        );
    }

    // Read accessors

    /// All buffered entries in insertion order
    pub fn logs(&self) -> Vec<LogEntry> {
        self.buffer.all_entries()
    }

    /// Entries of exactly `level`, in insertion order
    pub fn logs_by_level(&self, level: LogLevel) -> Vec<LogEntry> {
        self.buffer.filtered(|entry| entry.level() == level)
    }

    /// Entries in `category`, in insertion order
    pub fn logs_by_category(&self, category: &str) -> Vec<LogEntry> {
        self.buffer.filtered(|entry| entry.category() == category)
    }

    /// Newline-joined formatted lines, the unit of session persistence
    pub fn logs_as_string(&self) -> String {
        self.buffer.to_text()
    }

    /// Drop every buffered entry
    pub fn clear(&self) {
        self.buffer.clear();
    }

    /// Number of buffered entries
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Maximum number of entries kept
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES, false)
    }
}

fn into_context(value: Value) -> Option<Context> {
    match value {
        Value::Null => None,
        Value::Object(map) => Some(map),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            Some(map)
        }
    }
}

fn mirror(entry: &LogEntry) {
    let line = entry.format_line();
    match entry.level() {
        LogLevel::Debug => tracing::debug!(target: CONSOLE_TARGET, "{}", line),
        LogLevel::Info => tracing::info!(target: CONSOLE_TARGET, "{}", line),
        LogLevel::Warn => tracing::warn!(target: CONSOLE_TARGET, "{}", line),
        LogLevel::Error => tracing::error!(target: CONSOLE_TARGET, "{}", line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn ctx(value: Value) -> Context {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_redaction_any_depth() {
        let logger = Logger::default();
        logger.log(
            LogLevel::Info,
            "auth",
            "x",
            Some(json!({"user": {"apiKey": "abc", "name": "bob"}})),
        );

        let logs = logger.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(
            logs[0].context(),
            Some(&ctx(json!({"user": {"apiKey": "[REDACTED]", "name": "bob"}})))
        );
    }

    #[test]
    fn test_redacted_value_never_printed() {
        let logger = Logger::new(10, true);
        logger.info("auth", "unlock", Some(json!({"passphrase": "correct horse"})));
        assert!(!logger.logs_as_string().contains("correct horse"));
        assert!(logger.logs_as_string().contains("[REDACTED]"));
    }

    #[test]
    fn test_bounded_buffer_keeps_last_max() {
        let max = 50;
        let extra = 7;
        let logger = Logger::new(max, false);

        for i in 0..max + extra {
            logger.info("test", format!("msg {}", i), None);
        }

        let logs = logger.logs();
        assert_eq!(logs.len(), max);
        for (offset, entry) in logs.iter().enumerate() {
            assert_eq!(entry.message(), format!("msg {}", offset + extra));
        }
    }

    #[test]
    fn test_filter_by_level_preserves_order() {
        let logger = Logger::default();
        logger.info("a", "i1", None);
        logger.error("a", "e1", None);
        logger.warn("b", "w1", None);
        logger.error("b", "e2", None);
        logger.debug("a", "d1", None);
        logger.error("c", "e3", None);

        let errors: Vec<String> = logger
            .logs_by_level(LogLevel::Error)
            .iter()
            .map(|e| e.message().to_string())
            .collect();
        assert_eq!(errors, vec!["e1", "e2", "e3"]);
        assert!(logger.logs_by_level(LogLevel::Warn).len() == 1);
    }

    #[test]
    fn test_filter_by_category_preserves_order() {
        let logger = Logger::default();
        logger.info("wallet", "w1", None);
        logger.info("payment", "p1", None);
        logger.error("wallet", "w2", None);

        let wallet: Vec<String> = logger
            .logs_by_category("wallet")
            .iter()
            .map(|e| e.message().to_string())
            .collect();
        assert_eq!(wallet, vec!["w1", "w2"]);
        assert!(logger.logs_by_category("missing").is_empty());
    }

    #[test]
    fn test_accessors_do_not_mutate() {
        let logger = Logger::default();
        logger.info("a", "one", None);
        let _ = logger.logs();
        let _ = logger.logs_by_level(LogLevel::Info);
        let _ = logger.logs_as_string();
        assert_eq!(logger.len(), 1);
    }

    #[test]
    fn test_clear() {
        let logger = Logger::default();
        logger.info("a", "one", None);
        logger.clear();
        assert!(logger.is_empty());
        assert_eq!(logger.logs_as_string(), "");
    }

    #[test]
    fn test_non_object_context_wrapped() {
        let logger = Logger::default();
        logger.info("a", "scalar", Some(json!(42)));
        logger.info("a", "null", Some(Value::Null));

        let logs = logger.logs();
        assert_eq!(logs[0].context(), Some(&ctx(json!({"value": 42}))));
        assert_eq!(logs[1].context(), None);
    }

    #[test]
    fn test_log_with_serializable_context() {
        #[derive(Serialize)]
        struct Attempt<'a> {
            method: &'a str,
            password: &'a str,
        }

        let logger = Logger::default();
        logger.log_with(
            LogLevel::Info,
            "auth",
            "attempt",
            &Attempt {
                method: "biometric",
                password: "pw",
            },
        );

        let logs = logger.logs();
        let context = logs[0].context().unwrap();
        assert_eq!(context["method"], "biometric");
        assert_eq!(context["password"], "[REDACTED]");
    }

    #[test]
    fn test_log_with_unserializable_context_degrades() {
        // Non-string map keys cannot become JSON object keys
        let mut bad: BTreeMap<(u8, u8), u8> = BTreeMap::new();
        bad.insert((1, 2), 3);

        let logger = Logger::default();
        logger.log_with(LogLevel::Warn, "app", "odd context", &bad);

        let logs = logger.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].message(), "odd context");
        let degraded = logs[0].context().unwrap()["context"].as_str().unwrap();
        assert!(degraded.starts_with("[unserializable:"));
    }

    #[test]
    fn test_category_helpers() {
        let logger = Logger::default();
        logger.auth_success("pin");
        logger.payment_failed("lightning", "no route");
        logger.network_status(false);

        let logs = logger.logs();
        assert_eq!(logs[0].category(), category::AUTH);
        assert_eq!(logs[0].context().unwrap()["method"], "pin");
        assert_eq!(logs[1].level(), LogLevel::Error);
        assert_eq!(logs[1].category(), category::PAYMENT);
        assert_eq!(logs[1].context().unwrap()["error"], "no route");
        assert_eq!(logs[2].level(), LogLevel::Warn);
    }

    #[test]
    fn test_console_mirroring_toggle_does_not_affect_buffer() {
        let logger = Logger::new(10, false);
        logger.info("a", "quiet", None);
        logger.set_console_mirroring(true);
        assert!(logger.console_mirroring());
        logger.info("a", "loud", None);
        assert_eq!(logger.len(), 2);
    }
}
