//! In-memory ring buffer of log entries
//!
//! Provides a thread-safe, capacity-bounded buffer that keeps insertion order
//! and evicts the oldest entries first.

use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::entry::LogEntry;

/// Default number of entries kept in memory
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

/// Thread-safe ring buffer for storing log entries
#[derive(Debug)]
pub struct LogBuffer {
    entries: RwLock<VecDeque<LogEntry>>,
    max_entries: usize,
}

impl LogBuffer {
    /// Create a new log buffer holding at most `max_entries` (at least one)
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            entries: RwLock::new(VecDeque::with_capacity(max_entries)),
            max_entries,
        }
    }

    // A panic while holding the lock cannot leave the deque half-updated,
    // so a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, VecDeque<LogEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, VecDeque<LogEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push a new log entry, evicting from the front when over capacity
    pub fn push(&self, entry: LogEntry) {
        let mut entries = self.write();
        entries.push_back(entry);
        while entries.len() > self.max_entries {
            entries.pop_front();
        }
    }

    /// Get all entries in insertion order
    pub fn all_entries(&self) -> Vec<LogEntry> {
        self.read().iter().cloned().collect()
    }

    /// Get the entries matching a predicate, in insertion order
    pub fn filtered<F>(&self, predicate: F) -> Vec<LogEntry>
    where
        F: Fn(&LogEntry) -> bool,
    {
        self.read()
            .iter()
            .filter(|entry| predicate(entry))
            .cloned()
            .collect()
    }

    /// Render every entry as one line, joined with newlines
    pub fn to_text(&self) -> String {
        self.read()
            .iter()
            .map(LogEntry::format_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Get the number of entries in the buffer
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries kept
    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.write().clear();
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::entry::LogLevel;

    fn entry(level: LogLevel, message: impl Into<String>) -> LogEntry {
        LogEntry::new(level, "test", message, None)
    }

    #[test]
    fn test_log_buffer_push_and_retrieve() {
        let buffer = LogBuffer::new(100);

        buffer.push(entry(LogLevel::Info, "message 1"));
        buffer.push(entry(LogLevel::Warn, "warning 1"));
        buffer.push(entry(LogLevel::Error, "error 1"));

        assert_eq!(buffer.len(), 3);

        let entries = buffer.all_entries();
        assert_eq!(entries[0].message(), "message 1");
        assert_eq!(entries[1].message(), "warning 1");
        assert_eq!(entries[2].message(), "error 1");
    }

    #[test]
    fn test_log_buffer_capacity() {
        let buffer = LogBuffer::new(3);

        for i in 0..5 {
            buffer.push(entry(LogLevel::Info, format!("msg {}", i)));
        }

        assert_eq!(buffer.len(), 3);
        let entries = buffer.all_entries();
        assert_eq!(entries[0].message(), "msg 2");
        assert_eq!(entries[1].message(), "msg 3");
        assert_eq!(entries[2].message(), "msg 4");
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let buffer = LogBuffer::new(0);
        buffer.push(entry(LogLevel::Info, "a"));
        buffer.push(entry(LogLevel::Info, "b"));
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.all_entries()[0].message(), "b");
    }

    #[test]
    fn test_to_text_joins_lines() {
        let buffer = LogBuffer::new(10);
        assert_eq!(buffer.to_text(), "");

        buffer.push(entry(LogLevel::Info, "one"));
        buffer.push(entry(LogLevel::Info, "two"));

        let text = buffer.to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("one"));
        assert!(lines[1].ends_with("two"));
    }

    #[test]
    fn test_clear() {
        let buffer = LogBuffer::new(10);
        buffer.push(entry(LogLevel::Info, "one"));
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
