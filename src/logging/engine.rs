//! Wallet engine log bridge
//!
//! The wallet engine reports its own log lines as `{level, line}` records
//! through a listener callback. They are filed under the `engine` category.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::entry::LogLevel;
use super::logger::{category, Logger};

/// A log record emitted by the wallet engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineLogRecord {
    pub level: String,
    pub line: String,
}

/// Listener invoked by the engine for every record
pub type EngineLogListener = Box<dyn Fn(EngineLogRecord) + Send + Sync>;

/// The engine's listener registration call
pub trait LogListenerRegistry {
    fn set_log_listener(&self, listener: EngineLogListener);
}

impl Logger {
    /// File one engine record
    pub fn ingest_engine_record(&self, record: &EngineLogRecord) {
        self.log(
            LogLevel::from_engine(&record.level),
            category::ENGINE,
            record.line.as_str(),
            None,
        );
    }
}

/// Build the callback the engine should call for each record
pub fn engine_listener(logger: Arc<Logger>) -> EngineLogListener {
    Box::new(move |record| logger.ingest_engine_record(&record))
}

/// Register the logger as the engine's log listener
pub fn register_engine_logging<E>(engine: &E, logger: Arc<Logger>)
where
    E: LogListenerRegistry + ?Sized,
{
    engine.set_log_listener(engine_listener(logger));
}

/// Ingest newline-delimited JSON engine records until EOF.
///
/// A line that is not a valid record is filed verbatim at INFO, with invalid
/// UTF-8 replaced. Returns the number of lines ingested.
pub async fn pipe_engine_stream<R>(mut reader: R, logger: &Logger) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut count = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let decoded = String::from_utf8_lossy(&buf);
        let line = decoded.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<EngineLogRecord>(line) {
            Ok(record) => logger.ingest_engine_record(&record),
            Err(_) => logger.info(category::ENGINE, line, None),
        }
        count += 1;
    }

    Ok(count)
}
