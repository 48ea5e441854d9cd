//! Bulk log export
//!
//! Packs the live buffer plus every readable stored session into one zip
//! archive. Entry names start with a zero-padded epoch-seconds prefix so the
//! archive order is chronological.

use std::io::{Cursor, Write};
use std::sync::Arc;

use chrono::{DateTime, Local, SecondsFormat, Utc};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::ExportError;
use crate::logging::Logger;
use crate::storage::{LogSession, SessionStore, StorageBackend};

const HEADER_RULE: &str = "========================================";

// Sorts after every minted `session_<millis>_<hex>` id sharing its prefix
const CURRENT_LABEL: &str = "session_current";

/// A finished export archive
#[derive(Debug, Clone)]
pub struct ExportArchive {
    /// Suggested file name for the archive
    pub file_name: String,
    /// Zip bytes
    pub bytes: Vec<u8>,
    /// Entry names in archive order
    pub entries: Vec<String>,
}

/// Archive file name for an export generated now
pub fn archive_file_name() -> String {
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    format!("wallet-logs-{}.zip", timestamp)
}

/// `<epoch-seconds>_<label>.txt`
pub fn entry_name(at: DateTime<Utc>, label: &str) -> String {
    format!("{:010}_{}.txt", at.timestamp().max(0), label)
}

fn iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn current_session_text(generated_at: DateTime<Utc>, entries: usize, logs: &str) -> String {
    format!(
        "Session: current (active)\nGenerated: {}\nEntries: {}\n{}\n\n{}\n",
        iso(generated_at),
        entries,
        HEADER_RULE,
        logs
    )
}

fn stored_session_text(session: &LogSession) -> String {
    let ended = session
        .ended_at
        .map(iso)
        .unwrap_or_else(|| "active".to_string());
    format!(
        "Session ID: {}\nStarted: {}\nEnded: {}\n{}\n\n{}\n",
        session.id,
        iso(session.started_at),
        ended,
        HEADER_RULE,
        session.logs
    )
}

/// Build a zip archive from `(name, contents)` pairs, sorted by name
pub fn build_archive(mut files: Vec<(String, String)>) -> Result<(Vec<u8>, Vec<String>), ExportError> {
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut names = Vec::with_capacity(files.len());

    for (name, contents) in files {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(contents.as_bytes())?;
        names.push(name);
    }

    let cursor = writer.finish()?;
    Ok((cursor.into_inner(), names))
}

pub struct Exporter<B> {
    logger: Arc<Logger>,
    store: Arc<SessionStore<B>>,
}

impl<B: StorageBackend> Exporter<B> {
    pub fn new(logger: Arc<Logger>, store: Arc<SessionStore<B>>) -> Self {
        Self { logger, store }
    }

    /// Assemble the archive.
    ///
    /// The current entry comes straight from the live buffer. Stored sessions
    /// that cannot be read are left out; only archive building can fail.
    pub async fn export_all(&self) -> Result<ExportArchive, ExportError> {
        let generated_at = Utc::now();
        let mut files = vec![(
            entry_name(generated_at, CURRENT_LABEL),
            current_session_text(
                generated_at,
                self.logger.len(),
                &self.logger.logs_as_string(),
            ),
        )];

        match self.store.get_all_sessions().await {
            Ok(sessions) => {
                files.extend(sessions.iter().map(|session| {
                    (
                        entry_name(session.started_at, &session.id),
                        stored_session_text(session),
                    )
                }));
            }
            Err(e) => tracing::warn!("Exporting without stored sessions: {}", e),
        }

        let file_name = archive_file_name();
        match build_archive(files) {
            Ok((bytes, entries)) => {
                self.logger.export_completed(&file_name, entries.len());
                Ok(ExportArchive {
                    file_name,
                    bytes,
                    entries,
                })
            }
            Err(e) => {
                self.logger.export_failed(&e.to_string());
                Err(e)
            }
        }
    }
}
