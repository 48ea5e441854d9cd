//! Application-wide logging context
//!
//! `LogVault` is built once at startup and owns the logger, the session
//! store, the scheduler and the exporter. Consumers borrow it instead of
//! reaching for globals, so tests can build independent instances.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::export::{ExportArchive, ExportError, Exporter};
use crate::logging::{engine_listener, EngineLogListener, Logger};
use crate::scheduler::{LifecycleSignal, PersistenceScheduler};
use crate::storage::{FileBackend, SessionStore, StorageBackend};

pub struct LogVault<B> {
    logger: Arc<Logger>,
    store: Arc<SessionStore<B>>,
    scheduler: PersistenceScheduler<B>,
    exporter: Exporter<B>,
}

impl LogVault<FileBackend> {
    /// Open the file-backed vault described by `config`.
    ///
    /// Failing to open the data directory is fatal.
    pub async fn open(config: &Config) -> Result<Self> {
        let backend = FileBackend::open(&config.data_dir)
            .await
            .with_context(|| format!("Failed to open log store at {}", config.data_dir.display()))?;
        Ok(Self::with_backend(backend, config))
    }
}

impl<B: StorageBackend> LogVault<B> {
    pub fn with_backend(backend: B, config: &Config) -> Self {
        let logger = Arc::new(Logger::new(config.max_entries, config.console_mirroring));
        let store = Arc::new(SessionStore::with_options(
            Arc::new(backend),
            config.max_sessions,
            config.nonce_policy,
        ));
        let scheduler = PersistenceScheduler::new(
            Arc::clone(&logger),
            Arc::clone(&store),
            config.flush_interval(),
        );
        let exporter = Exporter::new(Arc::clone(&logger), Arc::clone(&store));

        Self {
            logger,
            store,
            scheduler,
            exporter,
        }
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    pub fn store(&self) -> &Arc<SessionStore<B>> {
        &self.store
    }

    pub fn scheduler(&self) -> &PersistenceScheduler<B> {
        &self.scheduler
    }

    pub fn exporter(&self) -> &Exporter<B> {
        &self.exporter
    }

    /// Callback to register with the wallet engine
    pub fn engine_listener(&self) -> EngineLogListener {
        engine_listener(Arc::clone(&self.logger))
    }

    /// Start a session and the periodic flush
    pub async fn start(&self) -> Option<String> {
        self.logger.app_lifecycle("session started");
        self.scheduler.init_session().await
    }

    pub fn on_lifecycle(&self, signal: LifecycleSignal) {
        // Completion is not awaited; the flush runs detached.
        drop(self.scheduler.on_lifecycle(signal));
    }

    /// Final flush and close
    pub async fn shutdown(&self) {
        self.logger.app_lifecycle("session ending");
        self.scheduler.end_session().await;
    }

    pub async fn export(&self) -> Result<ExportArchive, ExportError> {
        self.exporter.export_all().await
    }
}
