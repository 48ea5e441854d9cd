//! Persistence scheduler
//!
//! Periodically snapshots the logger's buffer into the current session, and
//! flushes opportunistically on lifecycle signals. Each flush is a full
//! snapshot of the same session, so overlapping flushes resolve by last write.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::logging::Logger;
use crate::storage::{SessionStore, StorageBackend, StoreError};

/// Default period between scheduled flushes
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// Host lifecycle events that warrant a best-effort flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleSignal {
    /// The app was backgrounded or hidden
    Hidden,
    /// The app is about to exit
    Unload,
}

struct Timer {
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

pub struct PersistenceScheduler<B> {
    logger: Arc<Logger>,
    store: Arc<SessionStore<B>>,
    interval: Duration,
    timer: Mutex<Option<Timer>>,
}

impl<B: StorageBackend> PersistenceScheduler<B> {
    pub fn new(logger: Arc<Logger>, store: Arc<SessionStore<B>>, interval: Duration) -> Self {
        Self {
            logger,
            store,
            interval: interval.max(Duration::from_millis(1)),
            timer: Mutex::new(None),
        }
    }

    fn timer(&self) -> MutexGuard<'_, Option<Timer>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the periodic timer is armed
    pub fn is_running(&self) -> bool {
        self.timer().is_some()
    }

    /// Start a session and arm the periodic flush.
    ///
    /// The timer is armed even when the store reports a failure, since the
    /// session stays current and later snapshots can still land. Returns the
    /// current session id, if there is one.
    pub async fn init_session(&self) -> Option<String> {
        self.stop_timer().await;

        let session_id = match self.store.start_session().await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("Failed to start log session: {}", e);
                self.store.current_session_id()
            }
        };

        self.arm_timer();
        session_id
    }

    /// Flush now and wait for the write to finish
    pub async fn flush_now(&self) -> bool {
        flush(&self.logger, &self.store).await
    }

    /// Fire-and-forget flush for a lifecycle signal.
    ///
    /// Dropping the returned handle does not cancel the flush.
    pub fn on_lifecycle(&self, signal: LifecycleSignal) -> JoinHandle<bool> {
        tracing::debug!("Lifecycle signal {:?}, flushing logs", signal);
        let logger = Arc::clone(&self.logger);
        let store = Arc::clone(&self.store);
        tokio::spawn(async move { flush(&logger, &store).await })
    }

    /// Final flush, stop the timer and close the session
    pub async fn end_session(&self) {
        self.stop_timer().await;
        flush(&self.logger, &self.store).await;

        if let Err(e) = self.store.end_session().await {
            tracing::warn!("Failed to end log session: {}", e);
        }
    }

    fn arm_timer(&self) {
        let logger = Arc::clone(&self.logger);
        let store = Arc::clone(&self.store);
        let period = self.interval;
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        flush(&logger, &store).await;
                    }
                }
            }
        });

        let previous = self.timer().replace(Timer { shutdown_tx, task });
        if let Some(previous) = previous {
            previous.task.abort();
        }
    }

    // Signals the timer and waits, so an in-flight flush completes first
    async fn stop_timer(&self) {
        let timer = self.timer().take();
        if let Some(timer) = timer {
            let _ = timer.shutdown_tx.send(());
            let _ = timer.task.await;
        }
    }
}

impl<B> Drop for PersistenceScheduler<B> {
    fn drop(&mut self) {
        let timer = self
            .timer
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(timer) = timer {
            timer.task.abort();
        }
    }
}

async fn flush<B: StorageBackend>(logger: &Logger, store: &SessionStore<B>) -> bool {
    let snapshot = logger.logs_as_string();
    match store.save_session_logs(&snapshot).await {
        Ok(()) => true,
        Err(StoreError::NoActiveSession) => {
            tracing::debug!("No active log session, skipping flush");
            false
        }
        Err(e) => {
            tracing::warn!("Failed to persist log snapshot: {}", e);
            false
        }
    }
}
