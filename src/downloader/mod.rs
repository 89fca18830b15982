//! Core orchestration engine split into focused submodules.
//!
//! The `BatchDownloader` struct and its methods are organized by domain:
//! - [`load`] - Queue population (URL files, page scraping, dedup)
//! - [`control`] - Run lifecycle control (start/pause/stop)
//! - [`worker`] - The background per-task orchestration loop
//! - [`stats`] - Aggregate queue statistics

mod control;
mod load;
mod stats;
mod worker;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::session::{BrowserSession, SessionProvider};
use crate::types::{Event, Task};

/// Batch download orchestration engine (cloneable - all fields are shared)
///
/// One engine owns one queue of [`Task`]s and at most one live browser
/// session. A run walks the queue with a single background worker; the
/// observer receives [`Event`]s through the unbounded receiver returned by
/// [`BatchDownloader::new`] and reads task state only through the snapshot
/// accessors ([`tasks`](Self::tasks), [`stats`](Self::stats)) after draining
/// the announcing event.
#[derive(Clone)]
pub struct BatchDownloader {
    /// Configuration; observer-mutable between runs, snapshotted at start
    pub(crate) config: Arc<tokio::sync::RwLock<Config>>,
    /// Factory for browser sessions
    pub(crate) provider: Arc<dyn SessionProvider>,
    /// The task queue; written only by the worker during a run
    pub(crate) tasks: Arc<tokio::sync::RwLock<Vec<Task>>>,
    /// Event channel producer (unbounded, never blocks the worker)
    pub(crate) event_tx: mpsc::UnboundedSender<Event>,
    /// Whether a run is currently active
    pub(crate) running: Arc<AtomicBool>,
    /// Cooperative cancellation for the current run (fresh token per run)
    pub(crate) run_cancel: Arc<tokio::sync::Mutex<CancellationToken>>,
    /// The live browser session, present only while running.
    /// Every release path takes the Option, so release happens exactly once.
    pub(crate) session_slot: Arc<tokio::sync::Mutex<Option<Box<dyn BrowserSession>>>>,
}

impl BatchDownloader {
    /// Create a new engine and the event receiver for its observer
    ///
    /// The receiver is the engine's sole output stream: events arrive in the
    /// exact order produced and are never dropped. Dropping the receiver is
    /// allowed; the engine keeps running and discards events.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use browser_dl::{BatchDownloader, Config, NoOpSessionProvider};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let config = Config {
    ///         output_dir: "./downloads".into(),
    ///         ..Config::default()
    ///     };
    ///     let (engine, mut events) = BatchDownloader::new(config, Arc::new(NoOpSessionProvider));
    ///
    ///     engine.set_queue(["https://example.com/a.zip"]).await?;
    ///     engine.start().await?;
    ///
    ///     while let Some(event) = events.recv().await {
    ///         println!("{event:?}");
    ///         if event == browser_dl::Event::RunFinished {
    ///             break;
    ///         }
    ///     }
    ///     Ok(())
    /// }
    /// ```
    pub fn new(
        config: Config,
        provider: Arc<dyn SessionProvider>,
    ) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let engine = Self {
            config: Arc::new(tokio::sync::RwLock::new(config)),
            provider,
            tasks: Arc::new(tokio::sync::RwLock::new(Vec::new())),
            event_tx,
            running: Arc::new(AtomicBool::new(false)),
            run_cancel: Arc::new(tokio::sync::Mutex::new(CancellationToken::new())),
            session_slot: Arc::new(tokio::sync::Mutex::new(None)),
        };

        (engine, event_rx)
    }

    /// Snapshot of the current task queue
    ///
    /// Returns a clone of every task, so the observer never reads a record
    /// concurrently with a worker mutation. Re-read after each
    /// `QueueChanged` event.
    pub async fn tasks(&self) -> Vec<Task> {
        self.tasks.read().await.clone()
    }

    /// Snapshot of the current configuration
    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }

    /// Replace the configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyRunning`](crate::Error::AlreadyRunning) while
    /// a run is active; the worker snapshots its configuration at start and
    /// mid-run changes would silently not apply.
    pub async fn set_config(&self, config: Config) -> crate::Result<()> {
        if self.is_running() {
            return Err(crate::Error::AlreadyRunning);
        }
        *self.config.write().await = config;
        Ok(())
    }

    /// Whether a run is currently active
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Emit an event to the observer
    ///
    /// If the observer has dropped its receiver the event is silently
    /// discarded; the run continues either way.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Emit a log event at the given level
    pub(crate) fn emit_log(&self, level: crate::types::LogLevel, message: impl Into<String>) {
        self.emit_event(Event::Log {
            level,
            message: message.into(),
        });
    }
}
