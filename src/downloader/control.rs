//! Run lifecycle control — start, pause, stop.

use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::types::LogLevel;

use super::BatchDownloader;

/// Poll interval while waiting for the worker to wind down
const FINISH_POLL_INTERVAL: Duration = Duration::from_millis(50);

impl BatchDownloader {
    /// Start a run over the current queue
    ///
    /// Spawns the background worker and returns immediately; progress flows
    /// through the event channel. The output directory is created if it does
    /// not exist.
    ///
    /// # Errors
    ///
    /// Returns an error before any worker is spawned if:
    /// - the configuration is invalid ([`Error::Config`])
    /// - the queue is empty ([`Error::EmptyQueue`])
    /// - a run is already active ([`Error::AlreadyRunning`])
    /// - the output directory cannot be created ([`Error::Io`])
    pub async fn start(&self) -> Result<()> {
        let config = self.config.read().await.clone();
        config.validate()?;

        if self.tasks.read().await.is_empty() {
            return Err(Error::EmptyQueue);
        }

        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::AlreadyRunning);
        }

        if let Err(e) = tokio::fs::create_dir_all(&config.output_dir).await {
            self.running.store(false, Ordering::SeqCst);
            return Err(Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create output directory '{}': {}",
                    config.output_dir.display(),
                    e
                ),
            )));
        }

        let cancel = CancellationToken::new();
        *self.run_cancel.lock().await = cancel.clone();

        self.emit_log(LogLevel::Info, "Starting batch download...");
        tracing::info!(
            queue_len = self.tasks.read().await.len(),
            output_dir = %config.output_dir.display(),
            "Starting batch download run"
        );

        let engine = self.clone();
        tokio::spawn(async move {
            super::worker::run_worker(engine, cancel).await;
        });

        Ok(())
    }

    /// Pause the run after the current task
    ///
    /// Cancellation is cooperative: the flag is checked at the top of each
    /// task iteration, so an in-flight download always finishes or fails on
    /// its own before the run halts. The session is released by the worker's
    /// normal teardown. A no-op when no run is active.
    pub async fn pause(&self) {
        if !self.is_running() {
            return;
        }

        self.run_cancel.lock().await.cancel();
        self.emit_log(LogLevel::Warning, "Pausing after current task...");
        tracing::info!("Pause requested, worker will halt at the next task boundary");
    }

    /// Stop the run and release the session immediately
    ///
    /// Like [`pause`](Self::pause), but additionally force-closes the
    /// browser session rather than waiting for the worker to notice the
    /// flag. If a download is in flight, this waits for that call to finish
    /// first — in-flight external calls are never interrupted.
    pub async fn stop(&self) {
        self.run_cancel.lock().await.cancel();

        if let Some(mut session) = self.session_slot.lock().await.take() {
            session.close().await;
            tracing::info!("Session force-released on stop");
        }

        if self.is_running() {
            self.emit_log(LogLevel::Error, "Stopping all operations...");
        }
    }

    /// Wait until no run is active
    ///
    /// Returns immediately when idle. Useful after [`stop`](Self::stop) to
    /// wait for the worker's teardown (and the final `RunFinished` event) to
    /// complete.
    pub async fn wait_until_finished(&self) {
        while self.is_running() {
            tokio::time::sleep(FINISH_POLL_INTERVAL).await;
        }
    }
}
