//! The background worker — the per-task orchestration loop.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::artifacts::ArtifactStore;
use crate::checksum;
use crate::config::Config;
use crate::error::Result;
use crate::recycler::SessionRecycler;
use crate::types::{Event, LogLevel, Status, Task};

use super::BatchDownloader;

impl BatchDownloader {
    /// Apply a mutation to one task under the write lock.
    ///
    /// Callers emit the announcing `QueueChanged` AFTER this returns, so the
    /// mutation is visible to any snapshot taken in response to the event.
    pub(crate) async fn update_task(&self, index: usize, mutate: impl FnOnce(&mut Task)) {
        let mut tasks = self.tasks.write().await;
        if let Some(task) = tasks.get_mut(index) {
            mutate(task);
        }
    }
}

/// Run one full batch to completion or cancellation.
///
/// Phases:
/// 1. Optional cleanup of stale partial artifacts
/// 2. Acquire the browser session
/// 3. Walk the queue (per-task loop)
/// 4. Unconditional session release, then exactly one `RunFinished`
pub(crate) async fn run_worker(engine: BatchDownloader, cancel: CancellationToken) {
    let config = engine.config.read().await.clone();
    let store = ArtifactStore::new(&config.output_dir);

    if config.clean_partials {
        let removed = store.clean_partials();
        if !removed.is_empty() {
            engine.emit_log(
                LogLevel::Info,
                format!("Removed {} stale partial file(s)", removed.len()),
            );
            tracing::info!(count = removed.len(), "Removed stale partial files");
        }
    }

    match engine.provider.acquire(&config).await {
        Ok(session) => {
            *engine.session_slot.lock().await = Some(session);

            // A session-lifecycle failure aborts the run; per-task state up
            // to that point is preserved.
            if let Err(e) = process_queue(&engine, &config, &store, &cancel).await {
                engine.emit_log(LogLevel::Error, format!("Critical error: {e}"));
                tracing::error!(error = %e, "Run aborted by session failure");
            }
        }
        Err(e) => {
            engine.emit_log(LogLevel::Error, format!("Critical error: {e}"));
            tracing::error!(error = %e, "Failed to establish browser session");
        }
    }

    // Release on every exit path. The Option take makes release exactly
    // once even when stop() already force-closed the session.
    if let Some(mut session) = engine.session_slot.lock().await.take() {
        session.close().await;
    }

    engine
        .running
        .store(false, std::sync::atomic::Ordering::SeqCst);
    engine.emit_log(LogLevel::Success, "All operations finished");
    engine.emit_event(Event::Status {
        message: "Batch operation complete".into(),
    });
    engine.emit_event(Event::RunFinished);
}

/// Walk the queue in order, driving the per-task state machine.
///
/// Returns `Err` only for session-lifecycle failures (recycle rebuild);
/// per-task download failures are recorded on the task and never abort the
/// loop.
async fn process_queue(
    engine: &BatchDownloader,
    config: &Config,
    store: &ArtifactStore,
    cancel: &CancellationToken,
) -> Result<()> {
    let total = engine.tasks.read().await.len();
    let mut recycler = SessionRecycler::new(config.session_refresh);

    for index in 0..total {
        // Sole cancellation checkpoint: an in-flight download is never
        // interrupted, the flag takes effect at the next task boundary.
        if cancel.is_cancelled() {
            engine.emit_log(LogLevel::Warning, "Run cancelled");
            tracing::info!(
                processed = index,
                total,
                "Run cancelled, leaving remaining tasks pending"
            );
            break;
        }

        engine.emit_event(Event::Progress {
            fraction: index as f32 / total as f32,
        });

        let (url, name) = {
            let tasks = engine.tasks.read().await;
            (tasks[index].url.clone(), tasks[index].name.clone())
        };

        engine.emit_event(Event::Status {
            message: format!("Processing {}/{}: {}", index + 1, total, name),
        });

        // Skip/dedup: an existing complete artifact satisfies the task
        // without touching the session or the recycle counter.
        if let Some(artifact) = store.resolve_complete(&url) {
            engine
                .update_task(index, |task| {
                    task.status = Status::Skipped;
                    task.size_bytes = Some(artifact.size_bytes);
                    task.finished_at = Some(Utc::now());
                })
                .await;
            engine.emit_log(LogLevel::Warning, format!("Skipped (exists): {name}"));
            engine.emit_event(Event::QueueChanged);
            engine.emit_event(Event::StatsChanged);
            engine.emit_event(Event::Progress {
                fraction: (index + 1) as f32 / total as f32,
            });
            continue;
        }

        if recycler.should_recycle() {
            recycle_session(engine, config).await?;
            recycler.reset();
        }

        engine
            .update_task(index, |task| {
                task.status = Status::Downloading;
                task.started_at = Some(Utc::now());
                task.error = None;
            })
            .await;
        engine.emit_log(LogLevel::Info, format!("Downloading: {name}"));
        engine.emit_event(Event::Status {
            message: format!("Downloading: {name}"),
        });
        engine.emit_event(Event::QueueChanged);

        let outcome = {
            let mut slot = engine.session_slot.lock().await;
            match slot.as_mut() {
                Some(session) => session.download(&url, &config.output_dir).await,
                None => {
                    // stop() released the session between the checkpoint and
                    // the download; the task never reached the external call.
                    engine
                        .update_task(index, |task| {
                            task.status = Status::Pending;
                            task.started_at = None;
                        })
                        .await;
                    engine.emit_event(Event::QueueChanged);
                    break;
                }
            }
        };

        match outcome {
            Ok(true) => {
                recycler.record_completed();
                finish_completed(engine, config, store, index, &url, &name).await;
            }
            Ok(false) => {
                engine
                    .update_task(index, |task| {
                        task.status = Status::Failed;
                        task.error = Some("download did not complete".into());
                    })
                    .await;
                engine.emit_log(LogLevel::Error, format!("Failed: {name}"));
                tracing::warn!(%url, "Download reported failure");
            }
            Err(e) => {
                engine
                    .update_task(index, |task| {
                        task.status = Status::Failed;
                        task.error = Some(e.to_string());
                    })
                    .await;
                engine.emit_log(LogLevel::Error, format!("Failed: {name}: {e}"));
                tracing::warn!(%url, error = %e, "Download raised an error");
            }
        }

        engine
            .update_task(index, |task| task.finished_at = Some(Utc::now()))
            .await;
        engine.emit_event(Event::QueueChanged);
        engine.emit_event(Event::StatsChanged);
        engine.emit_event(Event::Progress {
            fraction: (index + 1) as f32 / total as f32,
        });

        // Pacing between session interactions
        if config.delay_between_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.delay_between_ms)).await;
        }
    }

    Ok(())
}

/// Finalize a successfully downloaded task: resolve the artifact, record its
/// size, and compute the integrity digest when configured.
async fn finish_completed(
    engine: &BatchDownloader,
    config: &Config,
    store: &ArtifactStore,
    index: usize,
    url: &str,
    name: &str,
) {
    engine
        .update_task(index, |task| task.status = Status::Completed)
        .await;

    // The session reports only success/failure; name and size come from a
    // second oracle query against the output directory.
    match store.resolve_complete(url) {
        Some(artifact) => {
            engine
                .update_task(index, |task| task.size_bytes = Some(artifact.size_bytes))
                .await;

            if config.verify_checksum {
                engine.emit_log(LogLevel::Info, format!("Verifying: {}", artifact.name));
                let path = store.output_dir().join(&artifact.name);
                match checksum::sha256_file(&path).await {
                    Ok(digest) => {
                        engine
                            .update_task(index, |task| task.checksum = Some(digest))
                            .await;
                    }
                    Err(e) => {
                        // The artifact itself is complete; only the digest is missing
                        engine.emit_log(LogLevel::Error, format!("Checksum error: {e}"));
                        tracing::error!(%url, error = %e, "Checksum computation failed");
                    }
                }
            }
        }
        None => {
            tracing::warn!(%url, "Download succeeded but no artifact was found");
        }
    }

    engine.emit_log(LogLevel::Success, format!("Completed: {name}"));
}

/// Tear down and rebuild the browser session.
///
/// The slot lock is held for the whole rebuild, so a concurrent `stop()`
/// sees either the old session or the fresh one, never a half-built state.
/// An acquire failure here is fatal to the run.
async fn recycle_session(engine: &BatchDownloader, config: &Config) -> Result<()> {
    engine.emit_log(LogLevel::Info, "Refreshing browser session...");
    tracing::info!("Recycling browser session");

    let mut slot = engine.session_slot.lock().await;
    if let Some(mut old) = slot.take() {
        old.close().await;
    }

    tokio::time::sleep(Duration::from_millis(config.recycle_pause_ms)).await;

    *slot = Some(engine.provider.acquire(config).await?);
    Ok(())
}
