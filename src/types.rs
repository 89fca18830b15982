//! Core types for browser-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Waiting in the queue, not yet examined by the worker
    Pending,
    /// The download operation is in flight against the browser session
    Downloading,
    /// The download finished successfully
    Completed,
    /// The download operation reported failure or raised an error
    Failed,
    /// A complete artifact already existed; no download was attempted
    Skipped,
}

impl Status {
    /// Whether this status is terminal for the current run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed | Status::Failed | Status::Skipped)
    }
}

/// Severity tag for observer-facing log events
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Routine progress information
    Info,
    /// A task completed successfully
    Success,
    /// Something noteworthy but non-fatal (e.g., a skipped task)
    Warning,
    /// A task or the run failed
    Error,
}

/// One unit of work: a source URL tracked through its status lifecycle.
///
/// Tasks are created in bulk when a batch is loaded and mutated in place by
/// the worker during a run. Observers receive cloned snapshots via
/// [`BatchDownloader::tasks`](crate::downloader::BatchDownloader::tasks) and
/// must only re-read after draining the `QueueChanged` event announcing a
/// mutation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    /// Source locator; unique within a batch
    pub url: String,

    /// Derived display name (URL filename, or a truncated URL)
    pub name: String,

    /// Current lifecycle status
    pub status: Status,

    /// Observed artifact size in bytes (unset until known)
    pub size_bytes: Option<u64>,

    /// Hex-encoded SHA-256 digest of the artifact (unset until computed)
    pub checksum: Option<String>,

    /// Human-readable failure detail (unset unless failed)
    pub error: Option<String>,

    /// When the worker began downloading this task
    pub started_at: Option<DateTime<Utc>>,

    /// When this task reached a terminal status
    pub finished_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a fresh pending task for a URL
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let name = crate::utils::display_name(&url);
        Self {
            url,
            name,
            status: Status::Pending,
            size_bytes: None,
            checksum: None,
            error: None,
            started_at: None,
            finished_at: None,
        }
    }
}

/// Event emitted by the engine during a run.
///
/// Events are delivered to the observer in the exact order produced (FIFO,
/// unbounded channel, never dropped). Task-record mutations always
/// happen-before the `QueueChanged` event announcing them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A log line for the observer's activity log
    Log {
        /// Severity tag
        level: LogLevel,
        /// Log message
        message: String,
    },

    /// Status-bar text (e.g., "Downloading: file.zip")
    Status {
        /// Status message
        message: String,
    },

    /// Overall progress through the queue
    Progress {
        /// Fraction of the queue processed, in `[0.0, 1.0]`
        fraction: f32,
    },

    /// One or more task records changed; re-read the queue snapshot
    QueueChanged,

    /// Aggregate statistics changed; re-read the stats snapshot
    StatsChanged,

    /// The run ended (queue exhausted, cancelled, or fatal error).
    /// Emitted exactly once per run, after the session is released.
    RunFinished,
}

/// Aggregate queue statistics
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Total number of tasks in the queue
    pub total: usize,

    /// Tasks not yet examined
    pub pending: usize,

    /// Tasks currently downloading (0 or 1 by design)
    pub downloading: usize,

    /// Tasks that completed successfully
    pub completed: usize,

    /// Tasks that failed
    pub failed: usize,

    /// Tasks skipped because a complete artifact already existed
    pub skipped: usize,

    /// Completed tasks as a fraction of the total (0.0 when the queue is empty)
    pub success_rate: f32,
}
