//! Aggregate queue statistics.

use crate::types::{QueueStats, Status, Task};

use super::BatchDownloader;

impl BatchDownloader {
    /// Snapshot of aggregate queue statistics
    ///
    /// Re-read after each `StatsChanged` event.
    pub async fn stats(&self) -> QueueStats {
        compute_stats(&self.tasks.read().await)
    }
}

/// Count every status bucket over a task snapshot
pub(crate) fn compute_stats(tasks: &[Task]) -> QueueStats {
    let mut stats = QueueStats {
        total: tasks.len(),
        ..QueueStats::default()
    };

    for task in tasks {
        match task.status {
            Status::Pending => stats.pending += 1,
            Status::Downloading => stats.downloading += 1,
            Status::Completed => stats.completed += 1,
            Status::Failed => stats.failed += 1,
            Status::Skipped => stats.skipped += 1,
        }
    }

    if stats.total > 0 {
        stats.success_rate = stats.completed as f32 / stats.total as f32;
    }

    stats
}
