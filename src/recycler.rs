//! Session recycling policy
//!
//! Long-lived browser sessions accumulate memory and go stale, so the worker
//! tears the session down and rebuilds it on a cadence. The policy itself is
//! pure state: a threshold and a count of completed (non-skipped) downloads
//! since the last recycle. Skipped tasks never advance the count because they
//! never touch the session.

/// Pure recycle policy: answers "recycle now?" after N completed downloads
#[derive(Clone, Debug)]
pub struct SessionRecycler {
    threshold: usize,
    completed_since_recycle: usize,
}

impl SessionRecycler {
    /// Create a recycler that triggers after `threshold` completed downloads
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            completed_since_recycle: 0,
        }
    }

    /// Record one completed (non-skipped) download
    pub fn record_completed(&mut self) {
        self.completed_since_recycle += 1;
    }

    /// Whether the session should be recycled before the next download
    pub fn should_recycle(&self) -> bool {
        self.completed_since_recycle >= self.threshold
    }

    /// Reset the count after a recycle or a fresh acquisition
    pub fn reset(&mut self) {
        self.completed_since_recycle = 0;
    }

    /// Completed downloads since the last recycle
    pub fn completed_since_recycle(&self) -> usize {
        self.completed_since_recycle
    }
}
