//! Error types for browser-dl
//!
//! The error taxonomy follows the run model:
//! - Session errors (acquire, recycle) are fatal to a run.
//! - Precondition errors (empty queue, bad config) are rejected before a
//!   run starts and never reach the worker.
//! - Per-task download failures are NOT represented here: they are recorded
//!   on the [`Task`](crate::types::Task) and reported as error-level
//!   [`Event::Log`](crate::types::Event) events while the run continues.

use thiserror::Error;

/// Result type alias for browser-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for browser-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "output_dir")
        key: Option<String>,
    },

    /// Browser session lifecycle failure (acquire, recycle). Fatal to a run.
    #[error("session error: {0}")]
    Session(String),

    /// A run was started with an empty queue
    #[error("queue is empty: load URLs before starting a run")]
    EmptyQueue,

    /// A run was started while another run is still active
    #[error("a run is already in progress")]
    AlreadyRunning,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error (settings file)
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Configuration error constructor with a key
    pub(crate) fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}
