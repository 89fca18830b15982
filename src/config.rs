//! Configuration types for browser-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for [`BatchDownloader`](crate::downloader::BatchDownloader)
///
/// All fields have sensible defaults; a default `Config` only needs
/// `output_dir` set before a run can start. The struct round-trips through a
/// small JSON settings file via [`Config::load`] and [`Config::save`]; a
/// missing or corrupt file is non-fatal and yields defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Directory where the browser session places downloaded artifacts
    #[serde(default)]
    pub output_dir: PathBuf,

    /// Run the browser session without a visible window (default: true)
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Recycle the browser session after this many completed downloads
    /// (default: 10)
    #[serde(default = "default_session_refresh")]
    pub session_refresh: usize,

    /// Maximum seconds a session implementation should wait for one download
    /// to settle; forwarded to the session backend (default: 20)
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,

    /// Pacing delay applied after every processed (non-skipped) task, in
    /// milliseconds (default: 2000)
    #[serde(default = "default_delay_between_ms")]
    pub delay_between_ms: u64,

    /// Pause between releasing an old session and acquiring a fresh one
    /// during a recycle, in milliseconds (default: 1000)
    #[serde(default = "default_recycle_pause_ms")]
    pub recycle_pause_ms: u64,

    /// Compute a SHA-256 digest over each completed artifact (default: true)
    #[serde(default = "default_true")]
    pub verify_checksum: bool,

    /// Remove stale partial artifacts from the output directory before a run
    /// starts (default: true)
    #[serde(default = "default_true")]
    pub clean_partials: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::new(),
            headless: true,
            session_refresh: default_session_refresh(),
            max_wait_secs: default_max_wait_secs(),
            delay_between_ms: default_delay_between_ms(),
            recycle_pause_ms: default_recycle_pause_ms(),
            verify_checksum: true,
            clean_partials: true,
        }
    }
}

impl Config {
    /// Validate the configuration for starting a run
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `output_dir` is unset or
    /// `session_refresh` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(Error::config(
                "output directory is not set",
                "output_dir",
            ));
        }
        if self.session_refresh == 0 {
            return Err(Error::config(
                "session_refresh must be at least 1",
                "session_refresh",
            ));
        }
        Ok(())
    }

    /// Load configuration from a JSON settings file
    ///
    /// Absence or corruption of the file is non-fatal: defaults are returned
    /// and a warning is logged for the corrupt case. This mirrors the
    /// settings-file contract — the file is a convenience, never a
    /// precondition.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };

        match serde_json::from_str(&raw) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Settings file is corrupt, falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Save configuration to a JSON settings file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_session_refresh() -> usize {
    10
}

fn default_max_wait_secs() -> u64 {
    20
}

fn default_delay_between_ms() -> u64 {
    2000
}

fn default_recycle_pause_ms() -> u64 {
    1000
}
