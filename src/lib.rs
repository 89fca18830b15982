//! # browser-dl
//!
//! Backend library for batch download managers driven through a
//! browser-automation session.
//!
//! One background worker walks a queue of URLs against a single browser
//! session: tasks whose artifact already exists are skipped, the session is
//! recycled on a configurable cadence, failures are recorded without
//! stopping the batch, and every state transition flows through an ordered
//! event channel to whatever is observing the run (typically a UI).
//!
//! ## Design Philosophy
//!
//! browser-dl is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - The observer drains a channel on its own cadence,
//!   no polling of engine internals
//! - **Backend-agnostic** - The browser layer is a pair of traits; any
//!   WebDriver wrapper (or a mock) can drive the engine
//! - **Single-session** - Intentionally one download at a time against one
//!   session; the hard part is orchestration, not parallelism
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use browser_dl::{BatchDownloader, Config, Event, NoOpSessionProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         output_dir: "./downloads".into(),
//!         session_refresh: 10,
//!         ..Config::default()
//!     };
//!
//!     // Swap NoOpSessionProvider for a real WebDriver-backed provider
//!     let (engine, mut events) = BatchDownloader::new(config, Arc::new(NoOpSessionProvider));
//!
//!     engine.set_queue([
//!         "https://example.com/a.zip",
//!         "https://example.com/b.zip",
//!     ]).await?;
//!     engine.start().await?;
//!
//!     while let Some(event) = events.recv().await {
//!         println!("{event:?}");
//!         if event == Event::RunFinished {
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Skip/dedup oracle over the output directory
pub mod artifacts;
/// Artifact integrity digests
pub mod checksum;
/// Configuration types
pub mod config;
/// Core orchestration engine (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Session recycling policy
pub mod recycler;
/// Browser session boundary traits
pub mod session;
/// Core types and events
pub mod types;
/// URL and URL-list utilities
pub mod utils;

// Re-export commonly used types
pub use artifacts::{Artifact, ArtifactStore};
pub use config::Config;
pub use downloader::BatchDownloader;
pub use error::{Error, Result};
pub use recycler::SessionRecycler;
pub use session::{BrowserSession, NoOpSessionProvider, SessionProvider};
pub use types::{Event, LogLevel, QueueStats, Status, Task};

/// Helper function to run the engine with graceful signal handling.
///
/// Waits for a termination signal, then stops the engine and waits for the
/// worker to release the browser session and wind down.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with a `ctrl_c` fallback if
///   signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use browser_dl::{BatchDownloader, Config, NoOpSessionProvider, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config { output_dir: "./downloads".into(), ..Config::default() };
///     let (engine, _events) = BatchDownloader::new(config, Arc::new(NoOpSessionProvider));
///
///     engine.set_queue(["https://example.com/a.zip"]).await?;
///     engine.start().await?;
///
///     // Blocks until a signal arrives, then shuts the run down cleanly
///     run_with_shutdown(engine).await?;
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(engine: BatchDownloader) -> Result<()> {
    wait_for_signal().await;
    engine.stop().await;
    engine.wait_until_finished().await;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        _ => {
            tracing::warn!("Could not register signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
