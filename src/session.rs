//! Browser session boundary
//!
//! The engine never talks to a browser directly. Everything that requires a
//! live automation session — establishing it, scraping a page for links,
//! driving a download control — sits behind these traits, so the engine can
//! be driven by a real WebDriver wrapper or by a scripted mock in tests.
//!
//! Lifecycle contract: the engine acquires at most one session at a time,
//! uses it from a single worker, and guarantees [`BrowserSession::close`] is
//! called exactly once on every exit path. `close` must be idempotent and
//! must not fail even when the underlying session is already gone.

use crate::config::Config;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Factory for browser sessions
///
/// Implementations wrap whatever stateful machinery establishes a browser
/// session (a WebDriver client, a CDP connection). Acquisition errors are
/// fatal to a run, so implementations should fail fast with a descriptive
/// [`Error::Session`](crate::error::Error::Session).
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Establish a fresh session downloading into `output_dir`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Session`](crate::error::Error::Session) if the
    /// session cannot be established.
    async fn acquire(&self, config: &Config) -> Result<Box<dyn BrowserSession>>;
}

/// One live browser-automation session
///
/// Sessions are driven by the engine's single worker and are never shared,
/// so methods take `&mut self` and the trait only requires `Send`.
#[async_trait]
pub trait BrowserSession: Send {
    /// Collect download links from a page
    ///
    /// Used only while populating the queue, never inside the run loop.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Session`](crate::error::Error::Session) if the page
    /// cannot be scraped.
    async fn scrape_links(&mut self, page_url: &str) -> Result<Vec<String>>;

    /// Drive the download for one URL, placing the artifact in `output_dir`
    ///
    /// Returns `Ok(true)` on success and `Ok(false)` when the session
    /// determined the download did not happen (no control found, wait
    /// expired). Both `Ok(false)` and `Err(_)` are per-task failures to the
    /// engine: the task is marked failed and the run continues. The
    /// implementation owns its own timeout; the engine imposes none.
    async fn download(&mut self, url: &str, output_dir: &Path) -> Result<bool>;

    /// Tear the session down
    ///
    /// Must be idempotent: closing an already-closed session is a no-op,
    /// never an error.
    async fn close(&mut self);
}

/// Session provider that performs no real browser work
///
/// Scraping yields no links and every download "succeeds" without producing
/// an artifact. Useful for exercising an observer (a UI event loop, a
/// progress renderer) without a browser installed.
///
/// # Examples
///
/// ```
/// use browser_dl::session::{NoOpSessionProvider, SessionProvider};
/// use browser_dl::Config;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = NoOpSessionProvider;
/// let mut session = provider.acquire(&Config::default()).await?;
/// assert!(session.download("https://example.com/f.zip", "/tmp".as_ref()).await?);
/// session.close().await;
/// # Ok(())
/// # }
/// ```
pub struct NoOpSessionProvider;

struct NoOpSession;

#[async_trait]
impl SessionProvider for NoOpSessionProvider {
    async fn acquire(&self, _config: &Config) -> Result<Box<dyn BrowserSession>> {
        Ok(Box::new(NoOpSession))
    }
}

#[async_trait]
impl BrowserSession for NoOpSession {
    async fn scrape_links(&mut self, _page_url: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn download(&mut self, _url: &str, _output_dir: &Path) -> Result<bool> {
        Ok(true)
    }

    async fn close(&mut self) {}
}
