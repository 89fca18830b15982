//! Shared test helpers: a scripted mock session provider and engine rigs.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::session::{BrowserSession, SessionProvider};
use crate::types::Event;

use super::BatchDownloader;

/// Scripted behavior of `download()` for one URL
#[derive(Clone)]
pub(crate) enum Outcome {
    /// Write the artifact file into the output directory, return `Ok(true)`
    Success,
    /// Return `Ok(true)` without producing an artifact
    SuccessNoArtifact,
    /// Return `Ok(false)`
    Failure,
    /// Return `Err(Error::Session(..))` from the download call
    Error(String),
    /// Block on the shared gate until the test adds a permit, then `Success`
    Gated,
}

/// Observable side effects of the mock provider
#[derive(Default)]
pub(crate) struct MockStats {
    acquires: AtomicUsize,
    releases: AtomicUsize,
    downloads: std::sync::Mutex<Vec<String>>,
}

impl MockStats {
    /// Successful session acquisitions so far
    pub(crate) fn acquires(&self) -> usize {
        self.acquires.load(Ordering::SeqCst)
    }

    /// Session closes so far
    pub(crate) fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Every URL passed to `download()`, in call order
    pub(crate) fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }
}

/// Session provider with per-URL scripted outcomes and call counters
pub(crate) struct MockProvider {
    pub(crate) stats: Arc<MockStats>,
    /// When the worker hits a `Gated` outcome it waits here; tests release
    /// it with [`MockProvider::open_gate`].
    gate: Arc<tokio::sync::Semaphore>,
    outcomes: Arc<std::sync::Mutex<HashMap<String, Outcome>>>,
    scrape_links: std::sync::Mutex<Vec<String>>,
    /// `Some(n)`: only the first n acquires succeed, the rest error
    acquire_budget: std::sync::Mutex<Option<usize>>,
}

impl MockProvider {
    pub(crate) fn new() -> Self {
        Self {
            stats: Arc::new(MockStats::default()),
            gate: Arc::new(tokio::sync::Semaphore::new(0)),
            outcomes: Arc::new(std::sync::Mutex::new(HashMap::new())),
            scrape_links: std::sync::Mutex::new(Vec::new()),
            acquire_budget: std::sync::Mutex::new(None),
        }
    }

    /// Script the outcome for one URL (default for unscripted URLs: `Success`)
    pub(crate) fn set_outcome(&self, url: &str, outcome: Outcome) {
        self.outcomes.lock().unwrap().insert(url.to_string(), outcome);
    }

    /// Script what `scrape_links` returns
    pub(crate) fn set_scrape_links(&self, links: Vec<String>) {
        *self.scrape_links.lock().unwrap() = links;
    }

    /// Allow only the first `n` acquires to succeed
    pub(crate) fn limit_acquires(&self, n: usize) {
        *self.acquire_budget.lock().unwrap() = Some(n);
    }

    /// Release one blocked `Gated` download
    pub(crate) fn open_gate(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl SessionProvider for MockProvider {
    async fn acquire(&self, _config: &Config) -> Result<Box<dyn BrowserSession>> {
        {
            let mut budget = self.acquire_budget.lock().unwrap();
            if let Some(remaining) = budget.as_mut() {
                if *remaining == 0 {
                    return Err(Error::Session("mock acquire refused".into()));
                }
                *remaining -= 1;
            }
        }

        self.stats.acquires.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            stats: self.stats.clone(),
            gate: self.gate.clone(),
            outcomes: self.outcomes.clone(),
            links: self.scrape_links.lock().unwrap().clone(),
            closed: false,
        }))
    }
}

struct MockSession {
    stats: Arc<MockStats>,
    gate: Arc<tokio::sync::Semaphore>,
    outcomes: Arc<std::sync::Mutex<HashMap<String, Outcome>>>,
    links: Vec<String>,
    closed: bool,
}

impl MockSession {
    fn write_artifact(url: &str, output_dir: &Path) {
        let name = crate::utils::derive_filename(url).unwrap_or_else(|| "artifact.bin".into());
        std::fs::write(output_dir.join(name), format!("artifact:{url}")).unwrap();
    }
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn scrape_links(&mut self, _page_url: &str) -> Result<Vec<String>> {
        Ok(self.links.clone())
    }

    async fn download(&mut self, url: &str, output_dir: &Path) -> Result<bool> {
        self.stats.downloads.lock().unwrap().push(url.to_string());

        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or(Outcome::Success);

        match outcome {
            Outcome::Success => {
                Self::write_artifact(url, output_dir);
                Ok(true)
            }
            Outcome::SuccessNoArtifact => Ok(true),
            Outcome::Failure => Ok(false),
            Outcome::Error(msg) => Err(Error::Session(msg)),
            Outcome::Gated => {
                let permit = self
                    .gate
                    .acquire()
                    .await
                    .expect("test gate semaphore closed");
                permit.forget();
                Self::write_artifact(url, output_dir);
                Ok(true)
            }
        }
    }

    async fn close(&mut self) {
        // Idempotent, count the first close only
        if !self.closed {
            self.closed = true;
            self.stats.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// An engine wired to a mock provider in a temp directory
pub(crate) struct TestRig {
    pub(crate) engine: BatchDownloader,
    pub(crate) events: UnboundedReceiver<Event>,
    pub(crate) provider: Arc<MockProvider>,
    pub(crate) stats: Arc<MockStats>,
    pub(crate) temp_dir: TempDir,
}

impl TestRig {
    /// Path of the artifact a URL would produce in the output directory
    pub(crate) fn artifact_path(&self, url: &str) -> std::path::PathBuf {
        self.output_dir()
            .join(crate::utils::derive_filename(url).unwrap())
    }

    pub(crate) fn output_dir(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("downloads")
    }

    /// Pre-create an artifact file in the output directory
    pub(crate) fn seed_artifact(&self, name: &str, bytes: &[u8]) {
        std::fs::write(self.output_dir().join(name), bytes).unwrap();
    }
}

/// Create a test engine with pacing delays zeroed out
pub(crate) fn create_test_engine() -> TestRig {
    create_test_engine_with(|_| {})
}

/// Create a test engine, letting the caller adjust the config first
pub(crate) fn create_test_engine_with(adjust: impl FnOnce(&mut Config)) -> TestRig {
    let temp_dir = tempfile::tempdir().unwrap();

    let mut config = Config {
        output_dir: temp_dir.path().join("downloads"),
        delay_between_ms: 0,
        recycle_pause_ms: 0,
        ..Config::default()
    };
    adjust(&mut config);
    std::fs::create_dir_all(&config.output_dir).unwrap();

    let provider = Arc::new(MockProvider::new());
    let stats = provider.stats.clone();
    let (engine, events) = BatchDownloader::new(config, provider.clone());

    TestRig {
        engine,
        events,
        provider,
        stats,
        temp_dir,
    }
}

/// Poll a condition until it holds, failing the test after 5 seconds
pub(crate) async fn wait_for(mut cond: impl FnMut() -> bool) {
    for _ in 0..500 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within 5s");
}

/// Drain events until `RunFinished`, returning everything received
///
/// Panics after 5 seconds so a wedged worker fails the test instead of
/// hanging it.
pub(crate) async fn drain_until_finished(events: &mut UnboundedReceiver<Event>) -> Vec<Event> {
    let mut collected = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for RunFinished")
            .expect("event channel closed before RunFinished");
        let finished = event == Event::RunFinished;
        collected.push(event);
        if finished {
            return collected;
        }
    }
}
