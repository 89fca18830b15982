//! Queue population — URL files, page scraping, dedup.

use std::collections::HashSet;
use std::path::Path;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{Event, LogLevel, Task};

use super::BatchDownloader;

impl BatchDownloader {
    /// Replace the queue with a batch of URLs
    ///
    /// Duplicates are removed, first occurrence wins, and insertion order is
    /// preserved — that order is the processing order. The previous batch is
    /// replaced wholesale. Returns the number of unique tasks loaded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyRunning`] while a run is active; the queue is
    /// immutable for the duration of a run.
    pub async fn set_queue(
        &self,
        urls: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<usize> {
        if self.is_running() {
            return Err(Error::AlreadyRunning);
        }

        let mut seen: HashSet<String> = HashSet::new();
        let tasks: Vec<Task> = urls
            .into_iter()
            .map(Into::into)
            .filter(|url| seen.insert(url.clone()))
            .map(Task::new)
            .collect();
        let count = tasks.len();

        *self.tasks.write().await = tasks;

        self.emit_event(Event::QueueChanged);
        self.emit_event(Event::StatsChanged);
        self.emit_log(
            LogLevel::Success,
            format!("Queue populated with {count} item(s)"),
        );
        tracing::info!(count, "Queue populated");

        Ok(count)
    }

    /// Load the queue from a URL list file
    ///
    /// One URL per line; blank lines and `#` comments are ignored. The batch
    /// replaces the current queue.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or
    /// [`Error::AlreadyRunning`] while a run is active.
    pub async fn load_url_file(&self, path: &Path) -> Result<usize> {
        if self.is_running() {
            return Err(Error::AlreadyRunning);
        }

        let urls = crate::utils::read_url_file(path)?;
        let count = self.set_queue(urls).await?;
        tracing::info!(count, path = %path.display(), "Loaded URLs from file");
        Ok(count)
    }

    /// Load the queue by scraping a page for download links
    ///
    /// A throwaway session (always headless — no point showing a window for
    /// a scrape) is acquired, the page is scraped, and the session is closed
    /// before this method returns. Used only outside a run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Session`] if the session cannot be established or
    /// the page cannot be scraped, [`Error::Config`] if the output directory
    /// is unset, or [`Error::AlreadyRunning`] while a run is active.
    pub async fn scrape_page(&self, page_url: &str) -> Result<usize> {
        if self.is_running() {
            return Err(Error::AlreadyRunning);
        }

        let config = self.config.read().await.clone();
        config.validate()?;
        let scrape_config = Config {
            headless: true,
            ..config
        };

        self.emit_event(Event::Status {
            message: format!("Scraping {page_url}..."),
        });
        self.emit_log(LogLevel::Info, "Scraping main page...");

        let mut session = self.provider.acquire(&scrape_config).await?;
        let result = session.scrape_links(page_url).await;
        session.close().await;

        let links = match result {
            Ok(links) => links,
            Err(e) => {
                self.emit_log(LogLevel::Error, format!("Error scraping: {e}"));
                tracing::error!(page_url, error = %e, "Scraping failed");
                return Err(e);
            }
        };

        tracing::info!(count = links.len(), page_url, "Scraped download links");
        self.set_queue(links).await
    }
}
