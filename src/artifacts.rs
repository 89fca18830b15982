//! Skip/dedup oracle over the output directory
//!
//! Browser sessions place artifacts directly in the output directory, so the
//! only authoritative answer to "is this task already satisfied?" is a
//! filesystem query. [`ArtifactStore`] resolves a task's URL to an existing
//! artifact, distinguishing complete files from the partial files an
//! interrupted attempt leaves behind (`.crdownload`, `.part`, `.tmp`).

use crate::utils::derive_filename;
use std::path::{Path, PathBuf};

/// Name suffixes marking an in-progress or interrupted download
pub const PARTIAL_SUFFIXES: &[&str] = &[".crdownload", ".part", ".tmp"];

/// An artifact found in the output directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    /// Filename within the output directory
    pub name: String,
    /// File size in bytes
    pub size_bytes: u64,
}

/// Filesystem query object answering whether a task's artifact exists
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    output_dir: PathBuf,
}

impl ArtifactStore {
    /// Create a store over an output directory
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Whether a filename carries a recognized partial-download suffix
    pub fn is_partial(name: &str) -> bool {
        PARTIAL_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
    }

    /// Resolve any artifact (complete or partial) for a URL
    ///
    /// Looks for the derived filename, then for the filename with each
    /// partial suffix appended (browsers append the suffix to the final
    /// name while downloading). Returns `None` when nothing matches or the
    /// URL yields no filename.
    pub fn resolve(&self, url: &str) -> Option<Artifact> {
        let filename = derive_filename(url)?;

        let exact = self.output_dir.join(&filename);
        if let Ok(meta) = exact.metadata()
            && meta.is_file()
        {
            return Some(Artifact {
                name: filename,
                size_bytes: meta.len(),
            });
        }

        for suffix in PARTIAL_SUFFIXES {
            let partial_name = format!("{filename}{suffix}");
            let partial = self.output_dir.join(&partial_name);
            if let Ok(meta) = partial.metadata()
                && meta.is_file()
            {
                return Some(Artifact {
                    name: partial_name,
                    size_bytes: meta.len(),
                });
            }
        }

        None
    }

    /// Resolve a COMPLETE artifact for a URL
    ///
    /// A partial-suffixed match is not "exists" for skip purposes — it
    /// signals an interrupted prior attempt, and the task must be retried
    /// from scratch.
    pub fn resolve_complete(&self, url: &str) -> Option<Artifact> {
        self.resolve(url)
            .filter(|artifact| !Self::is_partial(&artifact.name))
    }

    /// Remove stale partial artifacts from the output directory
    ///
    /// Returns the names of the files removed. Individual removal failures
    /// are logged and do not abort the sweep.
    pub fn clean_partials(&self) -> Vec<String> {
        let entries = match std::fs::read_dir(&self.output_dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    dir = %self.output_dir.display(),
                    error = %e,
                    "Cannot read output directory for partial cleanup"
                );
                return Vec::new();
            }
        };

        let mut removed = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !Self::is_partial(&name) {
                continue;
            }
            match std::fs::remove_file(entry.path()) {
                Ok(()) => removed.push(name),
                Err(e) => {
                    tracing::warn!(file = %name, error = %e, "Failed to remove partial file");
                }
            }
        }

        removed
    }

    /// The output directory this store queries
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const URL: &str = "https://example.com/files/game.zip";

    #[test]
    fn is_partial_recognizes_all_suffixes() {
        assert!(ArtifactStore::is_partial("game.zip.crdownload"));
        assert!(ArtifactStore::is_partial("game.zip.part"));
        assert!(ArtifactStore::is_partial("game.zip.tmp"));
        assert!(!ArtifactStore::is_partial("game.zip"));
        assert!(!ArtifactStore::is_partial("partly-named.zip"));
    }

    #[test]
    fn resolve_finds_exact_filename_with_size() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("game.zip"), b"0123456789").unwrap();

        let store = ArtifactStore::new(temp_dir.path());
        let artifact = store.resolve(URL).unwrap();
        assert_eq!(artifact.name, "game.zip");
        assert_eq!(artifact.size_bytes, 10);
    }

    #[test]
    fn resolve_finds_partial_suffixed_filename() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("game.zip.crdownload"), b"xx").unwrap();

        let store = ArtifactStore::new(temp_dir.path());
        let artifact = store.resolve(URL).unwrap();
        assert_eq!(artifact.name, "game.zip.crdownload");
    }

    #[test]
    fn resolve_returns_none_when_nothing_matches() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp_dir.path());
        assert!(store.resolve(URL).is_none());
    }

    #[test]
    fn resolve_complete_rejects_partial_artifacts() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("game.zip.part"), b"xx").unwrap();

        let store = ArtifactStore::new(temp_dir.path());
        assert!(store.resolve(URL).is_some(), "partial is visible to resolve");
        assert!(
            store.resolve_complete(URL).is_none(),
            "partial must never count as an existing artifact for skip purposes"
        );
    }

    #[test]
    fn resolve_complete_prefers_complete_over_partial() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("game.zip"), b"done").unwrap();
        fs::write(temp_dir.path().join("game.zip.crdownload"), b"stale").unwrap();

        let store = ArtifactStore::new(temp_dir.path());
        let artifact = store.resolve_complete(URL).unwrap();
        assert_eq!(artifact.name, "game.zip");
    }

    #[test]
    fn resolve_returns_none_for_url_without_filename() {
        let temp_dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(temp_dir.path());
        assert!(store.resolve("https://example.com/").is_none());
    }

    #[test]
    fn clean_partials_removes_only_partial_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("keep.zip"), b"x").unwrap();
        fs::write(temp_dir.path().join("a.zip.crdownload"), b"x").unwrap();
        fs::write(temp_dir.path().join("b.iso.part"), b"x").unwrap();
        fs::write(temp_dir.path().join("c.tmp"), b"x").unwrap();

        let store = ArtifactStore::new(temp_dir.path());
        let mut removed = store.clean_partials();
        removed.sort();

        assert_eq!(removed, vec!["a.zip.crdownload", "b.iso.part", "c.tmp"]);
        assert!(temp_dir.path().join("keep.zip").exists());
        assert!(!temp_dir.path().join("a.zip.crdownload").exists());
    }

    #[test]
    fn clean_partials_on_missing_directory_returns_empty() {
        let store = ArtifactStore::new("/nonexistent/path/for/sure");
        assert!(store.clean_partials().is_empty());
    }
}
