//! Utility functions for URL-derived names and URL list files

use std::path::Path;

/// Maximum characters of raw URL used when no filename can be derived
const DISPLAY_NAME_MAX: usize = 50;

/// Derive the artifact filename for a URL
///
/// Takes the last path segment of the URL and percent-decodes it. Returns
/// `None` when the URL cannot be parsed or has no non-empty final segment
/// (e.g., `https://example.com/`).
///
/// # Examples
///
/// ```
/// use browser_dl::utils::derive_filename;
///
/// assert_eq!(
///     derive_filename("https://example.com/files/My%20Game.zip"),
///     Some("My Game.zip".to_string())
/// );
/// assert_eq!(derive_filename("https://example.com/"), None);
/// ```
pub fn derive_filename(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let last_segment = parsed.path_segments()?.next_back()?;
    if last_segment.is_empty() {
        return None;
    }

    match urlencoding::decode(last_segment) {
        Ok(decoded) => Some(decoded.into_owned()),
        Err(_) => Some(last_segment.to_string()),
    }
}

/// Derive a display name for a URL
///
/// Uses [`derive_filename`] when possible, otherwise falls back to the URL
/// itself truncated to 50 characters, so every task has something readable
/// to show in a queue listing.
pub fn display_name(url: &str) -> String {
    if let Some(name) = derive_filename(url) {
        return name;
    }

    url.chars().take(DISPLAY_NAME_MAX).collect()
}

/// Read a list of URLs from a text file
///
/// One URL per line; surrounding whitespace is trimmed, and blank lines and
/// `#` comment lines are ignored. Duplicates are NOT removed here — the
/// queue loader deduplicates across all input sources.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read.
pub fn read_url_file(path: &Path) -> std::io::Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)?;

    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
