//! Artifact integrity digests
//!
//! Digests are SHA-256 over the artifact bytes, streamed in fixed-size
//! chunks so arbitrarily large files never sit in memory. The same bytes
//! always produce the same hex string, so re-runs can compare digests.

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Read chunk size for streaming digests
const CHUNK_SIZE: usize = 4096;

/// Compute the hex-encoded SHA-256 digest of a file
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened or read.
pub async fn sha256_file(path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    let digest = hasher.finalize();
    Ok(format!("{digest:x}"))
}
