//! Asset downloader: streams a remote body to a local file
//!
//! Writes chunk-wise directly to the destination; a failed or empty
//! download never leaves a partial file behind. Existence checks are
//! deliberately not performed here so the caller can decide skip
//! semantics independently.

use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::humanize::ByteCount;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("connection timeout")]
    Timeout,

    #[error("received empty payload from {url}")]
    EmptyPayload { url: String },

    #[error("payload exceeds {limit} from {url}")]
    PayloadTooLarge { url: String, limit: ByteCount },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// Create a directory and any missing parents; an existing directory
/// is not an error.
pub async fn ensure_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path).await
}

/// Build the client used for raw asset downloads.
///
/// Export URLs point at an unauthenticated CDN, so no default headers
/// beyond the user agent.
pub fn download_client(request_timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(request_timeout)
        .user_agent(concat!("iconbox/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| FetchError::RequestFailed(e.to_string()))
}

/// Stream `url` into `dest`, creating parent directories as needed.
///
/// Returns the number of bytes written. A zero-byte body is treated as
/// a corrupt export and rejected; on any failure the partially written
/// file is removed before the error propagates.
pub async fn fetch_to_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    max_bytes: ByteCount,
) -> Result<u64> {
    if let Some(parent) = dest.parent() {
        ensure_dir(parent).await.map_err(|source| FetchError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::RequestFailed(e.to_string())
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::RequestFailed(format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        )));
    }

    let mut file = fs::File::create(dest).await.map_err(|source| FetchError::Write {
        path: dest.to_path_buf(),
        source,
    })?;

    let mut written: u64 = 0;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                discard(dest).await;
                return Err(FetchError::RequestFailed(format!(
                    "body stream interrupted: {}",
                    e
                )));
            }
        };

        written += chunk.len() as u64;
        if written > max_bytes.get() {
            discard(dest).await;
            return Err(FetchError::PayloadTooLarge {
                url: url.to_string(),
                limit: max_bytes,
            });
        }

        if let Err(source) = file.write_all(&chunk).await {
            discard(dest).await;
            return Err(FetchError::Write {
                path: dest.to_path_buf(),
                source,
            });
        }
    }

    if let Err(source) = file.flush().await {
        discard(dest).await;
        return Err(FetchError::Write {
            path: dest.to_path_buf(),
            source,
        });
    }
    drop(file);

    if written == 0 {
        discard(dest).await;
        return Err(FetchError::EmptyPayload {
            url: url.to_string(),
        });
    }

    debug!(url, path = %dest.display(), size = written, "download completed");

    Ok(written)
}

/// Best-effort removal of a partial file; the original failure is the
/// error worth reporting.
async fn discard(dest: &Path) {
    let _ = fs::remove_file(dest).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn ensure_dir_tolerates_existing() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b/c");

        ensure_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        // second call is a no-op
        ensure_dir(&nested).await.unwrap();
    }

    #[tokio::test]
    async fn write_failure_reports_path() {
        let dir = TempDir::new().unwrap();
        // destination is a directory, so File::create must fail
        let dest = dir.path().join("occupied");
        fs::create_dir(&dest).await.unwrap();

        let client = download_client(Duration::from_secs(1)).unwrap();
        let err = fetch_to_file(&client, "http://127.0.0.1:1/x.svg", &dest, ByteCount(1024))
            .await
            .unwrap_err();

        // connection refused before the write is also acceptable shape-wise;
        // either way no file appears at the destination path
        assert!(matches!(
            err,
            FetchError::RequestFailed(_) | FetchError::Write { .. }
        ));
    }
}
