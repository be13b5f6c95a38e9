//! The chunked resume loop.
//!
//! One fetch owns one `.partial` file next to its destination. Progress is
//! flushed after every stream increment, so an interruption at any point
//! loses nothing; the next invocation resumes from the partial file's
//! length. The destination only ever appears via an atomic rename of a
//! verified partial.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::error::{FetchError, FetchResult};
use super::retry::{retry_with, RetryPolicy};
use super::source::TransferSource;

/// Default download chunk size (10MB), one ranged request per chunk.
pub const DEFAULT_CHUNK_SIZE: u64 = 10 * 1024 * 1024;

/// Default fixed delay between retries after a network error (5 seconds).
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;

/// Suffix appended to the destination name for the in-progress file.
const PARTIAL_SUFFIX: &str = ".partial";

/// Progress callback: (bytes on disk, expected total if known).
pub type ProgressCallback = Box<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// Result of a completed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSummary {
    /// Final destination path.
    pub path: PathBuf,

    /// Size of the destination file in bytes.
    pub total_bytes: u64,

    /// Bytes already on disk when this invocation started.
    pub resumed_from: u64,

    /// True when the destination was already complete and no network
    /// traffic happened at all.
    pub already_complete: bool,
}

/// Chunked, resumable fetcher over a [`TransferSource`].
///
/// Not safe to run twice concurrently against the same destination path;
/// callers serialize per destination.
pub struct ChunkedFetcher<S: TransferSource> {
    source: S,
    chunk_size: u64,
    retry: RetryPolicy,
}

impl<S: TransferSource> ChunkedFetcher<S> {
    /// Create a fetcher with the default chunk size and an unbounded
    /// fixed-delay retry policy.
    pub fn new(source: S) -> Self {
        Self {
            source,
            chunk_size: DEFAULT_CHUNK_SIZE,
            retry: RetryPolicy::unbounded(Duration::from_secs(DEFAULT_RETRY_DELAY_SECS)),
        }
    }

    /// Set the chunk size in bytes (minimum 1).
    pub fn with_chunk_size(mut self, bytes: u64) -> Self {
        self.chunk_size = bytes.max(1);
        self
    }

    /// Set the retry policy for transient errors.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch `url` to `dest`, resuming any partial state on disk.
    pub fn fetch(&self, url: &str, dest: &Path) -> FetchResult<FetchSummary> {
        self.fetch_with_progress(url, dest, None)
    }

    /// Fetch with a progress callback invoked after every flushed
    /// increment.
    pub fn fetch_with_progress(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<ProgressCallback>,
    ) -> FetchResult<FetchSummary> {
        let partial = partial_path(dest);

        // A destination is only ever created by renaming a verified
        // partial, so its presence with no partial alongside proves a
        // previous fetch completed; skip all network traffic.
        if dest.exists() && !partial.exists() {
            let size = file_len(dest);
            debug!(dest = %dest.display(), size, "already downloaded");
            return Ok(FetchSummary {
                path: dest.to_path_buf(),
                total_bytes: size,
                resumed_from: size,
                already_complete: true,
            });
        }

        let expected = self.source.content_length(url);
        if expected.is_none() {
            warn!(url, "could not determine remote size; proceeding without verification");
        }

        if dest.exists() {
            // A leftover partial casts doubt on the destination. Keep it
            // only if the server confirms the size; otherwise it is stale.
            match expected {
                Some(total) if file_len(dest) == total => {
                    let _ = fs::remove_file(&partial);
                    return Ok(FetchSummary {
                        path: dest.to_path_buf(),
                        total_bytes: total,
                        resumed_from: total,
                        already_complete: true,
                    });
                }
                _ => {
                    fs::remove_file(dest).map_err(|e| FetchError::Io {
                        path: dest.to_path_buf(),
                        source: e,
                    })?;
                }
            }
        }

        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| FetchError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let resumed_from = file_len(&partial);
        if resumed_from > 0 {
            if let Some(total) = expected {
                // The partial already covers everything; promote it.
                if resumed_from >= total {
                    let summary = self.promote(&partial, dest, resumed_from)?;
                    return Ok(FetchSummary {
                        resumed_from,
                        ..summary
                    });
                }
            }
            info!(dest = %dest.display(), resumed_from, "resuming transfer");
        }

        loop {
            let offset = file_len(&partial);
            if let Some(total) = expected {
                if offset >= total {
                    break;
                }
            }

            let received = retry_with(&self.retry, FetchError::is_transient, || {
                self.request_chunk(url, &partial, expected, progress.as_ref())
            })?;

            if received == 0 {
                // Server has nothing more to give
                break;
            }
            if received < self.chunk_size {
                // Short chunk: that was the final one
                break;
            }
        }

        let final_len = file_len(&partial);
        if let Some(total) = expected {
            if final_len != total {
                warn!(dest = %dest.display(), got = final_len, expected = total,
                      "transfer incomplete; partial kept for resume");
                return Err(FetchError::SizeMismatch {
                    path: partial,
                    expected: total,
                    actual: final_len,
                });
            }
        }

        let summary = self.promote(&partial, dest, final_len)?;
        Ok(FetchSummary {
            resumed_from,
            ..summary
        })
    }

    /// Issue one ranged request, appending every increment to the partial
    /// file and flushing immediately.
    ///
    /// The resume offset is re-read from disk on every attempt because a
    /// failed request may have flushed bytes before dying.
    fn request_chunk(
        &self,
        url: &str,
        partial: &Path,
        expected: Option<u64>,
        progress: Option<&ProgressCallback>,
    ) -> FetchResult<u64> {
        let offset = file_len(partial);
        let end = offset + self.chunk_size - 1;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(partial)
            .map_err(|e| FetchError::Io {
                path: partial.to_path_buf(),
                source: e,
            })?;

        let mut written = 0u64;
        let mut sink = |piece: &[u8]| -> FetchResult<()> {
            file.write_all(piece)
                .and_then(|_| file.flush())
                .map_err(|e| FetchError::Io {
                    path: partial.to_path_buf(),
                    source: e,
                })?;
            written += piece.len() as u64;
            if let Some(cb) = progress {
                cb(offset + written, expected);
            }
            Ok(())
        };

        self.source.read_range(url, offset, end, &mut sink)
    }

    /// Atomically rename a complete partial to its destination.
    fn promote(&self, partial: &Path, dest: &Path, total_bytes: u64) -> FetchResult<FetchSummary> {
        fs::rename(partial, dest).map_err(|e| FetchError::Io {
            path: dest.to_path_buf(),
            source: e,
        })?;
        info!(dest = %dest.display(), total_bytes, "transfer complete");
        Ok(FetchSummary {
            path: dest.to_path_buf(),
            total_bytes,
            resumed_from: 0,
            already_complete: false,
        })
    }
}

/// The in-progress file next to a destination: `<dest>.partial`.
pub(crate) fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

fn file_len(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}
