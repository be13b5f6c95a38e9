//! Transport abstraction for resumable transfers.
//!
//! The fetcher talks to the remote side only through [`TransferSource`],
//! which allows dependency injection and easier testing with a mock range
//! server.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use super::error::{FetchError, FetchResult};

/// Default total timeout per ranged request (covers body streaming).
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Timeout for establishing a connection.
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Read increment while streaming a response body (64KB). Each increment
/// is handed to the sink separately so progress survives mid-chunk
/// failures.
const STREAM_BUFFER_SIZE: usize = 64 * 1024;

/// A remote file that supports size probes and ranged reads.
pub trait TransferSource: Send + Sync {
    /// Expected total size of the remote file, if the server reports one.
    ///
    /// Any failure here means "unknown", never a fatal error.
    fn content_length(&self, url: &str) -> Option<u64>;

    /// Stream the inclusive byte range `[start, end]` into `sink`,
    /// returning the number of bytes delivered.
    ///
    /// The sink is invoked once per increment; bytes handed over before a
    /// transport error are already durable for the caller. A range
    /// entirely past the end of the file yields `Ok(0)`.
    fn read_range(
        &self,
        url: &str,
        start: u64,
        end: u64,
        sink: &mut dyn FnMut(&[u8]) -> FetchResult<()>,
    ) -> FetchResult<u64>;
}

impl<T: TransferSource + ?Sized> TransferSource for Arc<T> {
    fn content_length(&self, url: &str) -> Option<u64> {
        (**self).content_length(url)
    }

    fn read_range(
        &self,
        url: &str,
        start: u64,
        end: u64,
        sink: &mut dyn FnMut(&[u8]) -> FetchResult<()>,
    ) -> FetchResult<u64> {
        (**self).read_range(url, start, end, sink)
    }
}

/// Real transfer source using blocking HTTP with Range requests.
pub struct HttpSource {
    client: reqwest::blocking::Client,
}

impl HttpSource {
    /// Create a source with default timeouts.
    pub fn new() -> FetchResult<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a source with a custom per-request timeout.
    pub fn with_timeout(timeout: Duration) -> FetchResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

impl TransferSource for HttpSource {
    fn content_length(&self, url: &str) -> Option<u64> {
        self.client
            .head(url)
            .send()
            .ok()
            .filter(|r| r.status().is_success())
            .and_then(|r| {
                r.headers()
                    .get("content-length")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
            })
    }

    fn read_range(
        &self,
        url: &str,
        start: u64,
        end: u64,
        sink: &mut dyn FnMut(&[u8]) -> FetchResult<()>,
    ) -> FetchResult<u64> {
        let mut response = self
            .client
            .get(url)
            .header("Range", format!("bytes={}-{}", start, end))
            .send()
            .map_err(|e| FetchError::Http {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        // 416 means the requested range starts past the end of the file,
        // which the resume loop treats as "no more data".
        if status.as_u16() == 416 {
            return Ok(0);
        }
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                reason: format!("HTTP {}", status),
            });
        }

        let mut buffer = vec![0u8; STREAM_BUFFER_SIZE];
        let mut delivered = 0u64;

        loop {
            let bytes_read = response.read(&mut buffer).map_err(|e| FetchError::Http {
                url: url.to_string(),
                reason: format!("read error: {}", e),
            })?;

            if bytes_read == 0 {
                break;
            }

            sink(&buffer[..bytes_read])?;
            delivered += bytes_read as u64;
        }

        Ok(delivered)
    }
}
