//! Error types for resumable transfers.

use std::io;
use std::path::PathBuf;

/// Result type for transfer operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors that can occur during a resumable transfer.
#[derive(Debug)]
pub enum FetchError {
    /// Failed to construct the HTTP client.
    Client(String),

    /// Transport-level failure (request, status, or mid-stream read).
    Http { url: String, reason: String },

    /// Local I/O failure on the partial or destination file.
    Io { path: PathBuf, source: io::Error },

    /// Final size does not match what the server reported. The partial
    /// file is kept on disk; re-invoking resumes from it.
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// Checksum verification failed after a completed transfer.
    ChecksumMismatch {
        filename: String,
        expected: String,
        actual: String,
    },
}

impl FetchError {
    /// Whether retrying the same operation may succeed.
    ///
    /// Transport and local I/O errors are transient; integrity failures
    /// are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Io { .. })
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client(reason) => write!(f, "failed to create HTTP client: {}", reason),
            Self::Http { url, reason } => write!(f, "request to {} failed: {}", url, reason),
            Self::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
            Self::SizeMismatch {
                path,
                expected,
                actual,
            } => write!(
                f,
                "size mismatch for {}: got {} bytes, expected {}",
                path.display(),
                actual,
                expected
            ),
            Self::ChecksumMismatch {
                filename,
                expected,
                actual,
            } => write!(
                f,
                "checksum mismatch for {}: expected {}, got {}",
                filename, expected, actual
            ),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let http = FetchError::Http {
            url: "http://x".to_string(),
            reason: "timed out".to_string(),
        };
        assert!(http.is_transient());

        let io = FetchError::Io {
            path: PathBuf::from("/p"),
            source: io::Error::new(io::ErrorKind::Interrupted, "interrupted"),
        };
        assert!(io.is_transient());

        let mismatch = FetchError::SizeMismatch {
            path: PathBuf::from("/p"),
            expected: 10,
            actual: 5,
        };
        assert!(!mismatch.is_transient());
    }

    #[test]
    fn test_size_mismatch_display() {
        let err = FetchError::SizeMismatch {
            path: PathBuf::from("/w/model.ckpt.partial"),
            expected: 100,
            actual: 60,
        };
        let msg = err.to_string();
        assert!(msg.contains("got 60"));
        assert!(msg.contains("expected 100"));
    }
}
