//! Error types for batch runs.

use std::io;
use std::path::PathBuf;

/// Result type for batch operations.
pub type BatchResult<T> = Result<T, BatchError>;

/// Errors that abort a batch run before or outside per-item processing.
///
/// Per-item stage failures are never represented here; they are recorded in
/// the item's outcome and the batch continues.
#[derive(Debug)]
pub enum BatchError {
    /// The input path does not exist.
    InputNotFound { path: PathBuf },

    /// The input directory contains no image files.
    NoImagesFound { path: PathBuf },

    /// A required external engine is missing or unusable.
    EngineUnavailable { engine: String, detail: String },

    /// Failed to read a file or directory.
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write a file.
    WriteFailed { path: PathBuf, source: io::Error },

    /// Failed to create a directory.
    CreateDirFailed { path: PathBuf, source: io::Error },
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InputNotFound { path } => {
                write!(f, "input path not found: {}", path.display())
            }
            Self::NoImagesFound { path } => {
                write!(f, "no images found in {}", path.display())
            }
            Self::EngineUnavailable { engine, detail } => {
                write!(f, "{} is not available: {}", engine, detail)
            }
            Self::ReadFailed { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            Self::WriteFailed { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            Self::CreateDirFailed { path, source } => {
                write!(
                    f,
                    "failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFailed { source, .. } => Some(source),
            Self::WriteFailed { source, .. } => Some(source),
            Self::CreateDirFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_not_found_display() {
        let err = BatchError::InputNotFound {
            path: PathBuf::from("/missing/input"),
        };
        assert_eq!(err.to_string(), "input path not found: /missing/input");
    }

    #[test]
    fn test_no_images_found_display() {
        let err = BatchError::NoImagesFound {
            path: PathBuf::from("/empty"),
        };
        assert!(err.to_string().contains("no images found"));
    }

    #[test]
    fn test_io_error_source() {
        use std::error::Error;

        let err = BatchError::ReadFailed {
            path: PathBuf::from("/x"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());

        let err = BatchError::EngineUnavailable {
            engine: "Blender".to_string(),
            detail: "not on PATH".to_string(),
        };
        assert!(err.source().is_none());
    }
}
