//! CLI error type.

use img2char::error::BatchError;
use img2char::fetch::FetchError;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// A flag value could not be used.
    InvalidArgument(String),

    /// Run-level batch failure (bad input, missing engine).
    Batch(BatchError),

    /// Weight download client failure.
    Fetch(FetchError),

    /// Some weight files are still incomplete after a download round.
    WeightsIncomplete(usize),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "{}", msg),
            Self::Batch(e) => write!(f, "{}", e),
            Self::Fetch(e) => write!(f, "{}", e),
            Self::WeightsIncomplete(count) => {
                write!(
                    f,
                    "{} file(s) incomplete; run again to resume from the saved progress",
                    count
                )
            }
        }
    }
}

impl std::error::Error for CliError {}

impl From<BatchError> for CliError {
    fn from(e: BatchError) -> Self {
        Self::Batch(e)
    }
}

impl From<FetchError> for CliError {
    fn from(e: FetchError) -> Self {
        Self::Fetch(e)
    }
}
