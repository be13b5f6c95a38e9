//! Resumable chunked file transfer.
//!
//! This module fetches large model-weight files safely across interrupted
//! sessions:
//! - Transport abstraction with size probe and ranged reads (`source`)
//! - The chunked resume loop with durable partial files (`transfer`)
//! - Reusable retry policies with backoff (`retry`)
//! - SHA-256 integrity helpers (`checksum`)
//! - The TripoSR weight set (`weights`)
//!
//! # Architecture
//!
//! ```text
//! WeightSet
//!     │
//!     └── ChunkedFetcher (resume loop, .partial files)
//!             │
//!             ├── TransferSource (trait)
//!             │       └── HttpSource (ranged HTTP GET)
//!             │
//!             └── RetryPolicy (fixed / exponential backoff)
//! ```
//!
//! A destination file only ever appears by renaming a fully verified
//! partial file, so an existing destination is proof of a completed
//! transfer. Concurrent fetches to the same destination are not supported;
//! callers serialize per destination.

mod checksum;
mod error;
mod retry;
mod source;
mod transfer;
mod weights;

pub use checksum::{sha256_file, verify_sha256};
pub use error::{FetchError, FetchResult};
pub use retry::{retry_with, RetryPolicy};
pub use source::{HttpSource, TransferSource};
pub use transfer::{
    ChunkedFetcher, FetchSummary, ProgressCallback, DEFAULT_CHUNK_SIZE, DEFAULT_RETRY_DELAY_SECS,
};
pub use weights::{WeightFile, WeightOutcome, WeightSet};
