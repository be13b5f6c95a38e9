//! The TripoSR model-weight set.
//!
//! Mesh generation needs large weight files fetched ahead of pipeline runs.
//! A [`WeightSet`] names the files and where they come from; fetching each
//! one goes through the resumable [`ChunkedFetcher`](super::ChunkedFetcher),
//! so an interrupted download is picked up where it left off on the next
//! invocation.

use std::path::Path;

use tracing::{info, warn};

use super::checksum::verify_sha256;
use super::error::FetchResult;
use super::source::TransferSource;
use super::transfer::{ChunkedFetcher, FetchSummary};

/// Default weight host.
pub const HF_BASE_URL: &str = "https://huggingface.co";

/// Upstream repository holding the TripoSR weights.
pub const TRIPOSR_REPO_ID: &str = "stabilityai/TripoSR";

/// One weight file in a set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightFile {
    /// File name in the remote repository.
    pub remote_name: String,

    /// File name under the local weights directory.
    pub local_name: String,

    /// Expected SHA-256 (lowercase hex), verified after transfer when
    /// present.
    pub sha256: Option<String>,
}

impl WeightFile {
    /// A file stored locally under its remote name, unverified.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            remote_name: name.clone(),
            local_name: name,
            sha256: None,
        }
    }
}

/// Result of fetching one weight file.
#[derive(Debug)]
pub struct WeightOutcome {
    /// Local file name this outcome belongs to.
    pub local_name: String,

    /// Fetch result; on failure the on-disk checkpoint remains for resume.
    pub result: FetchResult<FetchSummary>,
}

impl WeightOutcome {
    /// Whether this file is fully on disk.
    pub fn is_complete(&self) -> bool {
        self.result.is_ok()
    }
}

/// A named set of weight files behind one repository URL.
#[derive(Debug, Clone)]
pub struct WeightSet {
    /// Host base URL.
    pub base_url: String,

    /// Repository identifier under the host.
    pub repo_id: String,

    /// Files to fetch.
    pub files: Vec<WeightFile>,
}

impl WeightSet {
    /// The TripoSR weight set: model config plus the checkpoint.
    ///
    /// The feature-extractor model is small and handled by the engine on
    /// first run; the checkpoint here is the multi-gigabyte one worth
    /// resuming.
    pub fn triposr() -> Self {
        Self {
            base_url: HF_BASE_URL.to_string(),
            repo_id: TRIPOSR_REPO_ID.to_string(),
            files: vec![WeightFile::named("config.yaml"), WeightFile::named("model.ckpt")],
        }
    }

    /// Override the host (tests point this at a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Resolve the download URL for a file in this set.
    pub fn url_for(&self, file: &WeightFile) -> String {
        format!(
            "{}/{}/resolve/main/{}",
            self.base_url, self.repo_id, file.remote_name
        )
    }

    /// Fetch every file in the set to `dest_dir`, one at a time.
    ///
    /// Failures do not stop the remaining files; each failed file leaves a
    /// resumable checkpoint behind. Returns one outcome per file.
    pub fn fetch_all<S: TransferSource>(
        &self,
        fetcher: &ChunkedFetcher<S>,
        dest_dir: &Path,
    ) -> Vec<WeightOutcome> {
        self.files
            .iter()
            .map(|file| {
                let url = self.url_for(file);
                let dest = dest_dir.join(&file.local_name);
                let result = self.fetch_one(fetcher, file, &url, &dest);
                match &result {
                    Ok(summary) if summary.already_complete => {
                        info!(file = %file.local_name, "already downloaded");
                    }
                    Ok(summary) => {
                        info!(file = %file.local_name, bytes = summary.total_bytes, "downloaded");
                    }
                    Err(e) => {
                        warn!(file = %file.local_name, error = %e, "download incomplete");
                    }
                }
                WeightOutcome {
                    local_name: file.local_name.clone(),
                    result,
                }
            })
            .collect()
    }

    fn fetch_one<S: TransferSource>(
        &self,
        fetcher: &ChunkedFetcher<S>,
        file: &WeightFile,
        url: &str,
        dest: &Path,
    ) -> FetchResult<FetchSummary> {
        let summary = fetcher.fetch(url, dest)?;
        if let Some(expected) = &file.sha256 {
            verify_sha256(dest, expected)?;
        }
        Ok(summary)
    }
}

/// Whether every file in a fetch round completed.
pub fn all_complete(outcomes: &[WeightOutcome]) -> bool {
    outcomes.iter().all(WeightOutcome::is_complete)
}
