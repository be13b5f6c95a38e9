//! Batch report construction and manifest persistence.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::error::{BatchError, BatchResult};
use crate::pipeline::ItemOutcome;

/// Manifest file name under the output root.
pub const MANIFEST_FILENAME: &str = "manifest.json";

/// Aggregate result of one batch run.
///
/// Outcomes arrive in completion order; they are sorted by item name at
/// build time so the persisted manifest is reproducible regardless of
/// scheduling.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Total wall time for the run, in seconds.
    pub total_time: f64,

    /// Per-item outcomes, sorted by name.
    pub characters: Vec<ItemOutcome>,
}

impl BatchReport {
    /// Build a report from collected outcomes.
    pub fn build(mut outcomes: Vec<ItemOutcome>, total_time: Duration) -> Self {
        outcomes.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            total_time: total_time.as_secs_f64(),
            characters: outcomes,
        }
    }

    /// Number of items that completed all their stages.
    pub fn succeeded_count(&self) -> usize {
        self.characters.iter().filter(|c| c.succeeded()).count()
    }

    /// Number of items that recorded a stage failure.
    pub fn failed_count(&self) -> usize {
        self.characters.len() - self.succeeded_count()
    }

    /// Persist the report as `manifest.json` under `output_root`.
    ///
    /// This is the terminal side effect of a run and succeeds even when
    /// every item failed. Returns the manifest path.
    pub fn write_manifest(&self, output_root: &Path) -> BatchResult<PathBuf> {
        fs::create_dir_all(output_root).map_err(|e| BatchError::CreateDirFailed {
            path: output_root.to_path_buf(),
            source: e,
        })?;

        let path = output_root.join(MANIFEST_FILENAME);
        let json = serde_json::to_string_pretty(self).map_err(|e| BatchError::WriteFailed {
            path: path.clone(),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })?;
        fs::write(&path, json).map_err(|e| BatchError::WriteFailed {
            path: path.clone(),
            source: e,
        })?;

        info!(manifest = %path.display(), "manifest written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn outcome(name: &str, error: &str) -> ItemOutcome {
        let mut o = ItemOutcome::new(name, format!("/images/{}.png", name));
        o.error = error.to_string();
        o
    }

    #[test]
    fn test_build_sorts_by_name() {
        let report = BatchReport::build(
            vec![outcome("zombie", ""), outcome("axe", ""), outcome("bat", "")],
            Duration::from_secs(9),
        );
        let names: Vec<_> = report.characters.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["axe", "bat", "zombie"]);
        assert_eq!(report.total_time, 9.0);
    }

    #[test]
    fn test_counts() {
        let report = BatchReport::build(
            vec![
                outcome("a", ""),
                outcome("b", "mesh generation: exit code 1"),
                outcome("c", ""),
            ],
            Duration::from_secs(1),
        );
        assert_eq!(report.succeeded_count(), 2);
        assert_eq!(report.failed_count(), 1);
    }

    #[test]
    fn test_write_manifest_shape() {
        let temp = TempDir::new().unwrap();
        let report = BatchReport::build(
            vec![outcome("bat", "")],
            Duration::from_millis(1500),
        );

        let path = report.write_manifest(temp.path()).unwrap();
        assert_eq!(path, temp.path().join(MANIFEST_FILENAME));

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["total_time"], 1.5);
        let row = &value["characters"][0];
        assert_eq!(row["name"], "bat");
        assert_eq!(row["image"], "/images/bat.png");
        assert_eq!(row["mesh"], "");
        assert_eq!(row["rigged"], "");
        assert_eq!(row["mesh_time"], 0.0);
        assert_eq!(row["rig_time"], 0.0);
        assert_eq!(row["error"], "");
    }

    #[test]
    fn test_write_manifest_creates_output_root() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("deep/output");
        let report = BatchReport::build(Vec::new(), Duration::ZERO);
        assert!(report.write_manifest(&nested).is_ok());
        assert!(nested.join(MANIFEST_FILENAME).exists());
    }
}
