//! Per-item and per-stage outcome types.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::engine::EngineError;

/// Tagged outcome of one pipeline stage.
#[derive(Debug)]
pub enum StageResult {
    /// The stage produced an artifact.
    Success { artifact: PathBuf, elapsed: Duration },
    /// The stage failed; no later stage for this item runs.
    Failure {
        stage: &'static str,
        message: String,
    },
}

impl StageResult {
    /// Run a stage closure, timing it and folding its error into a tagged
    /// failure.
    pub(crate) fn capture(
        stage: &'static str,
        f: impl FnOnce() -> Result<PathBuf, EngineError>,
    ) -> Self {
        let started = Instant::now();
        match f() {
            Ok(artifact) => Self::Success {
                artifact,
                elapsed: started.elapsed(),
            },
            Err(e) => Self::Failure {
                stage,
                message: e.to_string(),
            },
        }
    }
}

/// Aggregate result for one work item, in the manifest row shape.
///
/// Path fields and `error` are empty strings when not applicable. The
/// outcome is immutable once the item's stages have completed or
/// short-circuited.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemOutcome {
    /// Item name (image file stem).
    pub name: String,

    /// Source image path.
    #[serde(rename = "image")]
    pub image_path: String,

    /// Generated mesh path, or empty if mesh generation failed.
    #[serde(rename = "mesh")]
    pub mesh_path: String,

    /// Rigged file path, or empty if rigging was skipped or failed.
    #[serde(rename = "rigged")]
    pub rigged_path: String,

    /// Mesh generation time in seconds (0 when the stage did not run).
    pub mesh_time: f64,

    /// Rigging time in seconds (0 when the stage did not run).
    pub rig_time: f64,

    /// First stage failure, or empty on success.
    pub error: String,
}

impl ItemOutcome {
    /// Create an empty outcome for an item about to be processed.
    pub fn new(name: impl Into<String>, image_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image_path: image_path.into(),
            mesh_path: String::new(),
            rigged_path: String::new(),
            mesh_time: 0.0,
            rig_time: 0.0,
            error: String::new(),
        }
    }

    /// Whether every stage that ran for this item succeeded.
    pub fn succeeded(&self) -> bool {
        self.error.is_empty()
    }
}
