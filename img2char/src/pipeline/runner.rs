//! The per-item stage runner.

use std::panic::{self, AssertUnwindSafe};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use super::outcome::{ItemOutcome, StageResult};
use crate::config::PipelineConfig;
use crate::discover::WorkItem;
use crate::engine::{EngineError, MeshGenerator, MeshSimplifier, Rigger};

/// The set of engines a batch runs with.
///
/// `simplifier` is only consulted when a face ceiling is configured;
/// `rigger` is `None` when the rig engine could not be located, which
/// silently skips rigging (not an error).
#[derive(Clone)]
pub struct Engines {
    pub mesh: Arc<dyn MeshGenerator>,
    pub simplifier: Option<Arc<dyn MeshSimplifier>>,
    pub rigger: Option<Arc<dyn Rigger>>,
}

/// Result of the decimation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decimation {
    /// Triangle count before decimation.
    pub original_faces: u64,
    /// Triangle count after decimation (equal to `original_faces` when the
    /// mesh was already under the ceiling).
    pub final_faces: u64,
}

impl Decimation {
    /// Whether the mesh was left untouched.
    pub fn was_noop(&self) -> bool {
        self.original_faces == self.final_faces
    }
}

/// Decimate `mesh` to at most `max_faces` triangles.
///
/// A mesh already at or below the ceiling is not rewritten; the unchanged
/// count is reported instead.
pub fn decimate_to_ceiling(
    simplifier: &dyn MeshSimplifier,
    mesh: &Path,
    max_faces: u64,
) -> Result<Decimation, EngineError> {
    let original_faces = simplifier.face_count(mesh)?;
    if original_faces <= max_faces {
        return Ok(Decimation {
            original_faces,
            final_faces: original_faces,
        });
    }
    let final_faces = simplifier.simplify(mesh, max_faces)?;
    Ok(Decimation {
        original_faces,
        final_faces,
    })
}

/// Whether an item qualifies for rigging under the path-pattern allow-list.
///
/// With no list configured everything qualifies. Otherwise the image path
/// must contain one of the patterns as a directory component (the filename
/// itself does not count).
pub fn should_rig(image_path: &Path, patterns: Option<&[String]>) -> bool {
    let Some(patterns) = patterns else {
        return true;
    };
    let Some(parent) = image_path.parent() else {
        return false;
    };
    parent.components().any(|c| match c {
        Component::Normal(name) => patterns.iter().any(|p| name == p.as_str()),
        _ => false,
    })
}

/// Run the full stage sequence for one item.
///
/// Never panics and never returns an error: every failure, including an
/// unexpected fault inside an engine implementation, ends up in the
/// returned outcome's `error` field.
pub fn run_item(
    item: &WorkItem,
    config: &PipelineConfig,
    engines: &Engines,
    rig_lock: &Mutex<()>,
) -> ItemOutcome {
    let mut outcome = ItemOutcome::new(&item.name, item.image_path.display().to_string());

    let run = panic::catch_unwind(AssertUnwindSafe(|| {
        run_stages(item, config, engines, rig_lock, &mut outcome)
    }));

    if run.is_err() && outcome.error.is_empty() {
        outcome.error = "internal fault during processing".to_string();
        warn!(item = %item.name, "stage panicked; recorded as item failure");
    }

    outcome
}

fn run_stages(
    item: &WorkItem,
    config: &PipelineConfig,
    engines: &Engines,
    rig_lock: &Mutex<()>,
    outcome: &mut ItemOutcome,
) {
    // Stage 1: mesh generation
    let mesh_path = match StageResult::capture("mesh generation", || {
        engines.mesh.generate(&item.image_path, &item.output_dir)
    }) {
        StageResult::Success { artifact, elapsed } => {
            outcome.mesh_time = elapsed.as_secs_f64();
            outcome.mesh_path = artifact.display().to_string();
            info!(item = %item.name, secs = outcome.mesh_time, "mesh generated");
            artifact
        }
        StageResult::Failure { stage, message } => {
            outcome.error = format!("{}: {}", stage, message);
            warn!(item = %item.name, error = %outcome.error, "mesh stage failed");
            return;
        }
    };

    // Stage 2 (optional): decimation
    if let (Some(max_faces), Some(simplifier)) = (config.max_faces, &engines.simplifier) {
        match decimate_to_ceiling(simplifier.as_ref(), &mesh_path, max_faces) {
            Ok(d) if d.was_noop() => {
                info!(item = %item.name, faces = d.original_faces,
                      "already under face ceiling, no decimation needed");
            }
            Ok(d) => {
                info!(item = %item.name, from = d.original_faces, to = d.final_faces,
                      "mesh decimated");
            }
            Err(e) => {
                outcome.error = format!("decimation: {}", e);
                warn!(item = %item.name, error = %outcome.error, "decimation stage failed");
                return;
            }
        }
    }

    // Stage 3 (optional): rigging. Two independent gates plus engine
    // availability; a closed gate is a skip, not a failure.
    if config.skip_rig {
        return;
    }
    let Some(rigger) = &engines.rigger else {
        info!(item = %item.name, "skipping rig (engine not available)");
        return;
    };
    if !should_rig(&item.image_path, config.rig_patterns.as_deref()) {
        info!(item = %item.name, "skipping rig (not in rig patterns)");
        return;
    }

    let rigged_path: PathBuf = item.output_dir.join(format!(
        "{}_rigged.{}",
        item.name,
        config.export_format.extension()
    ));

    // The rig engine is not safe for concurrent invocation; hold the lock
    // for the whole stage.
    let _guard = rig_lock.lock().unwrap_or_else(|e| e.into_inner());
    match StageResult::capture("rigging", || rigger.rig(&mesh_path, &rigged_path)) {
        StageResult::Success { artifact, elapsed } => {
            outcome.rig_time = elapsed.as_secs_f64();
            outcome.rigged_path = artifact.display().to_string();
            info!(item = %item.name, secs = outcome.rig_time, "rigged");
        }
        StageResult::Failure { stage, message } => {
            outcome.error = format!("{}: {}", stage, message);
            warn!(item = %item.name, error = %outcome.error, "rig stage failed");
        }
    }
}
