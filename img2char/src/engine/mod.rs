//! Adapters for the external engines the pipeline drives.
//!
//! Each engine is modeled as a capability trait with a single operation so
//! that any implementation (real subprocess, mock, remote service) can
//! satisfy it. Tests inject mocks; production code uses the subprocess
//! implementations in the submodules:
//!
//! - [`MeshGenerator`] / [`TripoSrEngine`]: single image to textured mesh
//! - [`MeshSimplifier`] / [`ShellSimplifier`]: triangle-count reduction
//! - [`Rigger`] / [`BlenderRigger`]: mesh to rigged character file
//!
//! The adapters never parse mesh data themselves; they only launch the
//! collaborator and check that the promised artifact actually appeared.

mod blender;
mod simplify;
mod triposr;

pub use blender::{find_blender, BlenderRigger};
pub use simplify::ShellSimplifier;
pub use triposr::TripoSrEngine;

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use thiserror::Error;

/// Errors from external engine invocations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine process could not be launched at all.
    #[error("failed to launch {engine}: {source}")]
    Launch {
        engine: String,
        source: std::io::Error,
    },

    /// The engine ran but reported failure.
    #[error("{engine} failed: {reason}")]
    Failed { engine: String, reason: String },

    /// Mesh generation exited successfully but produced no artifact.
    #[error("no mesh artifact found in {}", .dir.display())]
    MeshMissing { dir: PathBuf },

    /// Rigging exited successfully but the output file is absent.
    #[error("rigged file not created: {}", .path.display())]
    RigOutputMissing { path: PathBuf },
}

/// Generates a 3D mesh from a single 2D image.
pub trait MeshGenerator: Send + Sync {
    /// Generate a mesh for `image`, writing artifacts under `output_dir`.
    ///
    /// Returns the path to the produced mesh file.
    fn generate(&self, image: &Path, output_dir: &Path) -> Result<PathBuf, EngineError>;
}

/// Reduces a mesh's triangle count.
pub trait MeshSimplifier: Send + Sync {
    /// Current triangle count of `mesh`.
    fn face_count(&self, mesh: &Path) -> Result<u64, EngineError>;

    /// Simplify `mesh` in place to at most `max_faces` triangles.
    ///
    /// Returns the resulting triangle count.
    fn simplify(&self, mesh: &Path, max_faces: u64) -> Result<u64, EngineError>;
}

/// Attaches a skeletal armature to a mesh.
pub trait Rigger: Send + Sync {
    /// Rig `mesh`, writing the rigged character to exactly `output`.
    fn rig(&self, mesh: &Path, output: &Path) -> Result<PathBuf, EngineError>;
}

/// Human-readable label for a process exit status.
pub(crate) fn exit_label(status: &ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Last non-empty stderr line, for error reporting.
pub(crate) fn stderr_tail(stderr: &[u8]) -> Option<String> {
    String::from_utf8_lossy(stderr)
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}
