//! Mesh simplification adapter.
//!
//! Decimation is delegated to an external helper script; the core never
//! reads mesh data itself. The helper contract:
//!
//! - `<python> <script> <mesh> --count` prints the current triangle count
//!   on stdout.
//! - `<python> <script> <mesh> --max-faces <n>` simplifies the mesh in
//!   place and prints `<original> <final>` on stdout.
//!
//! Simplification is permitted to discard per-vertex color and UV
//! fidelity; that is an accepted lossy step, not an error.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::{exit_label, stderr_tail, EngineError, MeshSimplifier};

/// Mesh simplification via an external helper subprocess.
#[derive(Debug, Clone)]
pub struct ShellSimplifier {
    python_bin: PathBuf,
    script: PathBuf,
}

impl ShellSimplifier {
    /// Create a simplifier driving `script` with `python_bin`.
    pub fn new(python_bin: impl Into<PathBuf>, script: impl Into<PathBuf>) -> Self {
        Self {
            python_bin: python_bin.into(),
            script: script.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<String, EngineError> {
        let output = Command::new(&self.python_bin)
            .arg(&self.script)
            .args(args)
            .output()
            .map_err(|e| EngineError::Launch {
                engine: "simplifier".to_string(),
                source: e,
            })?;

        if !output.status.success() {
            let mut reason = exit_label(&output.status);
            if let Some(tail) = stderr_tail(&output.stderr) {
                reason = format!("{}: {}", reason, tail);
            }
            return Err(EngineError::Failed {
                engine: "simplifier".to_string(),
                reason,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn parse_count(text: &str) -> Result<u64, EngineError> {
        text.parse::<u64>().map_err(|_| EngineError::Failed {
            engine: "simplifier".to_string(),
            reason: format!("unexpected output '{}'", text),
        })
    }
}

impl MeshSimplifier for ShellSimplifier {
    fn face_count(&self, mesh: &Path) -> Result<u64, EngineError> {
        let mesh_arg = mesh.display().to_string();
        let out = self.run(&[mesh_arg.as_str(), "--count"])?;
        Self::parse_count(&out)
    }

    fn simplify(&self, mesh: &Path, max_faces: u64) -> Result<u64, EngineError> {
        let mesh_arg = mesh.display().to_string();
        let faces_arg = max_faces.to_string();
        let out = self.run(&[mesh_arg.as_str(), "--max-faces", faces_arg.as_str()])?;
        // Output is "<original> <final>"; only the final count matters here.
        let last = out.split_whitespace().last().unwrap_or(&out);
        Self::parse_count(last)
    }
}
