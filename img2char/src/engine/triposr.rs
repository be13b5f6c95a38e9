//! TripoSR mesh generation adapter.
//!
//! Launches the TripoSR runner script as an isolated subprocess per image.
//! The runner writes its artifacts under `<output_dir>/0/` (single-image
//! invocations always get index 0); the primary format is OBJ with GLB as
//! the fallback.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use super::{exit_label, stderr_tail, EngineError, MeshGenerator};
use crate::config::PipelineConfig;
use crate::error::{BatchError, BatchResult};

/// Upstream model identifier used when no local weights are present.
pub const UPSTREAM_MODEL_ID: &str = "stabilityai/TripoSR";

/// Name of the runner script inside the engine directory.
const RUNNER_SCRIPT: &str = "run.py";

/// Mesh generation via the TripoSR runner subprocess.
#[derive(Debug, Clone)]
pub struct TripoSrEngine {
    /// Directory containing the TripoSR checkout (`run.py`, `weights/`).
    engine_dir: PathBuf,
    /// Python interpreter to run the engine with.
    python_bin: PathBuf,
    /// Marching-cubes resolution.
    resolution: u32,
    /// Compute device hint ("cpu", "mps", "cuda:0").
    device: String,
    /// Bake a texture atlas (slower, better UV mapping).
    bake_texture: bool,
}

impl TripoSrEngine {
    /// Create an engine with default generation settings.
    pub fn new(engine_dir: impl Into<PathBuf>, python_bin: impl Into<PathBuf>) -> Self {
        Self {
            engine_dir: engine_dir.into(),
            python_bin: python_bin.into(),
            resolution: crate::config::DEFAULT_MESH_RESOLUTION,
            device: crate::config::DEFAULT_DEVICE.to_string(),
            bake_texture: false,
        }
    }

    /// Create an engine taking resolution, device and baking from `config`.
    pub fn from_config(
        config: &PipelineConfig,
        engine_dir: impl Into<PathBuf>,
        python_bin: impl Into<PathBuf>,
    ) -> Self {
        Self::new(engine_dir, python_bin)
            .with_resolution(config.mesh_resolution)
            .with_device(config.device.clone())
            .with_bake_texture(config.bake_texture)
    }

    /// Set the marching-cubes resolution.
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set the compute device hint.
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }

    /// Enable or disable texture baking.
    pub fn with_bake_texture(mut self, bake: bool) -> Self {
        self.bake_texture = bake;
        self
    }

    /// Verify the engine checkout is usable.
    ///
    /// This is a run-level precondition: a missing engine fails the whole
    /// batch before any item is processed.
    pub fn check_available(&self) -> BatchResult<()> {
        let runner = self.engine_dir.join(RUNNER_SCRIPT);
        if runner.is_file() {
            Ok(())
        } else {
            Err(BatchError::EngineUnavailable {
                engine: "TripoSR".to_string(),
                detail: format!("{} not found", runner.display()),
            })
        }
    }

    /// Model weights argument: the local weights directory when it holds a
    /// checkpoint, otherwise the upstream identifier (the engine will
    /// download on first use).
    fn model_path(&self) -> String {
        let weights_dir = self.engine_dir.join("weights");
        if weights_dir.join("model.ckpt").exists() {
            weights_dir.display().to_string()
        } else {
            UPSTREAM_MODEL_ID.to_string()
        }
    }

    /// Locate the generated mesh, trying the primary format then the
    /// fallback.
    fn locate_artifact(output_dir: &Path) -> Result<PathBuf, EngineError> {
        let artifact_dir = output_dir.join("0");
        for name in ["mesh.obj", "mesh.glb"] {
            let candidate = artifact_dir.join(name);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        Err(EngineError::MeshMissing { dir: artifact_dir })
    }
}

impl MeshGenerator for TripoSrEngine {
    fn generate(&self, image: &Path, output_dir: &Path) -> Result<PathBuf, EngineError> {
        let mut cmd = Command::new(&self.python_bin);
        cmd.arg(self.engine_dir.join(RUNNER_SCRIPT))
            .arg(image)
            .arg("--output-dir")
            .arg(output_dir)
            .arg("--mc-resolution")
            .arg(self.resolution.to_string())
            .arg("--device")
            .arg(&self.device)
            .arg("--pretrained-model-name-or-path")
            .arg(self.model_path())
            .current_dir(&self.engine_dir);
        if self.bake_texture {
            cmd.arg("--bake-texture");
        }

        debug!(image = %image.display(), resolution = self.resolution, device = %self.device,
               "running mesh engine");

        let output = cmd.output().map_err(|e| EngineError::Launch {
            engine: "TripoSR".to_string(),
            source: e,
        })?;

        if !output.status.success() {
            let mut reason = exit_label(&output.status);
            if let Some(tail) = stderr_tail(&output.stderr) {
                reason = format!("{}: {}", reason, tail);
            }
            return Err(EngineError::Failed {
                engine: "TripoSR".to_string(),
                reason,
            });
        }

        let mesh = Self::locate_artifact(output_dir)?;
        info!(mesh = %mesh.display(), "mesh generated");
        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[cfg(unix)]
    fn write_stub(path: &Path, body: &str) {
        use std::os::unix::fs::PermissionsExt;
        fs::write(path, body).unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_check_available_missing_runner() {
        let temp = TempDir::new().unwrap();
        let engine = TripoSrEngine::new(temp.path(), "python3");
        assert!(engine.check_available().is_err());
    }

    #[test]
    fn test_check_available_present() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("run.py"), b"# runner").unwrap();
        let engine = TripoSrEngine::new(temp.path(), "python3");
        assert!(engine.check_available().is_ok());
    }

    #[test]
    fn test_model_path_prefers_local_weights() {
        let temp = TempDir::new().unwrap();
        let engine = TripoSrEngine::new(temp.path(), "python3");
        assert_eq!(engine.model_path(), UPSTREAM_MODEL_ID);

        fs::create_dir(temp.path().join("weights")).unwrap();
        fs::write(temp.path().join("weights/model.ckpt"), b"ckpt").unwrap();
        assert_eq!(
            engine.model_path(),
            temp.path().join("weights").display().to_string()
        );
    }

    #[test]
    fn test_locate_artifact_fallback() {
        let temp = TempDir::new().unwrap();
        let artifact_dir = temp.path().join("0");
        fs::create_dir(&artifact_dir).unwrap();

        assert!(TripoSrEngine::locate_artifact(temp.path()).is_err());

        fs::write(artifact_dir.join("mesh.glb"), b"glb").unwrap();
        let found = TripoSrEngine::locate_artifact(temp.path()).unwrap();
        assert_eq!(found, artifact_dir.join("mesh.glb"));

        // Primary format wins when both exist
        fs::write(artifact_dir.join("mesh.obj"), b"obj").unwrap();
        let found = TripoSrEngine::locate_artifact(temp.path()).unwrap();
        assert_eq!(found, artifact_dir.join("mesh.obj"));
    }

    #[cfg(unix)]
    #[test]
    fn test_generate_with_stub_engine() {
        let temp = TempDir::new().unwrap();
        let engine_dir = temp.path().join("engine");
        fs::create_dir(&engine_dir).unwrap();
        fs::write(engine_dir.join("run.py"), b"# runner").unwrap();

        // Stands in for the Python interpreter: $1 is the runner script,
        // $2 the image, $4 the output directory.
        let python = temp.path().join("python");
        write_stub(&python, "#!/bin/sh\nmkdir -p \"$4/0\"\n: > \"$4/0/mesh.obj\"\n");

        let out_dir = temp.path().join("out/hero");
        let engine = TripoSrEngine::new(&engine_dir, &python);
        let mesh = engine
            .generate(Path::new("/images/hero.png"), &out_dir)
            .unwrap();
        assert_eq!(mesh, out_dir.join("0/mesh.obj"));
    }

    #[cfg(unix)]
    #[test]
    fn test_generate_nonzero_exit() {
        let temp = TempDir::new().unwrap();
        let engine_dir = temp.path().join("engine");
        fs::create_dir(&engine_dir).unwrap();

        let python = temp.path().join("python");
        write_stub(&python, "#!/bin/sh\necho 'out of memory' >&2\nexit 3\n");

        let engine = TripoSrEngine::new(&engine_dir, &python);
        let err = engine
            .generate(Path::new("/images/hero.png"), temp.path())
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("exit code 3"), "unexpected error: {}", msg);
        assert!(msg.contains("out of memory"), "unexpected error: {}", msg);
    }

    #[cfg(unix)]
    #[test]
    fn test_generate_missing_artifact() {
        let temp = TempDir::new().unwrap();
        let engine_dir = temp.path().join("engine");
        fs::create_dir(&engine_dir).unwrap();

        // Exits cleanly without producing a mesh
        let python = temp.path().join("python");
        write_stub(&python, "#!/bin/sh\nexit 0\n");

        let engine = TripoSrEngine::new(&engine_dir, &python);
        let err = engine
            .generate(Path::new("/images/hero.png"), temp.path())
            .unwrap_err();
        assert!(matches!(err, EngineError::MeshMissing { .. }));
    }
}
