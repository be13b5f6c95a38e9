//! Blender rigging adapter.
//!
//! Rigging runs Blender headless with a rig script. Blender is treated as a
//! singleton heavy resource: the scheduler never invokes it concurrently.

use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use super::{exit_label, stderr_tail, EngineError, Rigger};

/// Blender location inside a macOS app bundle.
const MACOS_APP_BINARY: &str = "/Applications/Blender.app/Contents/MacOS/Blender";

/// Locate the Blender executable.
///
/// Searches `PATH` first, then the macOS app bundle location. Returns
/// `None` when Blender cannot be found; callers treat that as "rigging
/// unavailable", not an error.
pub fn find_blender() -> Option<PathBuf> {
    if let Some(paths) = env::var_os("PATH") {
        if let Some(found) = search_dirs(env::split_paths(&paths), OsStr::new("blender")) {
            return Some(found);
        }
    }

    let bundled = Path::new(MACOS_APP_BINARY);
    if bundled.is_file() {
        return Some(bundled.to_path_buf());
    }

    None
}

fn search_dirs(dirs: impl Iterator<Item = PathBuf>, name: &OsStr) -> Option<PathBuf> {
    dirs.map(|dir| dir.join(name)).find(|c| c.is_file())
}

/// Rigging via headless Blender.
#[derive(Debug, Clone)]
pub struct BlenderRigger {
    blender_bin: PathBuf,
    rig_script: PathBuf,
}

impl BlenderRigger {
    /// Create a rigger using `blender_bin` and the given rig script.
    pub fn new(blender_bin: impl Into<PathBuf>, rig_script: impl Into<PathBuf>) -> Self {
        Self {
            blender_bin: blender_bin.into(),
            rig_script: rig_script.into(),
        }
    }
}

impl Rigger for BlenderRigger {
    fn rig(&self, mesh: &Path, output: &Path) -> Result<PathBuf, EngineError> {
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).map_err(|e| EngineError::Launch {
                engine: "Blender".to_string(),
                source: e,
            })?;
        }

        debug!(mesh = %mesh.display(), output = %output.display(), "running rig engine");

        let result = Command::new(&self.blender_bin)
            .arg("--background")
            .arg("--python")
            .arg(&self.rig_script)
            .arg("--")
            .arg(mesh)
            .arg(output)
            .output()
            .map_err(|e| EngineError::Launch {
                engine: "Blender".to_string(),
                source: e,
            })?;

        if !result.status.success() {
            let mut reason = exit_label(&result.status);
            if let Some(tail) = stderr_tail(&result.stderr) {
                reason = format!("{}: {}", reason, tail);
            }
            return Err(EngineError::Failed {
                engine: "Blender".to_string(),
                reason,
            });
        }

        // Blender can exit zero without having written anything; absence of
        // the artifact is a failure in its own right.
        if !output.exists() {
            return Err(EngineError::RigOutputMissing {
                path: output.to_path_buf(),
            });
        }

        info!(rigged = %output.display(), "mesh rigged");
        Ok(output.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[cfg(unix)]
    fn write_stub(path: &Path, body: &str) {
        use std::os::unix::fs::PermissionsExt;
        fs::write(path, body).unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_search_dirs_finds_file() {
        let temp = TempDir::new().unwrap();
        let bin = temp.path().join("blender");
        fs::write(&bin, b"#!/bin/sh\n").unwrap();

        let other = temp.path().join("empty");
        fs::create_dir(&other).unwrap();

        let found = search_dirs(
            vec![other, temp.path().to_path_buf()].into_iter(),
            OsStr::new("blender"),
        );
        assert_eq!(found, Some(bin));
    }

    #[test]
    fn test_search_dirs_missing() {
        let temp = TempDir::new().unwrap();
        let found = search_dirs(
            vec![temp.path().to_path_buf()].into_iter(),
            OsStr::new("blender"),
        );
        assert_eq!(found, None);
    }

    #[cfg(unix)]
    #[test]
    fn test_rig_creates_output() {
        let temp = TempDir::new().unwrap();
        // Arg 6 is the output path in the headless invocation
        let blender = temp.path().join("blender");
        write_stub(&blender, "#!/bin/sh\n: > \"$6\"\n");

        let rigger = BlenderRigger::new(&blender, temp.path().join("rig.py"));
        let output = temp.path().join("out/bat_rigged.fbx");
        let rigged = rigger
            .rig(Path::new("/meshes/bat.obj"), &output)
            .unwrap();
        assert_eq!(rigged, output);
        assert!(output.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_rig_nonzero_exit() {
        let temp = TempDir::new().unwrap();
        let blender = temp.path().join("blender");
        write_stub(&blender, "#!/bin/sh\nexit 2\n");

        let rigger = BlenderRigger::new(&blender, temp.path().join("rig.py"));
        let err = rigger
            .rig(Path::new("/meshes/bat.obj"), &temp.path().join("out.fbx"))
            .unwrap_err();
        assert!(err.to_string().contains("exit code 2"));
    }

    #[cfg(unix)]
    #[test]
    fn test_rig_silent_partial_success_detected() {
        let temp = TempDir::new().unwrap();
        // Exits zero without writing the output file
        let blender = temp.path().join("blender");
        write_stub(&blender, "#!/bin/sh\nexit 0\n");

        let rigger = BlenderRigger::new(&blender, temp.path().join("rig.py"));
        let err = rigger
            .rig(Path::new("/meshes/bat.obj"), &temp.path().join("out.fbx"))
            .unwrap_err();
        assert!(matches!(err, EngineError::RigOutputMissing { .. }));
    }
}
