//! Pipeline configuration.
//!
//! This module defines `PipelineConfig`, the single validated configuration
//! structure passed into the batch scheduler. All tunables live here; there
//! is no process-wide mutable state.

use std::path::PathBuf;
use std::str::FromStr;

/// Default marching-cubes resolution for mesh generation.
///
/// Higher values produce more detailed meshes at the cost of generation
/// time. 256 is the sweet spot for sprite-sized source images.
pub const DEFAULT_MESH_RESOLUTION: u32 = 256;

/// Default number of parallel workers for the batch scheduler.
pub const DEFAULT_WORKERS: usize = 1;

/// Default compute device hint passed to the mesh engine.
pub const DEFAULT_DEVICE: &str = "cpu";

/// Export format for rigged character files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Autodesk FBX (widest tooling support).
    #[default]
    Fbx,
    /// Binary glTF.
    Glb,
}

impl ExportFormat {
    /// File extension for this format, without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Fbx => "fbx",
            Self::Glb => "glb",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fbx" => Ok(Self::Fbx),
            "glb" => Ok(Self::Glb),
            other => Err(format!("unknown export format '{}' (expected fbx or glb)", other)),
        }
    }
}

/// Configuration for one batch run.
///
/// Construct with [`PipelineConfig::new`] and adjust via the `with_*`
/// builders. The structure is handed to the scheduler at construction;
/// nothing reads it after the run starts.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root of the input images (single file or directory).
    pub input_root: PathBuf,

    /// Root directory for all generated output.
    pub output_root: PathBuf,

    /// Export format for rigged files.
    pub export_format: ExportFormat,

    /// Marching-cubes resolution for the mesh engine.
    pub mesh_resolution: u32,

    /// Bake a texture atlas during mesh generation (slower, better UVs).
    pub bake_texture: bool,

    /// Skip the rigging stage entirely.
    pub skip_rig: bool,

    /// Decimate meshes to at most this many triangles. `None` disables
    /// decimation.
    pub max_faces: Option<u64>,

    /// Only rig items whose input path contains one of these directory
    /// names as a path component. `None` rigs everything.
    pub rig_patterns: Option<Vec<String>>,

    /// Number of parallel workers for per-item processing.
    pub workers: usize,

    /// Explicit path to the rigging engine binary. `None` means
    /// auto-detect.
    pub blender_path: Option<PathBuf>,

    /// Compute device hint for the mesh engine ("cpu", "mps", "cuda:0").
    pub device: String,
}

impl PipelineConfig {
    /// Create a configuration with defaults for everything but the roots.
    pub fn new(input_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            input_root: input_root.into(),
            output_root: output_root.into(),
            export_format: ExportFormat::default(),
            mesh_resolution: DEFAULT_MESH_RESOLUTION,
            bake_texture: false,
            skip_rig: false,
            max_faces: None,
            rig_patterns: None,
            workers: DEFAULT_WORKERS,
            blender_path: None,
            device: DEFAULT_DEVICE.to_string(),
        }
    }

    /// Set the export format.
    pub fn with_export_format(mut self, format: ExportFormat) -> Self {
        self.export_format = format;
        self
    }

    /// Set the marching-cubes resolution.
    pub fn with_mesh_resolution(mut self, resolution: u32) -> Self {
        self.mesh_resolution = resolution;
        self
    }

    /// Enable or disable texture baking.
    pub fn with_bake_texture(mut self, bake: bool) -> Self {
        self.bake_texture = bake;
        self
    }

    /// Enable or disable the rigging stage.
    pub fn with_skip_rig(mut self, skip: bool) -> Self {
        self.skip_rig = skip;
        self
    }

    /// Set the triangle ceiling for decimation.
    pub fn with_max_faces(mut self, max_faces: u64) -> Self {
        self.max_faces = Some(max_faces);
        self
    }

    /// Restrict rigging to paths containing one of these directory names.
    pub fn with_rig_patterns(mut self, patterns: Vec<String>) -> Self {
        self.rig_patterns = Some(patterns);
        self
    }

    /// Set the worker count (minimum 1).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set an explicit rigging engine binary.
    pub fn with_blender_path(mut self, path: PathBuf) -> Self {
        self.blender_path = Some(path);
        self
    }

    /// Set the compute device hint.
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }
}

/// Format a byte count for human display using decimal units.
pub fn format_size(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{:.2} GB", bytes as f64 / 1_000_000_000.0)
    } else if bytes >= 1_000_000 {
        format!("{:.1} MB", bytes as f64 / 1_000_000.0)
    } else if bytes >= 1_000 {
        format!("{:.0} KB", bytes as f64 / 1_000.0)
    } else {
        format!("{} B", bytes)
    }
}
