//! The `generate` command: run the batch pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use img2char::batch::BatchRunner;
use img2char::config::{ExportFormat, PipelineConfig};
use img2char::discover::discover;
use img2char::engine::{
    find_blender, BlenderRigger, MeshSimplifier, Rigger, ShellSimplifier, TripoSrEngine,
};
use img2char::pipeline::Engines;
use img2char::telemetry::PipelineMetrics;

use crate::error::CliError;

/// Arguments for the `generate` command.
#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Input image or directory of images
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory
    #[arg(short, long)]
    pub output: PathBuf,

    /// Export format for rigged files (fbx or glb)
    #[arg(short, long, default_value = "fbx")]
    pub format: String,

    /// Marching cubes resolution (higher = slower, more detail)
    #[arg(short, long, default_value_t = 256)]
    pub resolution: u32,

    /// Bake a texture atlas (slower but better UV mapping)
    #[arg(long)]
    pub bake_texture: bool,

    /// Skip rigging, output meshes only
    #[arg(long)]
    pub skip_rig: bool,

    /// Decimate meshes to at most this many triangles
    #[arg(long)]
    pub max_faces: Option<u64>,

    /// Comma-separated directory names to rig (others get mesh only)
    #[arg(long)]
    pub rig_dirs: Option<String>,

    /// Parallel workers for per-item processing
    #[arg(short, long, default_value_t = 1)]
    pub workers: usize,

    /// Path to the Blender executable (auto-detected if not set)
    #[arg(long)]
    pub blender: Option<PathBuf>,

    /// Compute device for the mesh engine: cpu, mps, cuda:0
    #[arg(long, default_value = "cpu")]
    pub device: String,

    /// Directory of the TripoSR checkout
    #[arg(long, default_value = "TripoSR")]
    pub engine_dir: PathBuf,

    /// Python interpreter to run the engines with
    #[arg(long, default_value = "python3")]
    pub python: PathBuf,

    /// Mesh simplification helper script (required with --max-faces)
    #[arg(long)]
    pub decimate_script: Option<PathBuf>,

    /// Blender rig script
    #[arg(long, default_value = "scripts/blender_rig.py")]
    pub rig_script: PathBuf,
}

/// Run a batch over the configured inputs.
pub fn run(args: GenerateArgs) -> Result<(), CliError> {
    let format: ExportFormat = args.format.parse().map_err(CliError::InvalidArgument)?;

    let mut config = PipelineConfig::new(&args.input, &args.output)
        .with_export_format(format)
        .with_mesh_resolution(args.resolution)
        .with_bake_texture(args.bake_texture)
        .with_skip_rig(args.skip_rig)
        .with_workers(args.workers)
        .with_device(args.device.clone());
    if let Some(max_faces) = args.max_faces {
        config = config.with_max_faces(max_faces);
    }
    if let Some(dirs) = &args.rig_dirs {
        config = config.with_rig_patterns(parse_rig_dirs(dirs));
    }
    if let Some(blender) = &args.blender {
        config = config.with_blender_path(blender.clone());
    }

    // Preconditions fail the run before any processing starts
    let mesh_engine = TripoSrEngine::from_config(&config, &args.engine_dir, &args.python);
    mesh_engine.check_available()?;

    let simplifier = match (config.max_faces, &args.decimate_script) {
        (Some(_), Some(script)) => Some(Arc::new(ShellSimplifier::new(&args.python, script))),
        (Some(_), None) => {
            return Err(CliError::InvalidArgument(
                "--max-faces requires --decimate-script".to_string(),
            ));
        }
        (None, _) => None,
    };

    let items = discover(&args.input, &args.output)?;

    let blender_bin = config
        .blender_path
        .clone()
        .or_else(find_blender);
    if !config.skip_rig && blender_bin.is_none() {
        println!("WARNING: Blender not found. Will generate meshes only.");
        println!("Install Blender or pass --blender /path/to/blender");
    }

    let engines = Engines {
        mesh: Arc::new(mesh_engine),
        simplifier: simplifier.map(|s| s as Arc<dyn MeshSimplifier>),
        rigger: blender_bin
            .as_ref()
            .map(|bin| Arc::new(BlenderRigger::new(bin, &args.rig_script)) as Arc<dyn Rigger>),
    };

    println!("=== img2char pipeline ===");
    println!("  Images:     {}", items.len());
    println!("  Output:     {}", args.output.display());
    println!("  Format:     {}", config.export_format);
    println!("  Resolution: {}", config.mesh_resolution);
    println!(
        "  Max faces:  {}",
        config
            .max_faces
            .map(|m| m.to_string())
            .unwrap_or_else(|| "unlimited".to_string())
    );
    println!("  Device:     {}", config.device);
    println!(
        "  Blender:    {}",
        blender_bin
            .as_ref()
            .map(|b| b.display().to_string())
            .unwrap_or_else(|| "not found".to_string())
    );
    println!(
        "  Rig dirs:   {}",
        config
            .rig_patterns
            .as_ref()
            .map(|p| p.join(","))
            .unwrap_or_else(|| "all (no filter)".to_string())
    );
    println!("  Workers:    {}", config.workers);
    println!();

    let metrics = Arc::new(PipelineMetrics::new());
    let report = BatchRunner::new(config.workers).run(
        &items,
        &config,
        &engines,
        Some(Arc::clone(&metrics)),
    );

    println!();
    println!("=== Results ({:.1}s total) ===", report.total_time);
    for c in &report.characters {
        let status = if c.succeeded() {
            "OK".to_string()
        } else {
            format!("FAIL: {}", c.error)
        };
        let rigged = if c.rigged_path.is_empty() {
            String::new()
        } else {
            format!(" | rigged: {}", c.rigged_path)
        };
        println!(
            "  {}: {} (mesh: {:.1}s, rig: {:.1}s){}",
            c.name, status, c.mesh_time, c.rig_time, rigged
        );
    }
    let telemetry = metrics.snapshot();
    println!(
        "\n  {}/{} succeeded ({} failed)",
        telemetry.items_completed, telemetry.items_started, telemetry.items_failed
    );

    let manifest_path = report.write_manifest(&args.output)?;
    println!("\n  Manifest: {}", manifest_path.display());

    Ok(())
}

/// Split a comma-separated `--rig-dirs` value into patterns.
fn parse_rig_dirs(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
