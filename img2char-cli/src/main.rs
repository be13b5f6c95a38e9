//! img2char CLI - batch 2D image to game-ready 3D character pipeline.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::generate::GenerateArgs;
use commands::weights::WeightsArgs;

#[derive(Debug, Parser)]
#[command(
    name = "img2char",
    version,
    about = "Batch 2D image to game-ready 3D character pipeline"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the mesh/decimate/rig pipeline over a set of images
    Generate(GenerateArgs),
    /// Download the mesh-engine model weights (resumable)
    Weights(WeightsArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Generate(args) => commands::generate::run(args),
        Command::Weights(args) => commands::weights::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
