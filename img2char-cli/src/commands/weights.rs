//! The `weights` command: resumable model-weight download.

use std::path::PathBuf;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use img2char::config::format_size;
use img2char::fetch::{ChunkedFetcher, HttpSource, ProgressCallback, WeightSet};

use crate::error::CliError;

/// Arguments for the `weights` command.
#[derive(Debug, Args)]
pub struct WeightsArgs {
    /// Download chunk size in MB
    #[arg(long, default_value_t = 10)]
    pub chunk_size: u64,

    /// Destination directory (default: <engine-dir>/weights)
    #[arg(long)]
    pub dest: Option<PathBuf>,

    /// Directory of the TripoSR checkout
    #[arg(long, default_value = "TripoSR")]
    pub engine_dir: PathBuf,
}

/// Download the TripoSR weight set, resuming any partial files.
pub fn run(args: WeightsArgs) -> Result<(), CliError> {
    let dest_dir = args
        .dest
        .unwrap_or_else(|| args.engine_dir.join("weights"));

    println!("=== TripoSR weight download ===");
    println!("  Destination: {}", dest_dir.display());
    println!("  Chunk size:  {} MB", args.chunk_size);
    println!();

    let source = HttpSource::new()?;
    let fetcher =
        ChunkedFetcher::new(source).with_chunk_size(args.chunk_size * 1024 * 1024);

    let set = WeightSet::triposr();
    let mut incomplete = 0usize;

    for file in &set.files {
        let url = set.url_for(file);
        let dest = dest_dir.join(&file.local_name);

        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("    {msg} {bytes}/{total_bytes} ({bytes_per_sec})")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message(file.local_name.clone());

        let bar_cb = bar.clone();
        let progress: ProgressCallback = Box::new(move |bytes, total| {
            if let Some(total) = total {
                bar_cb.set_length(total);
            }
            bar_cb.set_position(bytes);
        });

        match fetcher.fetch_with_progress(&url, &dest, Some(progress)) {
            Ok(summary) if summary.already_complete => {
                bar.finish_and_clear();
                println!(
                    "    Already downloaded: {} ({})",
                    file.local_name,
                    format_size(summary.total_bytes)
                );
            }
            Ok(summary) => {
                bar.finish_and_clear();
                println!(
                    "    Done: {} ({})",
                    file.local_name,
                    format_size(summary.total_bytes)
                );
            }
            Err(e) => {
                bar.finish_and_clear();
                println!("    Incomplete: {} ({})", file.local_name, e);
                incomplete += 1;
            }
        }
    }

    if incomplete > 0 {
        return Err(CliError::WeightsIncomplete(incomplete));
    }

    println!("\n  All weights downloaded to {}", dest_dir.display());
    Ok(())
}
