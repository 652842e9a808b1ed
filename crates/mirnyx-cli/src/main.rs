//! mirnyx — miRNA–gene interaction graph builder.
//! Entry point for the mirnyx binary.

mod config;
mod pipeline;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "mirnyx",
    version,
    about = "Builds a weighted miRNA-gene interaction graph from expression and interaction data"
)]
struct Cli {
    /// Path to the config file (defaults to ./mirnyx.toml when present).
    #[arg(short, long, env = "MIRNYX_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline and write the edge table.
    BuildEdges,
    /// Merge per-sample miRNA quantification files into a matrix TSV.
    MergeMirna,
    /// Preprocess raw interaction dumps into canonical tables.
    Preprocess,
    /// Report identifier overlap between interaction tables and expression data.
    CheckOverlap,
}

fn main() {
    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = config::Config::load(cli.config.as_deref()).and_then(|config| match cli.command {
        Command::BuildEdges => pipeline::build_edges(&config).map(|summary| {
            info!(
                "--- PIPELINE FINISHED --- {} candidates, {} resolved, {} kept after scoring, {} edges written",
                summary.candidates,
                summary.resolve_stats.resolved,
                summary.score_stats.kept,
                summary.edges_written
            );
        }),
        Command::MergeMirna => pipeline::merge_mirna(&config),
        Command::Preprocess => pipeline::preprocess(&config),
        Command::CheckOverlap => pipeline::check_overlap(&config),
    });

    if let Err(e) = result {
        tracing::error!("FATAL: {e}");
        std::process::exit(1);
    }
}
