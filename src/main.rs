mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Visualize velocity image series from a phase contrast magnetic resonance
/// imaging study as a three-dimensional vector field.
#[derive(Parser)]
#[command(name = "hemoflow", version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize input directory structure
    Init(commands::init::InitArgs),
    /// Split a multiframe DICOM file into single-frame files
    Fix(commands::fix::FixArgs),
    /// Create volumetric velocity field from DICOM files
    Build(commands::build::BuildArgs),
    /// Check DICOM file metadata
    Check(commands::check::CheckArgs),
    /// Remove exported data
    Clean(commands::clean::CleanArgs),
    /// Patch DICOM series metadata
    Patch(commands::patch::PatchArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Fix(args) => commands::fix::run(args),
        Commands::Build(args) => commands::build::run(args),
        Commands::Check(args) => commands::check::run(args),
        Commands::Clean(args) => commands::clean::run(args),
        Commands::Patch(args) => commands::patch::run(args),
    }
}
