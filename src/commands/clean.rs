use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use hemoflow::config::DEFAULT_OUTPUT_DIR;
use tracing::info;

#[derive(Args)]
pub struct CleanArgs {
    /// Output directory to remove
    #[arg(default_value = DEFAULT_OUTPUT_DIR)]
    pub path: PathBuf,
}

pub fn run(args: &CleanArgs) -> Result<()> {
    if !args.path.exists() {
        bail!("Output files not exported yet: {} not found", args.path.display());
    }
    fs::remove_dir_all(&args.path)
        .with_context(|| format!("Output directory {} cannot be removed", args.path.display()))?;
    info!("Removed {}", args.path.display());
    Ok(())
}
