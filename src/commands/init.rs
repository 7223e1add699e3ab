use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use hemoflow::Axis;
use hemoflow::config::{DEFAULT_INPUT_DIR, DEFAULT_MASK_LABEL};
use tracing::info;

#[derive(Args)]
pub struct InitArgs {
    /// Root of the axis directory tree
    #[arg(default_value = DEFAULT_INPUT_DIR)]
    pub path: PathBuf,

    /// Name of the mask series directory
    #[arg(long, default_value = DEFAULT_MASK_LABEL)]
    pub mask: String,
}

pub fn run(args: &InitArgs) -> Result<()> {
    if args.path.exists() {
        bail!("Directory already exists in {}", args.path.display());
    }

    let mut labels: Vec<&str> = Axis::VELOCITY.iter().map(|axis| axis.label()).collect();
    labels.push(&args.mask);
    for label in labels {
        let dir = args.path.join(label);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        info!("Created {label} directory in {}", dir.display());
    }
    Ok(())
}
