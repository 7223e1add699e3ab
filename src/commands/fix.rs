use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use hemoflow::config::DEFAULT_INPUT_DIR;
use hemoflow::splitter::split_file;

#[derive(Args)]
pub struct FixArgs {
    /// Multiframe DICOM file; its stem names the axis directory
    pub file: PathBuf,

    /// Root of the axis directory tree
    #[arg(long, default_value = DEFAULT_INPUT_DIR)]
    pub root: PathBuf,
}

pub fn run(args: &FixArgs) -> Result<()> {
    let summary = split_file(&args.file, &args.root)
        .with_context(|| format!("Failed to split {}", args.file.display()))?;
    println!(
        "{}: {} frames written to {}",
        summary.axis,
        summary.files.len(),
        summary.dir.display()
    );
    Ok(())
}
