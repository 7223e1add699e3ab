use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use hemoflow::config::BuildConfig;
use hemoflow::pipeline;

#[derive(Args)]
pub struct BuildArgs {
    /// Root of the axis directory tree
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Directory receiving one file per trigger time
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Name of the mask series directory
    #[arg(long)]
    pub mask: Option<String>,

    /// Number of worker threads (default: available parallelism)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Build config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run(args: &BuildArgs) -> Result<()> {
    let config = resolve_config(args)?;
    let summary = pipeline::build(&config).context("Build failed")?;

    let failed: Vec<_> = summary.failures().collect();
    if !failed.is_empty() {
        for (time, err) in &failed {
            eprintln!("Trigger time {time}: {err}");
        }
        bail!(
            "{} of {} trigger times failed",
            failed.len(),
            summary.outcomes.len()
        );
    }

    println!(
        "Exported {} trigger times to {}",
        summary.succeeded(),
        config.output.display()
    );
    Ok(())
}

fn resolve_config(args: &BuildArgs) -> Result<BuildConfig> {
    let mut config = match &args.config {
        Some(path) => BuildConfig::load(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => BuildConfig::default(),
    };
    if let Some(input) = &args.input {
        config.input = input.clone();
    }
    if let Some(output) = &args.output {
        config.output = output.clone();
    }
    if let Some(mask) = &args.mask {
        config.mask = mask.clone();
    }
    if args.jobs.is_some() {
        config.jobs = args.jobs;
    }
    config.validate().context("Invalid build options")?;
    Ok(config)
}
