use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use dicom::core::{DataElement, PrimitiveValue, VR};
use dicom::object::open_file;
use dicom_dictionary_std::tags;
use hemoflow::SeriesParser;
use hemoflow::TagStore;
use hemoflow::config::DEFAULT_OUTPUT_DIR;
use tracing::{info, warn};

#[derive(Args)]
pub struct PatchArgs {
    /// Directory of single-frame DICOM files
    pub path: PathBuf,

    /// Renumber instances by file name order, starting at 1
    #[arg(long)]
    pub instance: bool,

    /// Directory receiving the patched copies
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,
}

pub fn run(args: &PatchArgs) -> Result<()> {
    if !args.instance {
        warn!("No patch selected, files are copied unchanged");
    }
    let files = SeriesParser::list_files(&args.path)
        .with_context(|| format!("Failed to list {}", args.path.display()))?;
    fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;

    for (idx, file) in files.iter().enumerate() {
        let mut object =
            open_file(file).with_context(|| format!("Failed to open {}", file.display()))?;
        let name = file.display();

        if args.instance {
            let before = TagStore::new(&object)
                .int(tags::INSTANCE_NUMBER)
                .map_or_else(|_| "none".to_string(), |n| n.to_string());
            let after = idx + 1;
            object.put(DataElement::new(
                tags::INSTANCE_NUMBER,
                VR::IS,
                PrimitiveValue::from(after.to_string()),
            ));
            info!("{name}: Changed instance number from {before} to {after}.");
        }

        let target = args.output.join(format!("{idx:02}.dcm"));
        object
            .write_to_file(&target)
            .with_context(|| format!("Failed to write {}", target.display()))?;
    }
    info!(files = files.len(), "Patched series written to {}", args.output.display());
    Ok(())
}
