use std::fmt::Display;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use dicom::object::open_file;
use dicom::pixeldata::PixelDecoder;
use dicom_dictionary_std::tags;
use hemoflow::TagStore;
use tracing::error;

#[derive(Args)]
pub struct CheckArgs {
    /// DICOM file to inspect
    pub path: PathBuf,
}

pub fn run(args: &CheckArgs) -> Result<()> {
    let object = open_file(&args.path)
        .with_context(|| format!("Failed to open {}", args.path.display()))?;
    let store = TagStore::new(&object);

    println!("File:                   {}", args.path.display());
    report("Axis", "Axis tag", store.string(tags::SERIES_DESCRIPTION), "");
    report(
        "Instance number",
        "Instance number",
        store.int(tags::INSTANCE_NUMBER),
        "",
    );

    let shape = object.decode_pixel_data().map(|pixels| {
        format!(
            "({}, {}, {})",
            pixels.number_of_frames(),
            pixels.rows(),
            pixels.columns()
        )
    });
    report("Image shape", "Pixel array", shape, "");

    let spacing = store
        .floats(tags::PIXEL_SPACING)
        .map(|values| format!("{values:?}"));
    report("Pixel spacing", "Pixel spacing", spacing, " mm");
    report(
        "Spacing between slices",
        "Spacing between slices",
        store.float(tags::SPACING_BETWEEN_SLICES),
        " mm",
    );
    report(
        "Slice location",
        "Slice location",
        store.float(tags::SLICE_LOCATION),
        "",
    );
    let trigger_time = store
        .float(tags::TRIGGER_TIME)
        .or_else(|_| store.float(tags::NOMINAL_CARDIAC_TRIGGER_DELAY_TIME));
    report("Trigger time", "Trigger time", trigger_time, " ms");
    Ok(())
}

/// Print a found attribute, log a missing one and carry on.
fn report<T: Display, E>(label: &str, name: &str, value: Result<T, E>, unit: &str) {
    match value {
        Ok(value) => println!("{:<24}{value}{unit}", format!("{label}:")),
        Err(_) => error!("{name} not found."),
    }
}
