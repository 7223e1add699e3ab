//! # hemoflow
//!
//! This crate turns phase contrast MRI series into a volumetric velocity
//! field, one table of voxels per cardiac trigger time.
//!
//! A study consists of three velocity encoded series (foot-head FH,
//! right-left RL and anterior-posterior AP) and a magnitude series used as
//! tissue mask. The crate is built on the dicom-rs ecosystem and works in
//! three stages:
//!  - Multi-frame objects are split into one single-frame file per frame,
//!    carrying the per-frame rescale calibration, pixel measures and
//!    trigger delay ([`splitter`])
//!  - Each axis directory is parsed into slices; phase contrast images
//!    are rescaled to velocities with their own slope and intercept
//!    ([`series_parser`])
//!  - For every trigger time the slices are stacked into a volume and
//!    written as rows of `x,y,z,t,vx,vy,vz`, with velocities outside the
//!    mask set to zero ([`tabulator`], [`exporter`])
//!
//! Trigger times are independent of each other and are exported in
//! parallel using rayon. A failing trigger time does not affect the
//! others, see [`pipeline::build`].
//!
//! The input tree is expected to look like this, file names being free:
//!
//! ```text
//! files/
//!   FH/  img000.dcm img001.dcm ...
//!   RL/  ...
//!   AP/  ...
//!   MK/  ...
//! ```
//!
//! # Examples
//!
//! ## Building the velocity field of a study
//!
//! ```no_run
//! # use hemoflow::config::BuildConfig;
//! let config = BuildConfig::default();
//! let summary = hemoflow::pipeline::build(&config).expect("series should parse");
//! for (time, err) in summary.failures() {
//!     eprintln!("trigger time {time} failed: {err}");
//! }
//! ```
//!
//! ## Splitting a multi-frame acquisition
//!
//! ```no_run
//! # use std::path::Path;
//! let summary = hemoflow::splitter::split_file(Path::new("FH.dcm"), Path::new("files"))
//!     .expect("should have split the file");
//! assert_eq!(summary.axis, "FH");
//! ```

pub mod config;
pub mod enums;
pub mod error;
pub mod exporter;
pub mod grid;
pub mod pipeline;
pub mod series_parser;
pub mod slice;
pub mod splitter;
pub mod tabulator;
pub mod tag_store;
pub mod uid;

pub use config::{BuildConfig, ComponentMapping, ExportOptions};
pub use enums::{Axis, SortBy};
pub use error::{FlowError, Result};
pub use exporter::RowExporter;
pub use series_parser::SeriesParser;
pub use slice::{DicomSlice, VelocityData, VoxelSpacing};
pub use splitter::MultiframeSplitter;
pub use tabulator::{AxisStacks, VelocityRow, VolumeTabulator};
pub use tag_store::{TagPath, TagStore};
