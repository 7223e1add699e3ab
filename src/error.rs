use dicom::core::Tag;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Tag {tag} not found")]
    TagNotFound { tag: Tag },

    #[error("Tag {tag} has an unusable value: {reason}")]
    InvalidTagValue { tag: Tag, reason: String },

    #[error("Malformed multiframe file {}: {reason}", path.display())]
    MalformedMultiframe { path: PathBuf, reason: String },

    #[error("{axis} series: required tag {tag} missing in {}", path.display())]
    RequiredTagMissing {
        axis: String,
        path: PathBuf,
        tag: Tag,
    },

    #[error(
        "Trigger time {time}: slice counts differ (FH {fh}, RL {rl}, AP {ap}, mask {mask})"
    )]
    ShapeMismatch {
        time: f64,
        fh: usize,
        rl: usize,
        ap: usize,
        mask: usize,
    },

    #[error("Trigger time {time}: slice {index} is {actual:?}, expected {expected:?}")]
    SliceShapeMismatch {
        time: f64,
        index: usize,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Trigger time {time}: no rows to export")]
    EmptyRowSet { time: f64 },

    #[error("Invalid voxel spacing {spacing:?}: {reason}")]
    InvalidVoxelSpacing {
        spacing: (f64, f64, f64),
        reason: String,
    },

    #[error("No DICOM files found for {axis} series in {}", path.display())]
    EmptySeries { axis: String, path: PathBuf },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DICOM read error: {0}")]
    DicomRead(#[from] dicom::object::ReadError),

    #[error("DICOM write error: {0}")]
    DicomWrite(#[from] dicom::object::WriteError),

    #[error("DICOM file meta error: {0}")]
    FileMeta(#[from] dicom::object::WithMetaError),

    #[error("Pixel data error: {0}")]
    PixelData(#[from] dicom::pixeldata::Error),
}

impl FlowError {
    /// True for errors caused by the shape of one timestep's input rather
    /// than by I/O or metadata.
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(
            self,
            FlowError::ShapeMismatch { .. } | FlowError::SliceShapeMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;
