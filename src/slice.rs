use crate::{
    enums::Axis,
    error::{FlowError, Result},
};

use ndarray::Array2;
use std::path::PathBuf;

/// One parsed single-frame image.
#[derive(Debug, Clone)]
pub struct DicomSlice {
    pub axis: Axis,
    pub path: PathBuf,
    /// Series description as stored in the file.
    pub description: String,
    pub instance_number: i32,
    /// Pixel spacing as stored: (first value, second value).
    pub pixel_spacing: (f64, f64),
    /// Stored intensities, modality LUT not applied.
    pub pixels: Array2<f64>,
    /// Present for phase contrast images only.
    pub velocity: Option<VelocityData>,
}

#[derive(Debug, Clone)]
pub struct VelocityData {
    pub slice_location: f64,
    pub trigger_time: f64,
    pub spacing_between_slices: Option<f64>,
    /// `pixels * slope + intercept`, with the image's rescale slope and
    /// intercept.
    pub values: Array2<f64>,
}

impl DicomSlice {
    /// (rows, cols)
    pub fn dim(&self) -> (usize, usize) {
        self.pixels.dim()
    }

    pub fn trigger_time(&self) -> Option<f64> {
        self.velocity.as_ref().map(|v| v.trigger_time)
    }

    pub fn slice_location(&self) -> Option<f64> {
        self.velocity.as_ref().map(|v| v.slice_location)
    }

    /// Whether the series description has the axis label as a word, as in
    /// `PC FH 150`. Mask descriptions are free.
    pub fn names_axis(&self) -> bool {
        !self.axis.is_velocity()
            || self
                .description
                .to_ascii_uppercase()
                .split(|c: char| !c.is_ascii_alphanumeric())
                .any(|word| word == self.axis.label())
    }
}

/// Physical size of one voxel: (in-plane width, in-plane height,
/// through-plane).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelSpacing {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl VoxelSpacing {
    pub fn new(x: f64, y: f64, z: f64) -> Result<Self> {
        let spacing = (x, y, z);
        if [x, y, z].iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(FlowError::InvalidVoxelSpacing {
                spacing,
                reason: "all spacing values must be positive".into(),
            });
        }
        Ok(Self { x, y, z })
    }

    /// Spacing of a volume taken from one reference velocity slice.
    pub fn from_slice(slice: &DicomSlice) -> Result<Self> {
        let (x, y) = slice.pixel_spacing;
        let z = slice
            .velocity
            .as_ref()
            .and_then(|v| v.spacing_between_slices)
            .ok_or_else(|| FlowError::InvalidVoxelSpacing {
                spacing: (x, y, 0.0),
                reason: format!(
                    "spacing between slices missing in {}",
                    slice.path.display()
                ),
            })?;
        Self::new(x, y, z)
    }
}
