use crate::{
    config::ComponentMapping,
    enums::{Axis, SortBy},
    error::{FlowError, Result},
    grid::SliceGrid,
    series_parser::SeriesParser,
    slice::{DicomSlice, VoxelSpacing},
};

use ndarray::Array2;
use rayon::prelude::*;

/// One voxel of the velocity field at one trigger time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityRow {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub t: f64,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
}

/// Read-only views of the four parsed series.
#[derive(Debug, Clone, Copy)]
pub struct AxisStacks<'a> {
    pub fh: &'a [DicomSlice],
    pub rl: &'a [DicomSlice],
    pub ap: &'a [DicomSlice],
    pub mask: &'a [DicomSlice],
}

/// Slices of one trigger time, each list in through-plane order.
struct TimestepStacks<'a> {
    fh: Vec<&'a DicomSlice>,
    rl: Vec<&'a DicomSlice>,
    ap: Vec<&'a DicomSlice>,
    mask: Vec<&'a DicomSlice>,
}

impl<'a> TimestepStacks<'a> {
    fn velocity(&self, axis: Axis) -> &[&'a DicomSlice] {
        match axis {
            Axis::FH => &self.fh,
            Axis::RL => &self.rl,
            Axis::AP => &self.ap,
            Axis::Mask => &self.mask,
        }
    }
}

pub struct VolumeTabulator<'a> {
    stacks: AxisStacks<'a>,
    spacing: VoxelSpacing,
    components: ComponentMapping,
}

impl<'a> VolumeTabulator<'a> {
    pub fn new(stacks: AxisStacks<'a>, spacing: VoxelSpacing) -> Self {
        Self::with_components(stacks, spacing, ComponentMapping::default())
    }

    pub fn with_components(
        stacks: AxisStacks<'a>,
        spacing: VoxelSpacing,
        components: ComponentMapping,
    ) -> Self {
        Self {
            stacks,
            spacing,
            components,
        }
    }

    /// Velocity rows of every voxel at trigger time `time`, slice by slice,
    /// each slice bottom row first. Voxels outside the mask keep their
    /// coordinates with zero velocity.
    ///
    /// # Errors
    ///
    /// [`FlowError::ShapeMismatch`] if the stacks do not hold the same
    /// number of slices for `time`, [`FlowError::SliceShapeMismatch`] if
    /// their images differ in size.
    pub fn tabulate(&self, time: f64) -> Result<Vec<VelocityRow>> {
        let timestep = self.select(time);
        let depth = timestep.fh.len();
        if timestep.rl.len() != depth || timestep.ap.len() != depth || timestep.mask.len() != depth
        {
            return Err(FlowError::ShapeMismatch {
                time,
                fh: timestep.fh.len(),
                rl: timestep.rl.len(),
                ap: timestep.ap.len(),
                mask: timestep.mask.len(),
            });
        }
        let Some(first) = timestep.fh.first() else {
            return Ok(Vec::new());
        };
        let grid = SliceGrid::from_dim(first.dim());
        Self::validate_dimensions(&timestep, grid, time)?;

        let [vx, vy, vz] = self.components.axes().map(|axis| timestep.velocity(axis));
        let rows = (0..depth)
            .into_par_iter()
            .flat_map_iter(|z| {
                let mask = &timestep.mask[z].pixels;
                let [vx, vy, vz] = [vx[z], vy[z], vz[z]].map(velocity_values);
                self.slice_rows(grid, z, time, mask, [vx, vy, vz])
            })
            .collect();
        Ok(rows)
    }

    fn slice_rows<'s>(
        &self,
        grid: SliceGrid,
        z: usize,
        t: f64,
        mask: &'s Array2<f64>,
        [vx, vy, vz]: [&'s Array2<f64>; 3],
    ) -> impl Iterator<Item = VelocityRow> + 's {
        let spacing = self.spacing;
        (0..grid.pixel_count()).map(move |k| {
            let (row, col) = grid.position(k);
            let index = grid.source_index(k);
            let tissue = mask[index] != 0.0;
            let value = |values: &Array2<f64>| if tissue { values[index] } else { 0.0 };
            VelocityRow {
                x: col as f64 * spacing.x,
                y: row as f64 * spacing.y,
                z: z as f64 * spacing.z,
                t,
                vx: value(vx),
                vy: value(vy),
                vz: value(vz),
            }
        })
    }

    fn select(&self, time: f64) -> TimestepStacks<'a> {
        let at_time = |slices: &'a [DicomSlice]| {
            let mut selected: Vec<_> = slices
                .iter()
                .filter(|slice| slice.trigger_time() == Some(time))
                .collect();
            SeriesParser::sort_slices(&mut selected, SortBy::SliceLocation);
            selected
        };
        let mut mask: Vec<_> = self.stacks.mask.iter().collect();
        SeriesParser::sort_slices(&mut mask, SortBy::InstanceNumber);

        TimestepStacks {
            fh: at_time(self.stacks.fh),
            rl: at_time(self.stacks.rl),
            ap: at_time(self.stacks.ap),
            mask,
        }
    }

    fn validate_dimensions(timestep: &TimestepStacks<'_>, grid: SliceGrid, time: f64) -> Result<()> {
        let expected = (grid.rows(), grid.cols());
        let stacks = [&timestep.fh, &timestep.rl, &timestep.ap, &timestep.mask];
        for stack in stacks {
            for (index, slice) in stack.iter().enumerate() {
                if slice.dim() != expected {
                    return Err(FlowError::SliceShapeMismatch {
                        time,
                        index,
                        expected,
                        actual: slice.dim(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Selected slices always carry velocity data; the raw pixels are a
/// fallback that keeps the lookup total.
fn velocity_values(slice: &DicomSlice) -> &Array2<f64> {
    slice
        .velocity
        .as_ref()
        .map_or(&slice.pixels, |velocity| &velocity.values)
}
