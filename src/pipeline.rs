use crate::{
    config::BuildConfig,
    enums::{Axis, SortBy},
    error::{FlowError, Result},
    exporter::RowExporter,
    series_parser::SeriesParser,
    slice::{DicomSlice, VoxelSpacing},
    tabulator::{AxisStacks, VolumeTabulator},
};

use rayon::prelude::*;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// The four parsed series of one study.
#[derive(Debug, Clone)]
pub struct ParsedSeries {
    pub fh: Vec<DicomSlice>,
    pub rl: Vec<DicomSlice>,
    pub ap: Vec<DicomSlice>,
    pub mask: Vec<DicomSlice>,
}

impl ParsedSeries {
    /// Parse all four axis directories named by `config`, in parallel.
    pub fn load(config: &BuildConfig) -> Result<Self> {
        let axes = [Axis::FH, Axis::RL, Axis::AP, Axis::Mask];
        let mut parsed = axes
            .par_iter()
            .map(|&axis| SeriesParser::parse_directory(axis, config.axis_dir(axis)))
            .collect::<Result<Vec<_>>>()?
            .into_iter();

        let mut next = || parsed.next().unwrap_or_default();
        Ok(Self {
            fh: next(),
            rl: next(),
            ap: next(),
            mask: next(),
        })
    }

    pub fn stacks(&self) -> AxisStacks<'_> {
        AxisStacks {
            fh: &self.fh,
            rl: &self.rl,
            ap: &self.ap,
            mask: &self.mask,
        }
    }

    /// Distinct trigger times of the FH series.
    pub fn trigger_times(&self) -> Vec<f64> {
        SeriesParser::trigger_times(&self.fh)
    }

    /// Voxel spacing of the first FH velocity slice in through-plane order.
    pub fn voxel_spacing(&self) -> Result<VoxelSpacing> {
        let mut velocity: Vec<_> = self.fh.iter().filter(|s| s.velocity.is_some()).collect();
        SeriesParser::sort_slices(&mut velocity, SortBy::SliceLocation);
        let first = velocity.first().ok_or_else(|| FlowError::InvalidVoxelSpacing {
            spacing: (0.0, 0.0, 0.0),
            reason: "FH series holds no velocity images".into(),
        })?;
        VoxelSpacing::from_slice(first)
    }

    /// (rows, cols, slices) of the FH volume.
    pub fn dimensions(&self) -> (usize, usize, usize) {
        let (rows, cols) = self.fh.first().map(DicomSlice::dim).unwrap_or_default();
        let mut locations: Vec<f64> = self.fh.iter().filter_map(DicomSlice::slice_location).collect();
        locations.sort_by(f64::total_cmp);
        locations.dedup();
        (rows, cols, locations.len())
    }
}

/// Result of tabulating and exporting one trigger time.
#[derive(Debug)]
pub struct TimestepOutcome {
    pub time: f64,
    pub result: Result<ExportedTimestep>,
}

#[derive(Debug, Clone)]
pub struct ExportedTimestep {
    pub path: PathBuf,
    pub rows: usize,
}

#[derive(Debug)]
pub struct BuildSummary {
    pub spacing: VoxelSpacing,
    pub dimensions: (usize, usize, usize),
    pub outcomes: Vec<TimestepOutcome>,
}

impl BuildSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (f64, &FlowError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|err| (o.time, err)))
    }

    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }
}

/// Parse the axis tree and export one file per trigger time.
///
/// Parsing and spacing errors abort the build. Errors of a single trigger
/// time are recorded in its [`TimestepOutcome`]; the other trigger times
/// are still exported.
pub fn build(config: &BuildConfig) -> Result<BuildSummary> {
    config.validate()?;
    let series = ParsedSeries::load(config)?;
    info!(
        fh = series.fh.len(),
        rl = series.rl.len(),
        ap = series.ap.len(),
        mask = series.mask.len(),
        "Series parsed"
    );
    build_from_series(config, &series)
}

/// Like [`build`], with the series already in memory.
pub fn build_from_series(config: &BuildConfig, series: &ParsedSeries) -> Result<BuildSummary> {
    let times = series.trigger_times();
    info!("Timeframes: {}", times.len());

    let dimensions = series.dimensions();
    info!(
        "Volume dimensions: ({} px, {} px, {} px)",
        dimensions.0, dimensions.1, dimensions.2
    );

    let spacing = series.voxel_spacing()?;
    info!(
        "Voxel dimensions: ({:.2} mm, {:.2} mm, {:.2} mm)",
        spacing.x, spacing.y, spacing.z
    );

    let tabulator = VolumeTabulator::with_components(series.stacks(), spacing, config.components);
    let exporter = RowExporter::new(&config.output, config.export.clone());

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = config.jobs {
        builder = builder.num_threads(jobs);
    }
    let pool = builder
        .build()
        .map_err(|err| FlowError::Config(format!("cannot start worker pool: {err}")))?;

    let outcomes = pool.install(|| {
        times
            .par_iter()
            .map(|&time| TimestepOutcome {
                time,
                result: export_timestep(&tabulator, &exporter, time),
            })
            .collect::<Vec<_>>()
    });

    for outcome in &outcomes {
        match &outcome.result {
            Err(err) if err.is_shape_mismatch() => {
                warn!(time = outcome.time, "Trigger time skipped: {err}")
            }
            Err(err) => error!(time = outcome.time, "Trigger time failed: {err}"),
            Ok(_) => {}
        }
    }
    let summary = BuildSummary {
        spacing,
        dimensions,
        outcomes,
    };
    if !summary.is_complete() {
        warn!(
            failed = summary.outcomes.len() - summary.succeeded(),
            exported = summary.succeeded(),
            "Build finished with failed trigger times"
        );
    }
    Ok(summary)
}

fn export_timestep(
    tabulator: &VolumeTabulator<'_>,
    exporter: &RowExporter,
    time: f64,
) -> Result<ExportedTimestep> {
    let rows = tabulator.tabulate(time)?;
    let path = exporter.export(time, &rows)?;
    info!("Trigger time {time} exported with {} rows.", rows.len());
    Ok(ExportedTimestep {
        path,
        rows: rows.len(),
    })
}
