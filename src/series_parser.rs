use crate::{
    enums::{Axis, SortBy},
    error::{FlowError, Result},
    slice::{DicomSlice, VelocityData},
    tag_store::TagStore,
};

use dicom::{
    core::Tag,
    object::{FileDicomObject, InMemDicomObject, open_file},
    pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder},
};
use dicom_dictionary_std::tags;
use ndarray::{Array2, s};
use rayon::prelude::*;
use std::{
    cmp::Ordering,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Image Type component marking a phase contrast (velocity) image.
const PHASE_CONTRAST: &str = "PHASE CONTRAST";

pub struct SeriesParser;

impl SeriesParser {
    /// Parse every DICOM file of one axis directory.
    ///
    /// Files are decoded in parallel. The returned slices follow file name
    /// order, but callers must not rely on it: through-plane order is
    /// established with [`SeriesParser::sort_slices`].
    ///
    /// # Errors
    ///
    /// Fails on the first file that cannot be read or lacks a required tag;
    /// the whole axis is rejected in that case.
    pub fn parse_directory(axis: Axis, path: impl AsRef<Path>) -> Result<Vec<DicomSlice>> {
        let path = path.as_ref();
        let paths = Self::list_files(path)?;
        if paths.is_empty() {
            return Err(FlowError::EmptySeries {
                axis: axis.to_string(),
                path: path.to_path_buf(),
            });
        }

        let slices = Self::parse_file_paths(axis, &paths)?;
        for slice in slices.iter().filter(|slice| !slice.names_axis()) {
            warn!(
                axis = %axis,
                description = %slice.description,
                "Series description does not name the axis of {}",
                slice.path.display()
            );
        }
        let velocity = slices.iter().filter(|s| s.velocity.is_some()).count();
        info!(
            axis = %axis,
            images = slices.len(),
            velocity,
            "Parsed series from {}",
            path.display()
        );
        Ok(slices)
    }

    pub fn parse_file_paths(
        axis: Axis,
        paths: &[impl AsRef<Path> + Sync],
    ) -> Result<Vec<DicomSlice>> {
        paths
            .par_iter()
            .map(|path| -> Result<DicomSlice> {
                let path = path.as_ref();
                let object = open_file(path)?;
                Self::parse_dicom_object(axis, path, &object)
            })
            .collect()
    }

    /// Regular DICOM candidates in `path`: no extension or `.dcm`, hidden
    /// files skipped, sorted by name.
    pub fn list_files(path: &Path) -> Result<Vec<PathBuf>> {
        let mut paths: Vec<_> = fs::read_dir(path)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                !path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with('.'))
            })
            .filter(|path| match path.extension().and_then(|s| s.to_str()) {
                None => true,
                Some(ext) => ext.eq_ignore_ascii_case("dcm"),
            })
            .collect();
        paths.sort();
        Ok(paths)
    }

    pub fn parse_dicom_object(
        axis: Axis,
        path: &Path,
        dicom_object: &FileDicomObject<InMemDicomObject>,
    ) -> Result<DicomSlice> {
        let store = TagStore::new(dicom_object);
        let required = |tag: Tag| FlowError::RequiredTagMissing {
            axis: axis.to_string(),
            path: path.to_path_buf(),
            tag,
        };

        let description = store
            .string(tags::SERIES_DESCRIPTION)
            .map_err(|err| Self::name_missing(err, &required))?;
        let instance_number = store
            .int(tags::INSTANCE_NUMBER)
            .map_err(|err| Self::name_missing(err, &required))?;
        let spacing = store
            .floats(tags::PIXEL_SPACING)
            .map_err(|err| Self::name_missing(err, &required))?;
        let pixel_spacing = match spacing.as_slice() {
            [first, second, ..] => (*first, *second),
            [single] => (*single, *single),
            [] => return Err(required(tags::PIXEL_SPACING)),
        };
        let pixels = Self::decode_image(dicom_object)?;

        let velocity = if Self::is_phase_contrast(&store) {
            let data = Self::velocity_data(&store, &pixels)
                .map_err(|err| Self::name_missing(err, &required))?;
            Some(data)
        } else {
            None
        };

        debug!(
            file = %path.display(),
            instance = instance_number,
            velocity = velocity.is_some(),
            "Parsed image"
        );

        Ok(DicomSlice {
            axis,
            path: path.to_path_buf(),
            description,
            instance_number,
            pixel_spacing,
            pixels,
            velocity,
        })
    }

    /// Put slices in through-plane order.
    pub fn sort_slices(slices: &mut [&DicomSlice], sort_by: SortBy) {
        match sort_by {
            SortBy::SliceLocation => slices.sort_by(|a, b| {
                let by_location = match (a.slice_location(), b.slice_location()) {
                    (Some(a), Some(b)) => a.total_cmp(&b),
                    _ => Ordering::Equal,
                };
                by_location.then(a.instance_number.cmp(&b.instance_number))
            }),
            SortBy::InstanceNumber => slices.sort_by_key(|slice| slice.instance_number),
        }
    }

    /// Sorted distinct trigger times of the velocity slices in `slices`.
    pub fn trigger_times(slices: &[DicomSlice]) -> Vec<f64> {
        let mut times: Vec<f64> = slices.iter().filter_map(DicomSlice::trigger_time).collect();
        times.sort_by(f64::total_cmp);
        times.dedup();
        times
    }

    fn is_phase_contrast(store: &TagStore<'_>) -> bool {
        match store.strings(tags::IMAGE_TYPE) {
            Ok(values) => values
                .iter()
                .any(|value| value.to_ascii_uppercase().starts_with(PHASE_CONTRAST)),
            Err(err) => {
                debug!("Image type unavailable ({err}), treating image as magnitude");
                false
            }
        }
    }

    fn velocity_data(store: &TagStore<'_>, pixels: &Array2<f64>) -> Result<VelocityData> {
        let slice_location = match store.optional_float(tags::SLICE_LOCATION)? {
            Some(location) => location,
            None => store
                .floats(tags::IMAGE_POSITION_PATIENT)
                .ok()
                .and_then(|position| position.get(2).copied())
                .ok_or(FlowError::TagNotFound {
                    tag: tags::SLICE_LOCATION,
                })?,
        };
        let trigger_time = match store.optional_float(tags::TRIGGER_TIME)? {
            Some(time) => time,
            None => store.float(tags::NOMINAL_CARDIAC_TRIGGER_DELAY_TIME)?,
        };
        let spacing_between_slices = store.optional_float(tags::SPACING_BETWEEN_SLICES)?;
        let rescale_slope = store.optional_float(tags::RESCALE_SLOPE)?.unwrap_or(1.0);
        let rescale_intercept = store.optional_float(tags::RESCALE_INTERCEPT)?.unwrap_or(0.0);

        Ok(VelocityData {
            slice_location,
            trigger_time,
            spacing_between_slices,
            values: pixels.mapv(|raw| raw * rescale_slope + rescale_intercept),
        })
    }

    /// Stored values of the first frame.
    fn decode_image(dicom_object: &FileDicomObject<InMemDicomObject>) -> Result<Array2<f64>> {
        let pixel_data = dicom_object.decode_pixel_data()?;
        let options = ConvertOptions::new().with_modality_lut(ModalityLutOption::None);
        let array = pixel_data.to_ndarray_with_options::<f32>(&options)?;
        Ok(array.slice_move(s![0, .., .., 0]).mapv(f64::from))
    }

    fn name_missing(err: FlowError, required: &impl Fn(Tag) -> FlowError) -> FlowError {
        match err {
            FlowError::TagNotFound { tag } => required(tag),
            other => other,
        }
    }
}
