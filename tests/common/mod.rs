#![allow(dead_code)]

use std::path::Path;

use dicom::core::value::DataSetSequence;
use dicom::core::{DataElement, PrimitiveValue, VR, dicom_value};
use dicom::object::{FileMetaTableBuilder, InMemDicomObject};
use dicom_dictionary_std::{tags, uids};
use hemoflow::uid::generate_uid;

pub const PHASE_CONTRAST_TYPE: [&str; 4] = ["ORIGINAL", "PRIMARY", "PHASE CONTRAST M", "P"];
pub const MAGNITUDE_TYPE: [&str; 4] = ["ORIGINAL", "PRIMARY", "M_FFE", "M"];

/// One single-frame phase contrast image.
#[derive(Debug, Clone)]
pub struct VelocityImage {
    pub instance: i32,
    pub location: f64,
    pub time: f64,
    pub slope: f64,
    pub intercept: f64,
    pub rows: u16,
    pub cols: u16,
    /// Stored values, row-major.
    pub pixels: Vec<u16>,
}

impl VelocityImage {
    pub fn new(instance: i32, location: f64, time: f64, rows: u16, cols: u16) -> Self {
        let pixels = (0..rows as usize * cols as usize)
            .map(|k| 100 + k as u16)
            .collect();
        Self {
            instance,
            location,
            time,
            slope: 1.0,
            intercept: 0.0,
            rows,
            cols,
            pixels,
        }
    }
}

/// One frame of a synthetic enhanced MR object.
#[derive(Debug, Clone)]
pub struct Frame {
    pub slope: Option<f64>,
    pub intercept: Option<f64>,
    pub trigger_delay: Option<f64>,
    /// Per-frame (pixel spacing, spacing between slices), overriding the
    /// shared pixel measures.
    pub pixel_measures: Option<(f64, f64)>,
    pub position_z: f64,
    pub pixels: Vec<u16>,
}

pub fn ds(value: f64) -> PrimitiveValue {
    PrimitiveValue::from(value.to_string())
}

pub fn put_image_pixel_module(object: &mut InMemDicomObject, rows: u16, cols: u16) {
    object.put(DataElement::new(
        tags::SAMPLES_PER_PIXEL,
        VR::US,
        PrimitiveValue::from(1_u16),
    ));
    object.put(DataElement::new(
        tags::PHOTOMETRIC_INTERPRETATION,
        VR::CS,
        PrimitiveValue::from("MONOCHROME2"),
    ));
    object.put(DataElement::new(tags::ROWS, VR::US, PrimitiveValue::from(rows)));
    object.put(DataElement::new(tags::COLUMNS, VR::US, PrimitiveValue::from(cols)));
    object.put(DataElement::new(tags::BITS_ALLOCATED, VR::US, PrimitiveValue::from(16_u16)));
    object.put(DataElement::new(tags::BITS_STORED, VR::US, PrimitiveValue::from(16_u16)));
    object.put(DataElement::new(tags::HIGH_BIT, VR::US, PrimitiveValue::from(15_u16)));
    object.put(DataElement::new(
        tags::PIXEL_REPRESENTATION,
        VR::US,
        PrimitiveValue::from(0_u16),
    ));
}

pub fn put_pixel_data(object: &mut InMemDicomObject, pixels: Vec<u16>) {
    object.put(DataElement::new(
        tags::PIXEL_DATA,
        VR::OW,
        PrimitiveValue::U16(pixels.into()),
    ));
}

pub fn put_image_type(object: &mut InMemDicomObject, image_type: [&str; 4]) {
    object.put(DataElement::new(
        tags::IMAGE_TYPE,
        VR::CS,
        PrimitiveValue::Strs(image_type.iter().map(|s| s.to_string()).collect()),
    ));
}

pub fn write_object(mut object: InMemDicomObject, path: &Path, sop_class: &str) {
    let instance_uid = generate_uid("test");
    object.put(DataElement::new(
        tags::SOP_CLASS_UID,
        VR::UI,
        PrimitiveValue::from(sop_class),
    ));
    object.put(DataElement::new(
        tags::SOP_INSTANCE_UID,
        VR::UI,
        PrimitiveValue::from(instance_uid.as_str()),
    ));
    let meta = FileMetaTableBuilder::new()
        .media_storage_sop_class_uid(sop_class)
        .media_storage_sop_instance_uid(instance_uid.as_str())
        .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN);
    object
        .with_meta(meta)
        .unwrap()
        .write_to_file(path)
        .unwrap();
}

fn series_header(description: &str, instance: i32) -> InMemDicomObject {
    InMemDicomObject::from_element_iter([
        DataElement::new(tags::MODALITY, VR::CS, PrimitiveValue::from("MR")),
        DataElement::new(tags::PATIENT_NAME, VR::PN, PrimitiveValue::from("Doe^John")),
        DataElement::new(
            tags::SERIES_DESCRIPTION,
            VR::LO,
            PrimitiveValue::from(description),
        ),
        DataElement::new(
            tags::INSTANCE_NUMBER,
            VR::IS,
            PrimitiveValue::from(instance.to_string()),
        ),
        DataElement::new(
            tags::PIXEL_SPACING,
            VR::DS,
            dicom_value!(Strs, ["0.5", "0.75"]),
        ),
    ])
}

pub fn velocity_object(axis: &str, image: &VelocityImage) -> InMemDicomObject {
    let mut object = series_header(axis, image.instance);
    put_image_type(&mut object, PHASE_CONTRAST_TYPE);
    object.put(DataElement::new(tags::SPACING_BETWEEN_SLICES, VR::DS, ds(2.0)));
    object.put(DataElement::new(tags::SLICE_LOCATION, VR::DS, ds(image.location)));
    object.put(DataElement::new(tags::TRIGGER_TIME, VR::DS, ds(image.time)));
    object.put(DataElement::new(tags::RESCALE_SLOPE, VR::DS, ds(image.slope)));
    object.put(DataElement::new(tags::RESCALE_INTERCEPT, VR::DS, ds(image.intercept)));
    put_image_pixel_module(&mut object, image.rows, image.cols);
    put_pixel_data(&mut object, image.pixels.clone());
    object
}

pub fn write_velocity(dir: &Path, name: &str, axis: &str, image: &VelocityImage) {
    std::fs::create_dir_all(dir).unwrap();
    write_object(
        velocity_object(axis, image),
        &dir.join(name),
        uids::MR_IMAGE_STORAGE,
    );
}

pub fn write_mask(dir: &Path, name: &str, instance: i32, rows: u16, cols: u16, pixels: Vec<u16>) {
    std::fs::create_dir_all(dir).unwrap();
    let mut object = series_header("MK", instance);
    put_image_type(&mut object, MAGNITUDE_TYPE);
    put_image_pixel_module(&mut object, rows, cols);
    put_pixel_data(&mut object, pixels);
    write_object(object, &dir.join(name), uids::MR_IMAGE_STORAGE);
}

fn sequence(item: InMemDicomObject, tag: dicom::core::Tag) -> DataElement<InMemDicomObject> {
    DataElement::new(tag, VR::SQ, DataSetSequence::from(vec![item]))
}

fn frame_group(frame: &Frame) -> InMemDicomObject {
    let mut group = InMemDicomObject::new_empty();
    if let Some(slope) = frame.slope {
        let mut transform = InMemDicomObject::new_empty();
        transform.put(DataElement::new(tags::RESCALE_SLOPE, VR::DS, ds(slope)));
        transform.put(DataElement::new(
            tags::RESCALE_INTERCEPT,
            VR::DS,
            ds(frame.intercept.unwrap_or(0.0)),
        ));
        transform.put(DataElement::new(
            tags::RESCALE_TYPE,
            VR::LO,
            PrimitiveValue::from("cm/s"),
        ));
        group.put(sequence(transform, tags::PIXEL_VALUE_TRANSFORMATION_SEQUENCE));
    }
    if let Some(delay) = frame.trigger_delay {
        let sync = InMemDicomObject::from_element_iter([DataElement::new(
            tags::NOMINAL_CARDIAC_TRIGGER_DELAY_TIME,
            VR::FD,
            PrimitiveValue::from(delay),
        )]);
        group.put(sequence(sync, tags::CARDIAC_SYNCHRONIZATION_SEQUENCE));
    }
    if let Some((pixel_spacing, slice_spacing)) = frame.pixel_measures {
        let spacing = pixel_spacing.to_string();
        let measures = InMemDicomObject::from_element_iter([
            DataElement::new(
                tags::PIXEL_SPACING,
                VR::DS,
                PrimitiveValue::Strs([spacing.clone(), spacing].into_iter().collect()),
            ),
            DataElement::new(tags::SPACING_BETWEEN_SLICES, VR::DS, ds(slice_spacing)),
        ]);
        group.put(sequence(measures, tags::PIXEL_MEASURES_SEQUENCE));
    }
    let position = InMemDicomObject::from_element_iter([DataElement::new(
        tags::IMAGE_POSITION_PATIENT,
        VR::DS,
        PrimitiveValue::Strs(
            ["0".to_string(), "0".to_string(), frame.position_z.to_string()]
                .into_iter()
                .collect(),
        ),
    )]);
    group.put(sequence(position, tags::PLANE_POSITION_SEQUENCE));
    group
}

/// Enhanced MR object holding `frames`; `declared` overrides Number of
/// Frames, `None` leaves it out.
pub fn multiframe_object(
    description: &str,
    rows: u16,
    cols: u16,
    frames: &[Frame],
    declared: Option<&str>,
) -> InMemDicomObject {
    let mut object = series_header(description, 1);
    put_image_type(&mut object, PHASE_CONTRAST_TYPE);
    object.put(DataElement::new(
        tags::STUDY_INSTANCE_UID,
        VR::UI,
        PrimitiveValue::from("1.2.826.0.1.3680043.2.1125.1"),
    ));
    if let Some(declared) = declared {
        object.put(DataElement::new(
            tags::NUMBER_OF_FRAMES,
            VR::IS,
            PrimitiveValue::from(declared),
        ));
    }
    put_image_pixel_module(&mut object, rows, cols);

    let measures = InMemDicomObject::from_element_iter([
        DataElement::new(
            tags::PIXEL_SPACING,
            VR::DS,
            dicom_value!(Strs, ["1.25", "1.25"]),
        ),
        DataElement::new(tags::SPACING_BETWEEN_SLICES, VR::DS, ds(3.0)),
        DataElement::new(tags::SLICE_THICKNESS, VR::DS, ds(3.0)),
    ]);
    let shared = InMemDicomObject::from_element_iter([sequence(
        measures,
        tags::PIXEL_MEASURES_SEQUENCE,
    )]);
    object.put(sequence(shared, tags::SHARED_FUNCTIONAL_GROUPS_SEQUENCE));
    object.put(DataElement::new(
        tags::PER_FRAME_FUNCTIONAL_GROUPS_SEQUENCE,
        VR::SQ,
        DataSetSequence::from(frames.iter().map(frame_group).collect::<Vec<_>>()),
    ));

    let pixels: Vec<u16> = frames.iter().flat_map(|f| f.pixels.iter().copied()).collect();
    put_pixel_data(&mut object, pixels);
    object
}

pub fn write_multiframe(
    path: &Path,
    description: &str,
    rows: u16,
    cols: u16,
    frames: &[Frame],
    declared: Option<&str>,
) {
    write_object(
        multiframe_object(description, rows, cols, frames, declared),
        path,
        uids::ENHANCED_MR_IMAGE_STORAGE,
    );
}

/// `count` frames of `rows x cols`, frame `i` has slope `i + 1`, trigger
/// delay `40 * i` and pixel values starting at `1000 * i`.
pub fn sample_frames(count: usize, rows: u16, cols: u16) -> Vec<Frame> {
    let len = rows as usize * cols as usize;
    (0..count)
        .map(|i| Frame {
            slope: Some(i as f64 + 1.0),
            intercept: Some(-10.0),
            trigger_delay: Some(40.0 * i as f64),
            pixel_measures: None,
            position_z: 2.0 * i as f64,
            pixels: (0..len).map(|k| (1000 * i + k) as u16).collect(),
        })
        .collect()
}
