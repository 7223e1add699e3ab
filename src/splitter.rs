//! Decomposition of enhanced (multi-frame) MR objects into single-frame
//! files.
//!
//! Every output frame starts from a template holding the shared top-level
//! groups of the source. Frame specific attributes are then pulled out of
//! the functional group sequences by a fixed list of [`CopyRule`]s, each
//! one skipped when its source is absent.

use crate::{
    error::{FlowError, Result},
    tag_store::{TagPath, TagStore},
    uid::generate_uid,
};

use dicom::{
    core::{DataElement, PrimitiveValue, Tag, VR, header::Header},
    object::{
        FileDicomObject, FileMetaTableBuilder, InMemDicomObject, mem::InMemElement, open_file,
    },
    pixeldata::{DecodedPixelData, PixelDecoder},
};
use dicom_dictionary_std::{tags, uids};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Top-level groups copied verbatim into every frame: identification,
/// patient, acquisition, relationship and image pixel description.
pub const SHARED_GROUPS: [u16; 5] = [0x0008, 0x0010, 0x0018, 0x0020, 0x0028];

/// Copy of one functional group attribute onto the flat output dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyRule {
    /// Functional group macro sequence holding the attribute.
    pub sequence: Tag,
    pub source: Tag,
    pub destination: Tag,
}

impl CopyRule {
    pub const fn new(sequence: Tag, tag: Tag) -> Self {
        Self {
            sequence,
            source: tag,
            destination: tag,
        }
    }
}

/// Frame attributes in priority order. The first rule that resolves a
/// destination wins; later rules for the same destination are fallbacks.
pub const FRAME_RULES: [CopyRule; 11] = [
    CopyRule::new(tags::PIXEL_VALUE_TRANSFORMATION_SEQUENCE, tags::RESCALE_INTERCEPT),
    CopyRule::new(tags::PIXEL_VALUE_TRANSFORMATION_SEQUENCE, tags::RESCALE_SLOPE),
    CopyRule::new(tags::PIXEL_VALUE_TRANSFORMATION_SEQUENCE, tags::RESCALE_TYPE),
    CopyRule::new(tags::REAL_WORLD_VALUE_MAPPING_SEQUENCE, tags::RESCALE_INTERCEPT),
    CopyRule::new(tags::REAL_WORLD_VALUE_MAPPING_SEQUENCE, tags::RESCALE_SLOPE),
    CopyRule::new(tags::REAL_WORLD_VALUE_MAPPING_SEQUENCE, tags::RESCALE_TYPE),
    CopyRule::new(tags::PIXEL_MEASURES_SEQUENCE, tags::SPACING_BETWEEN_SLICES),
    CopyRule::new(tags::PIXEL_MEASURES_SEQUENCE, tags::PIXEL_SPACING),
    CopyRule::new(tags::PIXEL_MEASURES_SEQUENCE, tags::SLICE_THICKNESS),
    CopyRule::new(
        tags::CARDIAC_SYNCHRONIZATION_SEQUENCE,
        tags::NOMINAL_CARDIAC_TRIGGER_DELAY_TIME,
    ),
    CopyRule::new(tags::PLANE_POSITION_SEQUENCE, tags::IMAGE_POSITION_PATIENT),
];

/// Output of [`split_file`].
#[derive(Debug, Clone)]
pub struct SplitSummary {
    pub axis: String,
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Split `file` into `<root>/<file stem>/imgNNN.dcm`.
///
/// The axis directory is created if needed. A failed frame aborts the
/// split; frames written before it stay on disk.
pub fn split_file(file: &Path, root: &Path) -> Result<SplitSummary> {
    let axis = file
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| FlowError::MalformedMultiframe {
            path: file.to_path_buf(),
            reason: "file name does not name an axis".into(),
        })?
        .to_string();
    let dir = root.join(&axis);

    let source = open_file(file)?;
    let splitter = MultiframeSplitter::new(file, &source)?;
    info!(frames = splitter.frame_count(), axis = %axis, "Detected multiframe image");

    fs::create_dir_all(&dir)?;
    let files = splitter.write_all(&dir)?;
    info!(files = files.len(), "Frames exported to {}", dir.display());

    Ok(SplitSummary { axis, dir, files })
}

pub struct MultiframeSplitter<'a> {
    path: PathBuf,
    source: &'a InMemDicomObject,
    frames: u32,
    template: InMemDicomObject,
    pixels: DecodedPixelData<'a>,
}

impl<'a> MultiframeSplitter<'a> {
    /// Prepare the split of `source`, read from `path`.
    ///
    /// # Errors
    ///
    /// [`FlowError::MalformedMultiframe`] if the frame count is missing or
    /// not positive, or the pixel data holds fewer frames than declared.
    pub fn new(path: &Path, source: &'a FileDicomObject<InMemDicomObject>) -> Result<Self> {
        let malformed = |reason: String| FlowError::MalformedMultiframe {
            path: path.to_path_buf(),
            reason,
        };

        let store = TagStore::new(source);
        let frames = match store.int(tags::NUMBER_OF_FRAMES) {
            Ok(frames) if frames > 0 => frames as u32,
            Ok(frames) => return Err(malformed(format!("declares {frames} frames"))),
            Err(err) => return Err(malformed(err.to_string())),
        };

        let pixels = source.decode_pixel_data()?;
        if pixels.number_of_frames() < frames {
            return Err(malformed(format!(
                "declares {frames} frames but pixel data holds {}",
                pixels.number_of_frames()
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            source,
            frames,
            template: Self::shared_template(source),
            pixels,
        })
    }

    pub fn frame_count(&self) -> u32 {
        self.frames
    }

    /// Standalone single-frame object for frame `index` (0-based).
    pub fn frame(&self, index: u32) -> Result<FileDicomObject<InMemDicomObject>> {
        let mut frame = self.template.clone();
        for tag in apply_frame_rules(self.source, &mut frame, index as usize) {
            info!(
                frame = index,
                tag = %tag,
                "Frame attribute not found in functional groups, omitted"
            );
        }

        let seed = format!("{}:{index}", self.path.display());
        let instance_uid = generate_uid(&seed);
        frame.put(DataElement::new(
            tags::SOP_CLASS_UID,
            VR::UI,
            PrimitiveValue::from(uids::MR_IMAGE_STORAGE),
        ));
        frame.put(DataElement::new(
            tags::SOP_INSTANCE_UID,
            VR::UI,
            PrimitiveValue::from(instance_uid.as_str()),
        ));
        frame.put(DataElement::new(
            tags::INSTANCE_NUMBER,
            VR::IS,
            PrimitiveValue::from((index + 1).to_string()),
        ));
        frame.remove_element(tags::NUMBER_OF_FRAMES);
        frame.put(self.pixel_element(index)?);

        let meta = FileMetaTableBuilder::new()
            .media_storage_sop_class_uid(uids::MR_IMAGE_STORAGE)
            .media_storage_sop_instance_uid(instance_uid.as_str())
            .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN);
        Ok(frame.with_meta(meta)?)
    }

    /// Write every frame to `dir/imgNNN.dcm`, in frame order.
    pub fn write_all(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        (0..self.frames)
            .map(|index| -> Result<PathBuf> {
                let target = dir.join(format!("img{index:03}.dcm"));
                self.frame(index)?.write_to_file(&target)?;
                debug!("Image exported as {}", target.display());
                Ok(target)
            })
            .collect()
    }

    fn shared_template(source: &InMemDicomObject) -> InMemDicomObject {
        InMemDicomObject::from_element_iter(
            source
                .iter()
                .filter(|element| SHARED_GROUPS.contains(&element.tag().group()))
                .cloned(),
        )
    }

    fn pixel_element(&self, index: u32) -> Result<InMemElement> {
        let bytes = self.pixels.frame_data(index)?;
        let element = if self.pixels.bits_allocated() > 8 {
            let words: Vec<u16> = bytemuck::pod_collect_to_vec(bytes);
            DataElement::new(tags::PIXEL_DATA, VR::OW, PrimitiveValue::U16(words.into()))
        } else {
            DataElement::new(
                tags::PIXEL_DATA,
                VR::OB,
                PrimitiveValue::U8(bytes.to_vec().into()),
            )
        };
        Ok(element)
    }
}

/// Apply [`FRAME_RULES`] for frame `index` of `source` onto `frame`,
/// looking in the frame's own functional groups before the shared ones.
///
/// Returns the destinations no rule resolved and `frame` does not already
/// carry.
pub fn apply_frame_rules(
    source: &InMemDicomObject,
    frame: &mut InMemDicomObject,
    index: usize,
) -> Vec<Tag> {
    let store = TagStore::new(source);
    let mut filled: Vec<Tag> = Vec::with_capacity(FRAME_RULES.len());

    for rule in FRAME_RULES {
        if filled.contains(&rule.destination) {
            continue;
        }
        let per_frame = TagPath::Nested {
            outer: tags::PER_FRAME_FUNCTIONAL_GROUPS_SEQUENCE,
            item: index,
            sequence: rule.sequence,
            tag: rule.source,
        };
        let shared = TagPath::Nested {
            outer: tags::SHARED_FUNCTIONAL_GROUPS_SEQUENCE,
            item: 0,
            sequence: rule.sequence,
            tag: rule.source,
        };
        if let Ok(element) = store.lookup(per_frame).or_else(|_| store.lookup(shared)) {
            frame.put(retag(element, rule.destination));
            filled.push(rule.destination);
        }
    }

    let mut omitted = Vec::new();
    for rule in FRAME_RULES {
        let resolved = filled.contains(&rule.destination) || omitted.contains(&rule.destination);
        if !resolved && frame.element(rule.destination).is_err() {
            omitted.push(rule.destination);
        }
    }
    omitted
}

fn retag(element: &InMemElement, tag: Tag) -> InMemElement {
    DataElement::new(tag, element.vr(), element.value().clone())
}
