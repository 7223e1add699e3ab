//! Typed read access to flat and nested DICOM attributes.
//!
//! Multi-frame objects keep most of their per-frame metadata inside
//! functional group sequences, so a lookup can either address a top-level
//! element or an element inside one item of a sequence. [`TagPath`] names
//! both cases and [`TagStore`] resolves them.

use crate::error::{FlowError, Result};

use dicom::{
    core::Tag,
    object::{InMemDicomObject, mem::InMemElement},
};

/// Location of an attribute inside a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagPath {
    Flat(Tag),
    /// `tag` inside the first item of `sequence`, itself inside item `item`
    /// of `outer`.
    Nested {
        outer: Tag,
        item: usize,
        sequence: Tag,
        tag: Tag,
    },
}

pub struct TagStore<'a> {
    object: &'a InMemDicomObject,
}

impl<'a> TagStore<'a> {
    pub fn new(object: &'a InMemDicomObject) -> Self {
        Self { object }
    }

    /// Look up a top-level element.
    pub fn element(&self, tag: Tag) -> Result<&'a InMemElement> {
        self.object
            .element(tag)
            .map_err(|_| FlowError::TagNotFound { tag })
    }

    /// Resolve a flat or nested path.
    pub fn lookup(&self, path: TagPath) -> Result<&'a InMemElement> {
        match path {
            TagPath::Flat(tag) => self.element(tag),
            TagPath::Nested {
                outer,
                item,
                sequence,
                tag,
            } => {
                let outer_item = self.item(outer, item)?;
                let inner_item = TagStore::new(outer_item).item(sequence, 0)?;
                TagStore::new(inner_item).element(tag)
            }
        }
    }

    /// Item `index` of the sequence element `tag`.
    pub fn item(&self, tag: Tag, index: usize) -> Result<&'a InMemDicomObject> {
        self.element(tag)?
            .items()
            .and_then(|items| items.get(index))
            .ok_or(FlowError::TagNotFound { tag })
    }

    pub fn string(&self, tag: Tag) -> Result<String> {
        let element = self.element(tag)?;
        let value = element.to_str().map_err(|err| invalid(tag, err))?;
        Ok(value.trim_end_matches(['\0', ' ']).trim().to_string())
    }

    pub fn strings(&self, tag: Tag) -> Result<Vec<String>> {
        let element = self.element(tag)?;
        let values = element.to_multi_str().map_err(|err| invalid(tag, err))?;
        Ok(values.iter().map(|value| value.trim().to_string()).collect())
    }

    pub fn int(&self, tag: Tag) -> Result<i32> {
        self.element(tag)?
            .to_int::<i32>()
            .map_err(|err| invalid(tag, err))
    }

    pub fn float(&self, tag: Tag) -> Result<f64> {
        self.element(tag)?
            .to_float64()
            .map_err(|err| invalid(tag, err))
    }

    pub fn floats(&self, tag: Tag) -> Result<Vec<f64>> {
        self.element(tag)?
            .to_multi_float64()
            .map_err(|err| invalid(tag, err))
    }

    /// Like [`TagStore::float`], but an absent tag yields `None`.
    pub fn optional_float(&self, tag: Tag) -> Result<Option<f64>> {
        match self.float(tag) {
            Ok(value) => Ok(Some(value)),
            Err(FlowError::TagNotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }
}

fn invalid(tag: Tag, err: impl std::fmt::Display) -> FlowError {
    FlowError::InvalidTagValue {
        tag,
        reason: err.to_string(),
    }
}
