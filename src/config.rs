use crate::{
    enums::Axis,
    error::{FlowError, Result},
};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_INPUT_DIR: &str = "files";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_MASK_LABEL: &str = "MK";
pub const DEFAULT_FILE_PREFIX: &str = "data.csv";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Root of the axis tree (`FH/`, `RL/`, `AP/` and the mask directory).
    pub input: PathBuf,
    pub output: PathBuf,
    /// Directory name of the magnitude series used as mask.
    pub mask: String,
    /// Worker pool size; `None` uses the available parallelism.
    pub jobs: Option<usize>,
    pub components: ComponentMapping,
    pub export: ExportOptions,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT_DIR),
            output: PathBuf::from(DEFAULT_OUTPUT_DIR),
            mask: DEFAULT_MASK_LABEL.to_string(),
            jobs: None,
            components: ComponentMapping::default(),
            export: ExportOptions::default(),
        }
    }
}

impl BuildConfig {
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|err| FlowError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Directory holding the series of `axis`.
    pub fn axis_dir(&self, axis: Axis) -> PathBuf {
        match axis {
            Axis::Mask => self.input.join(&self.mask),
            _ => self.input.join(axis.label()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.jobs == Some(0) {
            return Err(FlowError::Config("jobs must be at least 1".into()));
        }
        if self.mask.trim().is_empty() {
            return Err(FlowError::Config("mask label must not be empty".into()));
        }
        self.components.validate()?;
        self.export.validate()
    }
}

/// Which velocity stack feeds each output component.
///
/// The default (vx from AP, vy from FH, vz from RL) is the convention of the
/// acquisition protocol. A transposed mapping still produces plausible
/// numbers, so it is spelled out here rather than implied by argument order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentMapping {
    pub vx: Axis,
    pub vy: Axis,
    pub vz: Axis,
}

impl Default for ComponentMapping {
    fn default() -> Self {
        Self {
            vx: Axis::AP,
            vy: Axis::FH,
            vz: Axis::RL,
        }
    }
}

impl ComponentMapping {
    pub fn axes(&self) -> [Axis; 3] {
        [self.vx, self.vy, self.vz]
    }

    pub fn validate(&self) -> Result<()> {
        let axes = self.axes();
        if axes.iter().any(|axis| !axis.is_velocity()) {
            return Err(FlowError::Config(format!(
                "velocity components must come from FH, RL or AP, got {axes:?}"
            )));
        }
        if axes[0] == axes[1] || axes[0] == axes[2] || axes[1] == axes[2] {
            return Err(FlowError::Config(format!(
                "velocity components must use three distinct axes, got {axes:?}"
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub delimiter: char,
    /// Digits after the decimal point for every numeric field.
    pub precision: usize,
    /// Output files are named `<prefix>.<trigger time>`.
    pub prefix: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            precision: 6,
            prefix: DEFAULT_FILE_PREFIX.to_string(),
        }
    }
}

impl ExportOptions {
    pub fn validate(&self) -> Result<()> {
        if self.delimiter == '.' || self.delimiter == '-' || self.delimiter.is_ascii_digit() {
            return Err(FlowError::Config(format!(
                "delimiter {:?} collides with number formatting",
                self.delimiter
            )));
        }
        if self.prefix.is_empty() {
            return Err(FlowError::Config("file prefix must not be empty".into()));
        }
        Ok(())
    }
}
