use serde::{Deserialize, Serialize};
use std::fmt;

/// Acquisition an image series belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Foot-head velocity encoding.
    FH,
    /// Right-left velocity encoding.
    RL,
    /// Anterior-posterior velocity encoding.
    AP,
    /// Magnitude series used as tissue mask.
    #[serde(alias = "MK", alias = "mask")]
    Mask,
}

impl Axis {
    pub const VELOCITY: [Axis; 3] = [Axis::FH, Axis::RL, Axis::AP];

    /// Directory name used for the series in the input tree. The mask
    /// directory name is configurable, see [`crate::config::BuildConfig`].
    pub fn label(&self) -> &'static str {
        match self {
            Axis::FH => "FH",
            Axis::RL => "RL",
            Axis::AP => "AP",
            Axis::Mask => "MK",
        }
    }

    pub fn is_velocity(&self) -> bool {
        !matches!(self, Axis::Mask)
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How slices of one stack are put in through-plane order.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    /// Slice location, ties broken by instance number.
    #[default]
    SliceLocation,
    InstanceNumber,
}
