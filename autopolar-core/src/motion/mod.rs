//! Axis state: position, limit and backlash model
//!
//! One [`Axis`] lives for the whole alignment session for each of the two
//! mount adjusters.

pub mod axis;

pub use axis::{Axis, AxisCalibration, LimitReached};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Axis identifier used to route moves to the mount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AxisId {
    /// Altitude (elevation) adjuster
    Altitude,
    /// Azimuth adjuster
    Azimuth,
}

impl AxisId {
    /// Human readable axis name
    pub const fn name(self) -> &'static str {
        match self {
            AxisId::Altitude => "altitude",
            AxisId::Azimuth => "azimuth",
        }
    }
}

impl core::fmt::Display for AxisId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
