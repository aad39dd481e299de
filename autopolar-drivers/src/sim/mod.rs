//! Simulated mount and plate solver
//!
//! A [`SkyModel`] holds the true pole offset and the mechanics of both
//! adjusters. [`SimulatedMount`] and [`SimulatedSolver`] are handles over
//! the same model, so moves issued through one are seen by the other.
//!
//! ```ignore
//! let sky = RefCell::new(SkyModel::new(&RigConfig::default(), 7));
//! let aligner = Aligner::new(
//!     SimulatedMount::new(&sky),
//!     SimulatedSolver::new(&sky),
//!     VirtualClock::new(),
//!     (),
//!     settings,
//! )?;
//! ```

pub mod rig;
pub mod sky;

pub use rig::{SimulatedMount, SimulatedSolver};
pub use sky::{SimulatedAxis, SkyModel};

use autopolar_core::Vec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Mechanics of one simulated adjuster
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimAxisConfig {
    /// Solver-space displacement per axis unit of net motion
    pub vector: Vec2,
    /// True width of the slack zone
    pub backlash: f64,
    /// Initial position inside the slack zone, within `±backlash / 2`
    pub initial_slack: f64,
}

impl Default for SimAxisConfig {
    fn default() -> Self {
        Self {
            vector: Vec2::new(1.0, 0.0),
            backlash: 0.0,
            initial_slack: 0.0,
        }
    }
}

/// Complete description of a simulated rig
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RigConfig {
    /// True pole offset before any move
    pub initial_offset: Vec2,
    pub altitude: SimAxisConfig,
    pub azimuth: SimAxisConfig,
    /// Width of the uniform noise added to every solution, per component
    pub offset_jitter: f64,
    /// Width of the uniform noise added to every move, in solver units
    pub move_jitter: f64,
    /// Number of solve attempts that fail before the first success
    pub failed_solves: u32,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            initial_offset: Vec2::new(42.0, -87.0),
            altitude: SimAxisConfig {
                vector: Vec2::new(3.0, 3.0),
                backlash: 30.0,
                initial_slack: 15.0,
            },
            azimuth: SimAxisConfig {
                vector: Vec2::new(-2.0, 2.0),
                backlash: 30.0,
                initial_slack: 5.0,
            },
            offset_jitter: 5.0,
            move_jitter: 0.5,
            failed_solves: 0,
        }
    }
}

impl RigConfig {
    /// Noise-free rig with orthogonal axes and no backlash
    pub fn ideal(initial_offset: Vec2) -> Self {
        Self {
            initial_offset,
            altitude: SimAxisConfig {
                vector: Vec2::new(0.0, 2.0),
                ..Default::default()
            },
            azimuth: SimAxisConfig {
                vector: Vec2::new(3.0, 0.0),
                ..Default::default()
            },
            offset_jitter: 0.0,
            move_jitter: 0.0,
            failed_solves: 0,
        }
    }
}
