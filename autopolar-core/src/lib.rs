//! Hardware-agnostic core logic for automatic polar alignment
//!
//! This crate contains all alignment logic that does not depend on a
//! specific mount or plate solver:
//!
//! - 2D vector math and total-least-squares line fitting
//! - Per-axis position, limit and backlash model
//! - Axis calibration (direction and scale in solver space)
//! - The alignment control loop and its state machine
//! - Capability traits (mount, solver, timebase, observer)
//! - Configuration type definitions

#![deny(unsafe_code)]

pub mod align;
pub mod calibration;
pub mod config;
pub mod math;
pub mod motion;
pub mod state;
pub mod traits;

pub use align::{AlignError, AlignOutcome, Aligner, Phase};
pub use calibration::{CalibrationFailure, Calibrator};
pub use config::{AxisSettings, ConfigError, Settings};
pub use math::Vec2;
pub use motion::{Axis, AxisId};
