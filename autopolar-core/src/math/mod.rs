//! Plane geometry used by calibration and alignment
//!
//! Offsets reported by the solver and axis-space corrections share the
//! same [`Vec2`] type. Callers track which space a value lives in.

pub mod fit;
pub mod vec2;

pub use fit::{linear_fit, LineFit, MIN_DIRECTION_LENGTH};
pub use vec2::{sign, Vec2};
