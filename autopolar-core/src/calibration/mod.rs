//! Axis calibration
//!
//! Learns how each axis moves the solver's measurement and, optionally,
//! how much mechanical backlash the axis really has.

pub mod calibrator;

pub use calibrator::{
    AxisProbe, CalibrationRequest, Calibrator, BACKLASH_UNDERESTIMATE, LIMIT_HEADROOM,
    POSITIONING_OVERSHOOT,
};

/// Why an axis calibration failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationFailure {
    /// Probe samples do not define a line
    DegenerateFit,
    /// The probe produced no measurable displacement
    NoDisplacement,
    /// The backlash return move did not move the axis back
    BacklashProbeWrongDirection,
    /// Pre-positioning did not pass the margin within the attempt budget
    PositioningAttemptsExhausted,
}

impl core::fmt::Display for CalibrationFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            CalibrationFailure::DegenerateFit => "probe samples do not define a line",
            CalibrationFailure::NoDisplacement => "axis did not move the measurement",
            CalibrationFailure::BacklashProbeWrongDirection => {
                "backlash probe moved the wrong way"
            }
            CalibrationFailure::PositioningAttemptsExhausted => {
                "could not position axis past its margin"
            }
        })
    }
}
