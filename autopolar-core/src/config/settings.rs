//! Alignment settings
//!
//! Distances are in axis units (whatever the mount adapter accepts for a
//! move, e.g. adjuster revolutions); offsets are in solver units.

use core::fmt;

use crate::motion::AxisId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum probe steps during calibration
pub const MAX_CALIBRATION_SAMPLES: usize = 32;

/// Per-axis configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AxisSettings {
    /// Initial backlash compensation width
    pub backlash: f64,
    /// Total probe distance used during calibration
    pub calibration_distance: f64,
    /// Maximum absolute position the axis may reach
    pub limit: f64,
    /// Measure the true backlash during calibration and adapt it while aligning
    pub backlash_calibration: bool,
    /// Flip the sign of moves sent to the mount (applied by the mount adapter)
    pub reverse: bool,
}

impl AxisSettings {
    const fn with_backlash(backlash: f64) -> Self {
        Self {
            backlash,
            calibration_distance: 90.0,
            limit: 300.0,
            backlash_calibration: false,
            reverse: false,
        }
    }
}

impl Default for AxisSettings {
    fn default() -> Self {
        Self::with_backlash(0.0)
    }
}

/// Complete alignment configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Settings {
    /// Altitude axis options
    pub altitude: AxisSettings,
    /// Azimuth axis options
    pub azimuth: AxisSettings,
    /// Skip small corrections that would reverse an axis near convergence
    pub resist_direction_change: bool,
    /// Pre-position altitude below the pole during calibration
    pub start_at_low_altitude: bool,
    /// Pre-position azimuth on the far side of the pole during calibration
    pub start_at_opposite_azimuth: bool,
    /// Probe steps per axis calibration (1 = single step, no line fit)
    pub samples_per_calibration: u32,
    /// Solver reads averaged into one measurement
    pub samples_per_measurement: u32,
    /// Upper bound on correction iterations
    pub max_alignment_iterations: u32,
    /// Upper bound on pre-positioning moves per axis
    pub max_positioning_attempts: u32,
    /// Axis-space correction length considered aligned
    pub target_alignment: f64,
    /// Fallback acceptance multiplier on `target_alignment`
    pub acceptance_threshold: f64,
    /// Report success when the iteration budget runs out
    pub accept_best_effort: bool,
    /// Fraction of the correction applied on the first iteration
    pub start_aggressiveness: f64,
    /// Fraction of the correction applied on the last iteration
    pub end_aggressiveness: f64,
    /// Consecutive successful solves required before calibrating (0 = skip)
    pub consecutive_solves: u32,
    /// Solver poll interval while waiting, in seconds
    pub wait_interval_s: f64,
    /// Pause after every move, in seconds
    pub settling_time_s: f64,
    /// Give up waiting for the solver after this many seconds
    pub max_wait_s: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            altitude: AxisSettings::with_backlash(13.0),
            azimuth: AxisSettings::with_backlash(42.0),
            resist_direction_change: false,
            start_at_low_altitude: false,
            start_at_opposite_azimuth: false,
            samples_per_calibration: 1,
            samples_per_measurement: 6,
            max_alignment_iterations: 16,
            max_positioning_attempts: 8,
            target_alignment: 0.2,
            acceptance_threshold: 2.0,
            accept_best_effort: false,
            start_aggressiveness: 0.95,
            end_aggressiveness: 0.25,
            consecutive_solves: 0,
            wait_interval_s: 1.0,
            settling_time_s: 1.0,
            max_wait_s: 120.0,
        }
    }
}

impl Settings {
    /// Options for one axis
    pub fn axis(&self, id: AxisId) -> &AxisSettings {
        match id {
            AxisId::Altitude => &self.altitude,
            AxisId::Azimuth => &self.azimuth,
        }
    }

    /// Fraction of the correction applied on `iteration`
    ///
    /// Interpolates linearly from `start_aggressiveness` on the first
    /// iteration to `end_aggressiveness` on the last.
    pub fn aggressiveness(&self, iteration: u32) -> f64 {
        let n = self.max_alignment_iterations;
        if n > 1 {
            let remaining = n.saturating_sub(1).saturating_sub(iteration) as f64;
            self.end_aggressiveness
                + (self.start_aggressiveness - self.end_aggressiveness) / (n - 1) as f64 * remaining
        } else {
            self.end_aggressiveness
        }
    }

    /// Residual accepted by the post-loop fallback measurement
    pub fn acceptance_bound(&self) -> f64 {
        self.target_alignment * self.acceptance_threshold.max(1.0)
    }

    /// Per-axis radius inside which direction reversals are suppressed
    pub fn resist_radius(&self) -> f64 {
        0.5f64.sqrt() * self.target_alignment
    }

    pub fn wait_interval_ms(&self) -> u32 {
        seconds_to_ms(self.wait_interval_s)
    }

    pub fn settling_time_ms(&self) -> u32 {
        seconds_to_ms(self.settling_time_s)
    }

    pub fn max_wait_ms(&self) -> u64 {
        seconds_to_ms(self.max_wait_s) as u64
    }

    /// Check that the settings describe a runnable alignment
    pub fn validate(&self) -> Result<(), ConfigError> {
        for id in [AxisId::Altitude, AxisId::Azimuth] {
            let axis = self.axis(id);
            if !(axis.calibration_distance.is_finite() && axis.calibration_distance > 0.0) {
                return Err(ConfigError::InvalidCalibrationDistance(id));
            }
            if !(axis.limit >= 0.0) {
                return Err(ConfigError::InvalidLimit(id));
            }
            if !(axis.backlash >= 0.0) || !axis.backlash.is_finite() {
                return Err(ConfigError::InvalidBacklash(id));
            }
        }

        if self.samples_per_measurement == 0 {
            return Err(ConfigError::NoMeasurementSamples);
        }
        if self.samples_per_calibration == 0
            || self.samples_per_calibration as usize > MAX_CALIBRATION_SAMPLES
        {
            return Err(ConfigError::CalibrationSamplesOutOfRange);
        }
        if self.max_alignment_iterations == 0 {
            return Err(ConfigError::NoAlignmentIterations);
        }
        if !(self.target_alignment.is_finite() && self.target_alignment > 0.0) {
            return Err(ConfigError::InvalidTargetAlignment);
        }
        for a in [self.start_aggressiveness, self.end_aggressiveness] {
            if !(a > 0.0 && a <= 1.0) {
                return Err(ConfigError::InvalidAggressiveness);
            }
        }
        for t in [self.wait_interval_s, self.settling_time_s, self.max_wait_s] {
            if !(t.is_finite() && t >= 0.0) {
                return Err(ConfigError::InvalidTiming);
            }
        }

        Ok(())
    }
}

fn seconds_to_ms(seconds: f64) -> u32 {
    (seconds.max(0.0) * 1000.0).round().min(u32::MAX as f64) as u32
}

/// Reasons settings are rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Calibration distance must be finite and positive
    InvalidCalibrationDistance(AxisId),
    /// Limit must be non-negative
    InvalidLimit(AxisId),
    /// Backlash must be finite and non-negative
    InvalidBacklash(AxisId),
    /// At least one solver read per measurement
    NoMeasurementSamples,
    /// Probe steps must be within `1..=MAX_CALIBRATION_SAMPLES`
    CalibrationSamplesOutOfRange,
    /// At least one alignment iteration
    NoAlignmentIterations,
    /// Target alignment must be finite and positive
    InvalidTargetAlignment,
    /// Aggressiveness must lie in `(0, 1]`
    InvalidAggressiveness,
    /// Timing values must be finite and non-negative
    InvalidTiming,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidCalibrationDistance(axis) => {
                write!(f, "{axis} calibration distance must be positive")
            }
            ConfigError::InvalidLimit(axis) => write!(f, "{axis} limit must not be negative"),
            ConfigError::InvalidBacklash(axis) => {
                write!(f, "{axis} backlash must not be negative")
            }
            ConfigError::NoMeasurementSamples => {
                f.write_str("samples per measurement must be at least 1")
            }
            ConfigError::CalibrationSamplesOutOfRange => write!(
                f,
                "samples per calibration must be between 1 and {MAX_CALIBRATION_SAMPLES}"
            ),
            ConfigError::NoAlignmentIterations => {
                f.write_str("max alignment iterations must be at least 1")
            }
            ConfigError::InvalidTargetAlignment => {
                f.write_str("target alignment must be positive")
            }
            ConfigError::InvalidAggressiveness => {
                f.write_str("aggressiveness must be in the range (0, 1]")
            }
            ConfigError::InvalidTiming => f.write_str("timing values must not be negative"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert_eq!(settings.validate(), Ok(()));
        assert_eq!(settings.altitude.backlash, 13.0);
        assert_eq!(settings.azimuth.backlash, 42.0);
        assert_eq!(settings.settling_time_ms(), 1000);
    }

    #[test]
    fn test_aggressiveness_schedule() {
        let settings = Settings {
            max_alignment_iterations: 5,
            start_aggressiveness: 1.0,
            end_aggressiveness: 0.2,
            ..Default::default()
        };

        assert!((settings.aggressiveness(0) - 1.0).abs() < 1e-12);
        assert!((settings.aggressiveness(2) - 0.6).abs() < 1e-12);
        assert!((settings.aggressiveness(4) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_single_iteration_uses_end_aggressiveness() {
        let settings = Settings {
            max_alignment_iterations: 1,
            start_aggressiveness: 0.9,
            end_aggressiveness: 0.3,
            ..Default::default()
        };
        assert_eq!(settings.aggressiveness(0), 0.3);
    }

    #[test]
    fn test_acceptance_bound_never_below_target() {
        let mut settings = Settings {
            target_alignment: 0.5,
            acceptance_threshold: 0.2,
            ..Default::default()
        };
        assert_eq!(settings.acceptance_bound(), 0.5);

        settings.acceptance_threshold = 3.0;
        assert_eq!(settings.acceptance_bound(), 1.5);
    }

    #[test]
    fn test_validation_errors() {
        let bad_samples = Settings {
            samples_per_calibration: MAX_CALIBRATION_SAMPLES as u32 + 1,
            ..Default::default()
        };
        assert_eq!(
            bad_samples.validate(),
            Err(ConfigError::CalibrationSamplesOutOfRange)
        );

        let mut bad_axis = Settings::default();
        bad_axis.azimuth.calibration_distance = 0.0;
        assert_eq!(
            bad_axis.validate(),
            Err(ConfigError::InvalidCalibrationDistance(AxisId::Azimuth))
        );

        let bad_aggr = Settings {
            end_aggressiveness: 1.5,
            ..Default::default()
        };
        assert_eq!(bad_aggr.validate(), Err(ConfigError::InvalidAggressiveness));

        let no_measurement = Settings {
            samples_per_measurement: 0,
            ..Default::default()
        };
        assert_eq!(
            no_measurement.validate(),
            Err(ConfigError::NoMeasurementSamples)
        );
    }
}
