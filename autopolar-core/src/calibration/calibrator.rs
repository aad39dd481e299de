//! Axis calibration procedure
//!
//! For one axis:
//!
//! 1. Traverse the configured slack zone so the gears are loaded in the
//!    calibration direction.
//! 2. Measure the starting offset.
//! 3. Step the axis over the calibration distance, measuring after each
//!    sub-step.
//! 4. Fit a line through the samples and derive direction and scale.
//! 5. Optionally move back uncompensated to expose the true backlash.
//! 6. Optionally keep moving until the axis sits past a margin on one side
//!    of the pole.

use heapless::Vec;

use super::CalibrationFailure;
use crate::align::{AlignError, Phase};
use crate::config::{Settings, MAX_CALIBRATION_SAMPLES};
use crate::math::{linear_fit, sign, Vec2};
use crate::motion::{Axis, AxisCalibration, LimitReached};
use crate::traits::AlignEvent;

/// Fraction of the measured backlash kept as compensation
pub const BACKLASH_UNDERESTIMATE: f64 = 0.95;

/// Extra distance past the margin aimed for while positioning, as a fraction of the margin
pub const POSITIONING_OVERSHOOT: f64 = 0.1;

/// Fraction of the axis limit a folded positioning move may reach
pub const LIMIT_HEADROOM: f64 = 0.99;

/// Displacements shorter than this (solver units) count as no movement
const MIN_DISPLACEMENT: f64 = 1e-9;

/// Actuation and measurement available to the calibrator
pub trait AxisProbe {
    /// Averaged solver-space offset from the pole
    fn measure(&mut self, phase: Phase) -> Result<Vec2, AlignError>;

    /// Compensated, limit-checked move of `axis`
    ///
    /// Returns the amount actually sent to the mount.
    fn move_axis(
        &mut self,
        axis: &mut Axis,
        amount: f64,
        compensation_percent: f64,
        phase: Phase,
    ) -> Result<f64, AlignError>;

    /// Report progress
    fn emit(&mut self, _event: AlignEvent) {}
}

/// How a single axis should be calibrated
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationRequest {
    /// Measure the true backlash with an uncompensated return move
    pub calibrate_backlash: bool,
    /// Probe in the negative axis direction
    pub reverse: bool,
    /// Signed axis-space offset the axis must pass afterwards (0 = none)
    pub margin: f64,
    /// Solver-space offset marking the side of the pole to leave
    ///
    /// When set, only the magnitude of `margin` is used. Its sign is taken
    /// from the learned direction so the axis ends on the far side.
    pub opposite_of: Option<Vec2>,
}

/// Axis calibration procedure
#[derive(Debug, Clone)]
pub struct Calibrator {
    samples_per_calibration: usize,
    max_positioning_attempts: u32,
}

impl Calibrator {
    /// Create a calibrator from the alignment settings
    pub fn new(settings: &Settings) -> Self {
        Self {
            samples_per_calibration: (settings.samples_per_calibration as usize)
                .clamp(1, MAX_CALIBRATION_SAMPLES),
            max_positioning_attempts: settings.max_positioning_attempts,
        }
    }

    /// Calibrate `axis`, storing the result on it
    ///
    /// On success the axis holds its direction/scale, and its backlash
    /// compensation is replaced by the measured value when requested.
    pub fn calibrate_axis<P: AxisProbe>(
        &self,
        probe: &mut P,
        axis: &mut Axis,
        request: CalibrationRequest,
    ) -> Result<AxisCalibration, AlignError> {
        let id = axis.id();
        let direction_sign = if request.reverse { -1.0 } else { 1.0 };
        let distance = axis.calibration_distance();

        probe.emit(AlignEvent::CalibrationStarted {
            axis: id,
            reverse: request.reverse,
            margin: request.margin,
        });

        // Load the gears in the calibration direction
        let slack = direction_sign * axis.backlash_compensation();
        probe.move_axis(axis, slack, 0.0, Phase::Calibration)?;
        axis.clear_backlash(direction_sign);

        let start = probe.measure(Phase::Calibration)?;

        let steps = self.samples_per_calibration;
        let step = direction_sign * distance / steps as f64;
        let mut samples: Vec<Vec2, MAX_CALIBRATION_SAMPLES> = Vec::new();
        for _ in 0..steps {
            let moved = probe.move_axis(axis, step, 0.0, Phase::Calibration)?;
            if (moved - step).abs() > 1e-9 * step.abs().max(1.0) {
                // Clamped by the limit; the probe distance is no longer known
                return Err(AlignError::AxisLimitReached {
                    axis: id,
                    phase: Phase::Calibration,
                    position: axis.position(),
                    limit: axis.limit(),
                });
            }
            let _ = samples.push(probe.measure(Phase::Calibration)?);
        }

        let (direction, displacement) = if samples.len() > 1 {
            let fit = linear_fit(&samples).ok_or(AlignError::CalibrationFailed {
                axis: id,
                reason: CalibrationFailure::DegenerateFit,
            })?;

            // Later samples carry proportionally more of the total distance
            let mut displacement = Vec2::ZERO;
            for (i, sample) in samples.iter().enumerate() {
                displacement += (fit.project(*sample) - start) / (i + 1) as f64;
            }
            (fit.direction, displacement)
        } else {
            let displacement = samples[0] - start;
            (displacement.normalized(), displacement)
        };

        let length = displacement.length();
        if !(length > MIN_DISPLACEMENT) {
            return Err(AlignError::CalibrationFailed {
                axis: id,
                reason: CalibrationFailure::NoDisplacement,
            });
        }

        let mut direction = direction;
        if direction.dot(displacement) < 0.0 {
            direction = -direction;
        }

        let calibration = AxisCalibration {
            direction: direction * direction_sign,
            magnitude: distance / length,
        };
        axis.set_calibration(calibration);

        probe.emit(AlignEvent::AxisCalibrated {
            axis: id,
            direction: calibration.direction,
            magnitude: calibration.magnitude,
        });

        let margin = match request.opposite_of {
            Some(side) => -sign(calibration.axis_offset(side)) * request.margin.abs(),
            None => request.margin,
        };

        let end = start + displacement;
        let mut axis_offset = calibration.axis_offset(end);

        if request.calibrate_backlash {
            axis_offset = self.calibrate_backlash(
                probe,
                axis,
                &calibration,
                request.reverse,
                margin,
                end,
                axis_offset,
            )?;
        }

        if margin != 0.0 {
            self.position_past_margin(probe, axis, &calibration, margin, axis_offset)?;
        }

        Ok(calibration)
    }

    /// Move back without compensation and compare against the calibrated scale
    ///
    /// Returns the axis-space offset measured after the return move.
    #[allow(clippy::too_many_arguments)]
    fn calibrate_backlash<P: AxisProbe>(
        &self,
        probe: &mut P,
        axis: &mut Axis,
        calibration: &AxisCalibration,
        reverse: bool,
        margin: f64,
        end: Vec2,
        end_offset: f64,
    ) -> Result<f64, AlignError> {
        let id = axis.id();
        let back = if reverse { 1.0 } else { -1.0 };
        let distance = axis.calibration_distance();
        let mut return_move = back * (axis.backlash_compensation() + distance);

        // Fold positioning into the return move when it heads the same way
        if margin != 0.0 && sign(margin) == back {
            let predicted = end_offset + back * distance;
            if !passes_margin(predicted, margin) {
                let extra = (aim(margin) - predicted).abs();
                let target = axis.position() + return_move + back * extra;
                if target.abs() <= LIMIT_HEADROOM * axis.limit() {
                    return_move += back * extra;
                }
            }
        }

        let expected = probe
            .move_axis(axis, return_move, 0.0, Phase::Calibration)?
            .abs();
        let after = probe.measure(Phase::Calibration)?;
        let after_offset = calibration.axis_offset(after);

        let actual = back * calibration.axis_offset(after - end);
        if !(actual > 0.0) {
            return Err(AlignError::CalibrationFailed {
                axis: id,
                reason: CalibrationFailure::BacklashProbeWrongDirection,
            });
        }

        axis.set_backlash_compensation((expected - actual) * BACKLASH_UNDERESTIMATE);
        axis.clear_backlash(back);

        probe.emit(AlignEvent::BacklashCalibrated {
            axis: id,
            backlash: axis.backlash_compensation(),
        });

        Ok(after_offset)
    }

    /// Move the axis until its axis-space offset passes `margin`
    fn position_past_margin<P: AxisProbe>(
        &self,
        probe: &mut P,
        axis: &mut Axis,
        calibration: &AxisCalibration,
        margin: f64,
        mut axis_offset: f64,
    ) -> Result<(), AlignError> {
        let id = axis.id();
        let mut attempts = 0;

        while !passes_margin(axis_offset, margin) {
            if attempts >= self.max_positioning_attempts {
                return Err(AlignError::CalibrationFailed {
                    axis: id,
                    reason: CalibrationFailure::PositioningAttemptsExhausted,
                });
            }
            attempts += 1;

            probe.move_axis(axis, aim(margin) - axis_offset, 1.0, Phase::Positioning)?;
            axis_offset = calibration.axis_offset(probe.measure(Phase::Positioning)?);
        }

        probe.emit(AlignEvent::Positioned {
            axis: id,
            axis_offset,
            attempts,
        });

        Ok(())
    }
}

fn passes_margin(axis_offset: f64, margin: f64) -> bool {
    sign(margin) * (axis_offset - margin) >= 0.0
}

fn aim(margin: f64) -> f64 {
    margin * (1.0 + POSITIONING_OVERSHOOT)
}
