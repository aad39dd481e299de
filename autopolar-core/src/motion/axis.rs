//! Per-axis position, limit and backlash model
//!
//! The backlash model tracks where the mechanism sits inside its slack
//! zone. `estimated_backlash` ranges over `±backlash_compensation / 2`:
//! at `+backlash_compensation / 2` the gears are fully loaded for positive
//! moves, at the negative bound for negative moves.

use super::AxisId;
use crate::config::AxisSettings;
use crate::math::{sign, Vec2};

/// Learned mapping from axis motion to solver space
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisCalibration {
    /// Unit direction in solver space of a positive axis move
    pub direction: Vec2,
    /// Axis units per solver unit along `direction`
    pub magnitude: f64,
}

impl AxisCalibration {
    /// Axis-space position of a solver-space offset along this axis
    pub fn axis_offset(&self, offset: Vec2) -> f64 {
        self.direction.dot(offset) * self.magnitude
    }
}

/// A move was rejected because the axis already sits at its limit
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LimitReached {
    /// Position at the time of the rejected move
    pub position: f64,
    /// Configured limit
    pub limit: f64,
}

/// State of one mount axis
#[derive(Debug, Clone)]
pub struct Axis {
    id: AxisId,
    position: f64,
    limit: f64,
    backlash_compensation: f64,
    estimated_backlash: f64,
    calibration_distance: f64,
    calibration: Option<AxisCalibration>,
    last_direction: i8,
}

impl Axis {
    /// Create an axis at position zero with an unloaded backlash state
    pub fn new(id: AxisId, limit: f64, backlash_compensation: f64, calibration_distance: f64) -> Self {
        Self {
            id,
            position: 0.0,
            limit: limit.max(0.0),
            backlash_compensation: backlash_compensation.max(0.0),
            estimated_backlash: 0.0,
            calibration_distance,
            calibration: None,
            last_direction: 0,
        }
    }

    /// Create an axis from its configured settings
    pub fn from_settings(id: AxisId, settings: &AxisSettings) -> Self {
        Self::new(
            id,
            settings.limit,
            settings.backlash,
            settings.calibration_distance,
        )
    }

    pub fn id(&self) -> AxisId {
        self.id
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn limit(&self) -> f64 {
        self.limit
    }

    pub fn calibration_distance(&self) -> f64 {
        self.calibration_distance
    }

    pub fn backlash_compensation(&self) -> f64 {
        self.backlash_compensation
    }

    pub fn estimated_backlash(&self) -> f64 {
        self.estimated_backlash
    }

    /// Sign of the most recent nonzero move (-1, 0 or +1)
    pub fn last_direction(&self) -> i8 {
        self.last_direction
    }

    pub fn calibration(&self) -> Option<AxisCalibration> {
        self.calibration
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_some()
    }

    /// Store the calibration result
    ///
    /// Calibration is write-once: returns false and keeps the existing
    /// value if the axis was already calibrated.
    pub fn set_calibration(&mut self, calibration: AxisCalibration) -> bool {
        if self.calibration.is_some() {
            return false;
        }
        self.calibration = Some(calibration);
        true
    }

    /// Change the backlash width, re-validating the slack state
    pub fn set_backlash_compensation(&mut self, backlash: f64) {
        self.backlash_compensation = backlash.max(0.0);
        self.constrain_estimated_backlash();
    }

    /// Reinitialize position and forget the slack state
    pub fn reset(&mut self, position: f64) {
        self.position = position;
        self.estimated_backlash = 0.0;
        self.last_direction = 0;
    }

    /// Declare the slack fully taken up in the direction of `direction`
    pub fn clear_backlash(&mut self, direction: f64) {
        self.estimated_backlash = sign(direction) * self.backlash_compensation * 0.5;
    }

    /// Physical move needed to achieve `amount` of net progress
    ///
    /// `compensation_percent` in `[0, 1]` scales how much of the estimated
    /// slack is added on top of `amount`.
    pub fn estimate_compensated_move(&self, amount: f64, compensation_percent: f64) -> f64 {
        let direction = sign(amount);
        let half = self.backlash_compensation * 0.5;
        let slack = if direction != sign(self.estimated_backlash) {
            // Reversing across the slack zone
            half + self.estimated_backlash.abs()
        } else {
            half - self.estimated_backlash.abs()
        };

        amount + direction * slack * compensation_percent
    }

    /// Apply a move, enforcing the position limit
    ///
    /// A move that would cross the limit is shortened to end exactly on it.
    /// Returns the amount actually moved, or [`LimitReached`] when the axis
    /// already sits at the limit in the requested direction.
    pub fn apply_move(&mut self, amount: f64) -> Result<f64, LimitReached> {
        if amount == 0.0 {
            return Ok(0.0);
        }

        if (amount > 0.0 && self.position >= self.limit)
            || (amount < 0.0 && self.position <= -self.limit)
        {
            return Err(LimitReached {
                position: self.position,
                limit: self.limit,
            });
        }

        let target = self.position + amount;
        let new_position = if amount > 0.0 {
            target.min(self.limit)
        } else {
            target.max(-self.limit)
        };
        let moved = new_position - self.position;

        self.position = new_position;
        self.estimated_backlash += moved;
        self.constrain_estimated_backlash();
        self.last_direction = sign(moved) as i8;

        Ok(moved)
    }

    fn constrain_estimated_backlash(&mut self) {
        let half = self.backlash_compensation * 0.5;
        self.estimated_backlash = self.estimated_backlash.clamp(-half, half);
    }
}
