//! Alignment error taxonomy

use core::fmt;

use crate::calibration::CalibrationFailure;
use crate::config::ConfigError;
use crate::motion::AxisId;
use crate::state::FailureKind;
use crate::traits::{MountError, SolverError};

/// Run phase in which an error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Waiting for consecutive solutions
    Waiting,
    /// Probing an axis
    Calibration,
    /// Moving an axis past its margin
    Positioning,
    /// Iterative correction
    Alignment,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Waiting => "waiting",
            Phase::Calibration => "calibration",
            Phase::Positioning => "positioning",
            Phase::Alignment => "alignment",
        })
    }
}

/// Errors that abort an alignment run
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlignError {
    /// Settings rejected before the run started
    InvalidSettings(ConfigError),
    /// Wait phase ran out of time
    SolverTimeout {
        /// Time spent waiting
        waited_ms: u64,
        /// Consecutive solutions seen when the deadline passed
        consecutive: u32,
    },
    /// An axis could not be calibrated
    CalibrationFailed {
        axis: AxisId,
        reason: CalibrationFailure,
    },
    /// A move was rejected or cut short because the axis sits at its limit
    AxisLimitReached {
        axis: AxisId,
        phase: Phase,
        /// Axis position when the move was refused
        position: f64,
        /// Configured limit
        limit: f64,
    },
    /// The mount failed to execute a move
    Mount { axis: AxisId, error: MountError },
    /// The solver failed hard
    Solver { phase: Phase, error: SolverError },
}

impl AlignError {
    /// State machine failure matching this error
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            AlignError::SolverTimeout { .. } => FailureKind::SolverTimeout,
            AlignError::CalibrationFailed { .. } | AlignError::InvalidSettings(_) => {
                FailureKind::CalibrationFailed
            }
            AlignError::AxisLimitReached { .. } => FailureKind::AxisLimitReached,
            AlignError::Mount { .. } | AlignError::Solver { .. } => FailureKind::HardwareFault,
        }
    }
}

impl From<ConfigError> for AlignError {
    fn from(e: ConfigError) -> Self {
        AlignError::InvalidSettings(e)
    }
}

impl fmt::Display for AlignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignError::InvalidSettings(e) => write!(f, "invalid settings: {e}"),
            AlignError::SolverTimeout {
                waited_ms,
                consecutive,
            } => write!(
                f,
                "solver not ready after {} s ({consecutive} consecutive solutions)",
                *waited_ms as f64 / 1000.0
            ),
            AlignError::CalibrationFailed { axis, reason } => {
                write!(f, "{axis} calibration failed: {reason}")
            }
            AlignError::AxisLimitReached {
                axis,
                phase,
                position,
                limit,
            } => write!(
                f,
                "{axis} limit reached during {phase} (at {position:.1}, limit {limit:.1})"
            ),
            AlignError::Mount { axis, error } => write!(f, "{axis} move failed: {error}"),
            AlignError::Solver { phase, error } => write!(f, "solver failed during {phase}: {error}"),
        }
    }
}

impl std::error::Error for AlignError {}
