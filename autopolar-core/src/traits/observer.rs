//! Run observer
//!
//! The alignment logic performs no I/O of its own. Progress and
//! diagnostics are reported as [`AlignEvent`] values at fixed points of
//! the run; implementations decide how to present or record them.

use crate::align::AlignOutcome;
use crate::math::Vec2;
use crate::motion::AxisId;
use crate::state::State;

/// Diagnostic events emitted during a run
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlignEvent {
    /// The run moved to a new state
    StateChanged { from: State, to: State },

    /// One non-blocking solver poll during the wait phase
    SolverPolled { success: bool, consecutive: u32 },

    /// Calibration of an axis is starting
    CalibrationStarted {
        axis: AxisId,
        reverse: bool,
        margin: f64,
    },
    /// Direction and scale learned for an axis
    AxisCalibrated {
        axis: AxisId,
        direction: Vec2,
        magnitude: f64,
    },
    /// True backlash measured during calibration
    BacklashCalibrated { axis: AxisId, backlash: f64 },
    /// Axis pre-positioned past its margin
    Positioned {
        axis: AxisId,
        axis_offset: f64,
        attempts: u32,
    },

    /// A move was sent to the mount
    AxisMoved {
        axis: AxisId,
        /// Net progress asked for
        requested: f64,
        /// Amount sent to the mount after compensation and limit clamping
        commanded: f64,
        /// Axis position after the move
        position: f64,
    },

    /// Offset measured at the start of an alignment iteration
    IterationMeasured {
        iteration: u32,
        /// Length of the averaged solver offset
        offset: f64,
        /// Axis-space correction before attenuation
        correction: Vec2,
        aggressiveness: f64,
    },
    /// Backlash compensation reduced after an overshoot
    BacklashAdjusted { axis: AxisId, backlash: f64 },
    /// A small reversing correction was suppressed
    DirectionChangeResisted { axis: AxisId, correction: f64 },
    /// All moves of an alignment iteration have been issued
    IterationComplete { iteration: u32 },

    /// The run ended without an error
    Finished { outcome: AlignOutcome },
}

/// Receiver of [`AlignEvent`]s
pub trait AlignObserver {
    /// Called for every event, in order
    fn on_event(&mut self, event: &AlignEvent);
}

/// Ignore all events
impl AlignObserver for () {
    fn on_event(&mut self, _event: &AlignEvent) {}
}

impl<O: AlignObserver + ?Sized> AlignObserver for &mut O {
    fn on_event(&mut self, event: &AlignEvent) {
        (**self).on_event(event)
    }
}
