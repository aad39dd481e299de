//! Events that trigger state transitions

use super::machine::FailureKind;

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    // Startup events
    /// Wait for the solver to report consecutive solutions first
    WaitForSolver,
    /// Enough consecutive solutions were observed
    SolverReady,
    /// Start calibrating without waiting for the solver
    StartCalibration,

    // Calibration events
    /// Both axes are calibrated
    CalibrationComplete,

    // Alignment events
    /// Correction fell below the target alignment
    TargetReached,
    /// Iterations ran out but the result is accepted
    Accepted,
    /// Iterations ran out and the result is not acceptable
    NotConverged,

    // Fault events
    /// A fatal error aborted the run
    ErrorDetected(FailureKind),
}
