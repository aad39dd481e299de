//! State machine definition

use super::events::Event;

/// Alignment run states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Constructed, nothing commanded yet
    Idle,
    /// Polling the solver for a run of consecutive solutions
    WaitingForSolver,
    /// Learning axis directions, scales and backlash
    Calibrating,
    /// Iterative correction loop
    Aligning,
    /// Correction fell below the target alignment
    Converged,
    /// Iterations ran out; result accepted by best-effort or fallback bound
    BestEffortAccepted,
    /// Run ended unsuccessfully
    Failed(FailureKind),
}

/// Why a run failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FailureKind {
    /// Solver never produced enough consecutive solutions
    SolverTimeout,
    /// An axis could not be calibrated or pre-positioned
    CalibrationFailed,
    /// An axis hit its configured limit
    AxisLimitReached,
    /// Mount or solver reported a hardware failure
    HardwareFault,
    /// Iterations ran out above the acceptance bound
    NotConverged,
}

impl State {
    /// Check if this state ends the run
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            State::Converged | State::BestEffortAccepted | State::Failed(_)
        )
    }

    /// Check if this terminal state counts as success
    pub fn is_success(&self) -> bool {
        matches!(self, State::Converged | State::BestEffortAccepted)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use State::*;

        match (self, event) {
            // Idle transitions
            (Idle, WaitForSolver) => WaitingForSolver,
            (Idle, StartCalibration) => Calibrating,

            // WaitingForSolver transitions
            (WaitingForSolver, SolverReady) => Calibrating,

            // Calibrating transitions
            (Calibrating, CalibrationComplete) => Aligning,

            // Aligning transitions
            (Aligning, TargetReached) => Converged,
            (Aligning, Accepted) => BestEffortAccepted,
            (Aligning, NotConverged) => Failed(FailureKind::NotConverged),

            // Any running state can fail
            (Idle | WaitingForSolver | Calibrating | Aligning, ErrorDetected(kind)) => {
                Failed(kind)
            }

            // Default: stay in current state
            _ => self,
        }
    }
}
