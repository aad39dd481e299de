//! Alignment control loop
//!
//! The [`Aligner`] owns the mount, solver, clock and observer for the
//! duration of a run. It calibrates both axes, then repeatedly measures
//! the pole offset and issues attenuated, backlash-compensated
//! corrections until the correction falls below the target alignment.

pub mod aligner;
pub mod error;

pub use aligner::Aligner;
pub use error::{AlignError, Phase};

/// Result of a run that ended without an error
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlignOutcome {
    /// Correction fell below the target alignment
    Converged { iterations: u32 },
    /// Iterations ran out and best-effort acceptance is enabled
    BestEffort { iterations: u32 },
    /// Iterations ran out but the final residual is within the acceptance bound
    WithinAcceptance { residual: f64 },
    /// Iterations ran out with the final residual above the acceptance bound
    NotConverged { residual: f64 },
}

impl AlignOutcome {
    /// Check if the caller should treat the mount as aligned
    pub fn is_success(&self) -> bool {
        !matches!(self, AlignOutcome::NotConverged { .. })
    }
}

impl core::fmt::Display for AlignOutcome {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AlignOutcome::Converged { iterations } => {
                write!(f, "converged after {iterations} iterations")
            }
            AlignOutcome::BestEffort { iterations } => {
                write!(f, "accepted best effort after {iterations} iterations")
            }
            AlignOutcome::WithinAcceptance { residual } => {
                write!(f, "accepted with residual {residual:.3}")
            }
            AlignOutcome::NotConverged { residual } => {
                write!(f, "not converged, residual {residual:.3}")
            }
        }
    }
}
