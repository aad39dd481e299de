//! Plate solver capability

use crate::math::Vec2;

/// Hard solver failures
///
/// An ordinary "no solution yet" is not an error; see [`PlateSolver::solve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SolverError {
    /// Solver is not connected
    NotConnected,
    /// Solver output could not be read
    ReadError,
    /// Solver produced no result while one was required
    NoSolution,
}

impl core::fmt::Display for SolverError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SolverError::NotConnected => f.write_str("solver not connected"),
            SolverError::ReadError => f.write_str("solver output unreadable"),
            SolverError::NoSolution => f.write_str("solver produced no solution"),
        }
    }
}

/// Trait for devices that measure where the mount axis points
pub trait PlateSolver {
    /// Obtain a fresh solution
    ///
    /// With `repeat_until_success` the call blocks until a solution is
    /// available. Without it, `Ok(false)` reports that no solution was
    /// obtained this time.
    fn solve(&mut self, repeat_until_success: bool) -> Result<bool, SolverError>;

    /// Offset from the pole of the latest solution, in solver units
    fn alignment_offset(&self) -> Vec2;
}

impl<S: PlateSolver + ?Sized> PlateSolver for &mut S {
    fn solve(&mut self, repeat_until_success: bool) -> Result<bool, SolverError> {
        (**self).solve(repeat_until_success)
    }

    fn alignment_offset(&self) -> Vec2 {
        (**self).alignment_offset()
    }
}
