//! Capability handles over a shared [`SkyModel`]

use core::cell::RefCell;

use autopolar_core::traits::{Mount, MountError, PlateSolver, SolverError};
use autopolar_core::{AxisId, Vec2};

use super::SkyModel;

/// Mount driving the simulated adjusters
#[derive(Debug, Clone, Copy)]
pub struct SimulatedMount<'a> {
    sky: &'a RefCell<SkyModel>,
}

impl<'a> SimulatedMount<'a> {
    pub fn new(sky: &'a RefCell<SkyModel>) -> Self {
        Self { sky }
    }
}

impl Mount for SimulatedMount<'_> {
    fn move_altitude(&mut self, amount: f64) -> Result<(), MountError> {
        self.sky.borrow_mut().move_axis(AxisId::Altitude, amount)
    }

    fn move_azimuth(&mut self, amount: f64) -> Result<(), MountError> {
        self.sky.borrow_mut().move_axis(AxisId::Azimuth, amount)
    }

    fn stop_altitude(&mut self) -> Result<(), MountError> {
        self.sky.borrow().stop()
    }

    fn stop_azimuth(&mut self) -> Result<(), MountError> {
        self.sky.borrow().stop()
    }
}

/// Plate solver observing the simulated pole offset with noise
#[derive(Debug, Clone, Copy)]
pub struct SimulatedSolver<'a> {
    sky: &'a RefCell<SkyModel>,
}

impl<'a> SimulatedSolver<'a> {
    pub fn new(sky: &'a RefCell<SkyModel>) -> Self {
        Self { sky }
    }
}

impl PlateSolver for SimulatedSolver<'_> {
    fn solve(&mut self, repeat_until_success: bool) -> Result<bool, SolverError> {
        self.sky.borrow_mut().solve(repeat_until_success)
    }

    fn alignment_offset(&self) -> Vec2 {
        self.sky.borrow().solution().unwrap_or_default()
    }
}
