//! Mount adapters

use autopolar_core::config::Settings;
use autopolar_core::traits::{Mount, MountError};

/// Flips the sign of moves on selected axes before forwarding them
///
/// Used when an adjuster is mounted so that a positive command moves it
/// the "wrong" way; the core always works in its own axis convention.
#[derive(Debug, Clone)]
pub struct ReversedMount<M> {
    inner: M,
    reverse_altitude: bool,
    reverse_azimuth: bool,
}

impl<M: Mount> ReversedMount<M> {
    pub fn new(inner: M, reverse_altitude: bool, reverse_azimuth: bool) -> Self {
        Self {
            inner,
            reverse_altitude,
            reverse_azimuth,
        }
    }

    /// Take the reversal flags from the per-axis settings
    pub fn from_settings(inner: M, settings: &Settings) -> Self {
        Self::new(inner, settings.altitude.reverse, settings.azimuth.reverse)
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }

    pub fn into_inner(self) -> M {
        self.inner
    }
}

fn flip(amount: f64, reverse: bool) -> f64 {
    if reverse {
        -amount
    } else {
        amount
    }
}

impl<M: Mount> Mount for ReversedMount<M> {
    fn move_altitude(&mut self, amount: f64) -> Result<(), MountError> {
        self.inner.move_altitude(flip(amount, self.reverse_altitude))
    }

    fn move_azimuth(&mut self, amount: f64) -> Result<(), MountError> {
        self.inner.move_azimuth(flip(amount, self.reverse_azimuth))
    }

    fn stop_altitude(&mut self) -> Result<(), MountError> {
        self.inner.stop_altitude()
    }

    fn stop_azimuth(&mut self) -> Result<(), MountError> {
        self.inner.stop_azimuth()
    }
}
