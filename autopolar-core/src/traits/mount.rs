//! Mount capability
//!
//! Abstracts over the motorized altitude/azimuth adjusters of a mount.
//! Amounts are signed axis-space distances after backlash compensation.

use crate::motion::AxisId;

/// Hardware-level mount failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MountError {
    /// Mount is not connected
    NotConnected,
    /// Command could not be delivered or was rejected
    CommunicationError,
    /// Move did not complete in time
    Timeout,
}

impl core::fmt::Display for MountError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MountError::NotConnected => f.write_str("mount not connected"),
            MountError::CommunicationError => f.write_str("mount communication error"),
            MountError::Timeout => f.write_str("mount move timed out"),
        }
    }
}

/// Trait for mounts with motorized polar adjusters
///
/// Every move blocks until the motion is complete.
pub trait Mount {
    /// Move the altitude adjuster by a signed amount
    fn move_altitude(&mut self, amount: f64) -> Result<(), MountError>;

    /// Move the azimuth adjuster by a signed amount
    fn move_azimuth(&mut self, amount: f64) -> Result<(), MountError>;

    /// Stop any altitude motion
    fn stop_altitude(&mut self) -> Result<(), MountError> {
        Ok(())
    }

    /// Stop any azimuth motion
    fn stop_azimuth(&mut self) -> Result<(), MountError> {
        Ok(())
    }

    /// Move the adjuster identified by `axis`
    fn move_axis(&mut self, axis: AxisId, amount: f64) -> Result<(), MountError> {
        match axis {
            AxisId::Altitude => self.move_altitude(amount),
            AxisId::Azimuth => self.move_azimuth(amount),
        }
    }

    /// Stop both adjusters
    fn stop(&mut self) -> Result<(), MountError> {
        self.stop_altitude()?;
        self.stop_azimuth()
    }
}

impl<M: Mount + ?Sized> Mount for &mut M {
    fn move_altitude(&mut self, amount: f64) -> Result<(), MountError> {
        (**self).move_altitude(amount)
    }

    fn move_azimuth(&mut self, amount: f64) -> Result<(), MountError> {
        (**self).move_azimuth(amount)
    }

    fn stop_altitude(&mut self) -> Result<(), MountError> {
        (**self).stop_altitude()
    }

    fn stop_azimuth(&mut self) -> Result<(), MountError> {
        (**self).stop_azimuth()
    }
}
