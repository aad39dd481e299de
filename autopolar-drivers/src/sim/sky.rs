//! Simulated sky and adjuster mechanics

use autopolar_core::traits::{MountError, SolverError};
use autopolar_core::{AxisId, Vec2};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::{RigConfig, SimAxisConfig};

/// One adjuster with true backlash
///
/// Commanded motion first travels through the slack zone `±backlash / 2`;
/// only the excess moves the pole offset.
#[derive(Debug, Clone)]
pub struct SimulatedAxis {
    vector: Vec2,
    backlash: f64,
    slack: f64,
    net_travel: f64,
}

impl SimulatedAxis {
    pub fn new(config: &SimAxisConfig) -> Self {
        let half = config.backlash.max(0.0) * 0.5;
        Self {
            vector: config.vector,
            backlash: config.backlash.max(0.0),
            slack: config.initial_slack.clamp(-half, half),
            net_travel: 0.0,
        }
    }

    /// Feed a commanded move through the slack zone, returning the net motion
    pub fn take_up_slack(&mut self, amount: f64) -> f64 {
        let half = self.backlash * 0.5;
        self.slack += amount;

        let net = if self.slack > half {
            self.slack - half
        } else if self.slack < -half {
            self.slack + half
        } else {
            0.0
        };

        self.slack = self.slack.clamp(-half, half);
        self.net_travel += net;
        net
    }

    pub fn vector(&self) -> Vec2 {
        self.vector
    }

    pub fn backlash(&self) -> f64 {
        self.backlash
    }

    /// Current position inside the slack zone
    pub fn slack(&self) -> f64 {
        self.slack
    }

    /// Sum of all net motion so far
    pub fn net_travel(&self) -> f64 {
        self.net_travel
    }
}

/// Ground truth shared by the simulated mount and solver
#[derive(Debug, Clone)]
pub struct SkyModel {
    true_offset: Vec2,
    altitude: SimulatedAxis,
    azimuth: SimulatedAxis,
    offset_jitter: f64,
    move_jitter: f64,
    failed_solves: u32,
    solution: Option<Vec2>,
    connected: bool,
    solves: u32,
    rng: SmallRng,
}

impl SkyModel {
    /// Build a connected rig; `seed` fixes all noise
    pub fn new(config: &RigConfig, seed: u64) -> Self {
        Self {
            true_offset: config.initial_offset,
            altitude: SimulatedAxis::new(&config.altitude),
            azimuth: SimulatedAxis::new(&config.azimuth),
            offset_jitter: config.offset_jitter.max(0.0),
            move_jitter: config.move_jitter.max(0.0),
            failed_solves: config.failed_solves,
            solution: None,
            connected: true,
            solves: 0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// True pole offset, without measurement noise
    pub fn true_offset(&self) -> Vec2 {
        self.true_offset
    }

    pub fn axis(&self, id: AxisId) -> &SimulatedAxis {
        match id {
            AxisId::Altitude => &self.altitude,
            AxisId::Azimuth => &self.azimuth,
        }
    }

    /// Latest solution, if any solve succeeded yet
    pub fn solution(&self) -> Option<Vec2> {
        self.solution
    }

    /// Solve attempts so far, successful or not
    pub fn solves(&self) -> u32 {
        self.solves
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Simulate a cable pull or reconnect
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    fn jitter(&mut self, width: f64) -> f64 {
        if width == 0.0 {
            return 0.0;
        }
        (self.rng.gen::<f64>() - 0.5) * width
    }

    pub(crate) fn move_axis(&mut self, id: AxisId, amount: f64) -> Result<(), MountError> {
        if !self.connected {
            return Err(MountError::NotConnected);
        }

        let axis = match id {
            AxisId::Altitude => &mut self.altitude,
            AxisId::Azimuth => &mut self.azimuth,
        };
        let net = axis.take_up_slack(amount);
        let vector = axis.vector();

        let length = vector.length();
        let noise = if length > 0.0 {
            self.jitter(self.move_jitter) / length
        } else {
            0.0
        };
        self.true_offset += vector * (net + noise);
        Ok(())
    }

    pub(crate) fn stop(&self) -> Result<(), MountError> {
        if self.connected {
            Ok(())
        } else {
            Err(MountError::NotConnected)
        }
    }

    pub(crate) fn solve(&mut self, repeat_until_success: bool) -> Result<bool, SolverError> {
        if !self.connected {
            return Err(SolverError::NotConnected);
        }

        loop {
            self.solves += 1;
            if self.failed_solves == 0 {
                break;
            }
            self.failed_solves -= 1;
            if !repeat_until_success {
                return Ok(false);
            }
        }

        let noise = Vec2::new(
            self.jitter(self.offset_jitter),
            self.jitter(self.offset_jitter),
        );
        self.solution = Some(self.true_offset + noise);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(backlash: f64, slack: f64) -> SimulatedAxis {
        SimulatedAxis::new(&SimAxisConfig {
            vector: Vec2::new(1.0, 0.0),
            backlash,
            initial_slack: slack,
        })
    }

    #[test]
    fn test_slack_absorbs_small_moves() {
        let mut a = axis(10.0, 0.0);
        assert_eq!(a.take_up_slack(3.0), 0.0);
        assert_eq!(a.take_up_slack(4.0), 2.0);
        assert_eq!(a.slack(), 5.0);

        // Reversal crosses the whole zone first
        assert_eq!(a.take_up_slack(-8.0), 0.0);
        assert_eq!(a.take_up_slack(-4.0), -2.0);
        assert_eq!(a.net_travel(), 0.0);
    }

    #[test]
    fn test_initial_slack_clamped() {
        let a = axis(10.0, 40.0);
        assert_eq!(a.slack(), 5.0);
    }

    #[test]
    fn test_moves_shift_true_offset() {
        let mut config = RigConfig::ideal(Vec2::new(1.0, 2.0));
        config.azimuth.backlash = 4.0;
        let mut sky = SkyModel::new(&config, 0);

        sky.move_axis(AxisId::Altitude, 1.5).unwrap();
        assert_eq!(sky.true_offset(), Vec2::new(1.0, 5.0));

        // Two units of slack first
        sky.move_axis(AxisId::Azimuth, 3.0).unwrap();
        assert_eq!(sky.true_offset(), Vec2::new(4.0, 5.0));
    }

    #[test]
    fn test_failed_solves_then_success() {
        let config = RigConfig {
            failed_solves: 2,
            ..RigConfig::ideal(Vec2::new(3.0, -4.0))
        };
        let mut sky = SkyModel::new(&config, 0);

        assert_eq!(sky.solve(false), Ok(false));
        assert_eq!(sky.solution(), None);
        assert_eq!(sky.solve(true), Ok(true));
        assert_eq!(sky.solution(), Some(Vec2::new(3.0, -4.0)));
        assert_eq!(sky.solves(), 3);
    }

    #[test]
    fn test_disconnected_rig_errors() {
        let mut sky = SkyModel::new(&RigConfig::default(), 1);
        sky.set_connected(false);
        assert_eq!(sky.solve(true), Err(SolverError::NotConnected));
        assert_eq!(
            sky.move_axis(AxisId::Altitude, 1.0),
            Err(MountError::NotConnected)
        );
    }

    #[test]
    fn test_noise_is_seeded() {
        let config = RigConfig::default();
        let mut a = SkyModel::new(&config, 42);
        let mut b = SkyModel::new(&config, 42);

        for _ in 0..5 {
            a.solve(true).unwrap();
            b.solve(true).unwrap();
            a.move_axis(AxisId::Azimuth, 20.0).unwrap();
            b.move_axis(AxisId::Azimuth, 20.0).unwrap();
        }
        a.solve(true).unwrap();
        b.solve(true).unwrap();

        assert_eq!(a.solution(), b.solution());
        assert_eq!(a.true_offset(), b.true_offset());

        let jitter = a.solution().unwrap() - a.true_offset();
        assert!(jitter.x.abs() <= config.offset_jitter * 0.5);
        assert!(jitter.y.abs() <= config.offset_jitter * 0.5);
    }
}
