//! Alignment run orchestration

use super::{AlignError, AlignOutcome, Phase};
use crate::calibration::{AxisProbe, CalibrationRequest, Calibrator};
use crate::config::Settings;
use crate::math::{sign, Vec2};
use crate::motion::{Axis, AxisId, LimitReached};
use crate::state::{Event, State};
use crate::traits::{AlignEvent, AlignObserver, Mount, PlateSolver, SolverError, Timebase};

/// Exclusively owned capabilities plus the measurement/move primitives
struct Rig<M, S, T, O> {
    mount: M,
    solver: S,
    timebase: T,
    observer: O,
    samples_per_measurement: u32,
    settling_time_ms: u32,
}

impl<M, S, T, O> AxisProbe for Rig<M, S, T, O>
where
    M: Mount,
    S: PlateSolver,
    T: Timebase,
    O: AlignObserver,
{
    fn measure(&mut self, phase: Phase) -> Result<Vec2, AlignError> {
        let samples = self.samples_per_measurement.max(1);
        let mut sum = Vec2::ZERO;
        for _ in 0..samples {
            let solved = self
                .solver
                .solve(true)
                .map_err(|error| AlignError::Solver { phase, error })?;
            if !solved {
                return Err(AlignError::Solver {
                    phase,
                    error: SolverError::NoSolution,
                });
            }
            sum += self.solver.alignment_offset();
        }
        Ok(sum / samples as f64)
    }

    fn move_axis(
        &mut self,
        axis: &mut Axis,
        amount: f64,
        compensation_percent: f64,
        phase: Phase,
    ) -> Result<f64, AlignError> {
        let id = axis.id();
        let compensated = axis.estimate_compensated_move(amount, compensation_percent);
        let moved = axis
            .apply_move(compensated)
            .map_err(|LimitReached { position, limit }| AlignError::AxisLimitReached {
                axis: id,
                phase,
                position,
                limit,
            })?;

        if moved != 0.0 {
            self.mount
                .move_axis(id, moved)
                .map_err(|error| AlignError::Mount { axis: id, error })?;

            self.emit(AlignEvent::AxisMoved {
                axis: id,
                requested: amount,
                commanded: moved,
                position: axis.position(),
            });

            self.timebase.delay_ms(self.settling_time_ms);
        }

        Ok(moved)
    }

    fn emit(&mut self, event: AlignEvent) {
        self.observer.on_event(&event);
    }
}

/// Automatic polar alignment of a two-axis mount
pub struct Aligner<M, S, T, O = ()> {
    rig: Rig<M, S, T, O>,
    settings: Settings,
    altitude: Axis,
    azimuth: Axis,
    state: State,
}

impl<M, S, T, O> Aligner<M, S, T, O>
where
    M: Mount,
    S: PlateSolver,
    T: Timebase,
    O: AlignObserver,
{
    /// Create an aligner, rejecting settings that cannot describe a run
    pub fn new(
        mount: M,
        solver: S,
        timebase: T,
        observer: O,
        settings: Settings,
    ) -> Result<Self, AlignError> {
        settings.validate()?;

        Ok(Self {
            rig: Rig {
                mount,
                solver,
                timebase,
                observer,
                samples_per_measurement: settings.samples_per_measurement,
                settling_time_ms: settings.settling_time_ms(),
            },
            altitude: Axis::from_settings(AxisId::Altitude, &settings.altitude),
            azimuth: Axis::from_settings(AxisId::Azimuth, &settings.azimuth),
            settings,
            state: State::Idle,
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Axis state, including its calibration once learned
    pub fn axis(&self, id: AxisId) -> &Axis {
        match id {
            AxisId::Altitude => &self.altitude,
            AxisId::Azimuth => &self.azimuth,
        }
    }

    pub fn mount(&self) -> &M {
        &self.rig.mount
    }

    pub fn mount_mut(&mut self) -> &mut M {
        &mut self.rig.mount
    }

    pub fn solver(&self) -> &S {
        &self.rig.solver
    }

    pub fn observer(&self) -> &O {
        &self.rig.observer
    }

    /// Release the owned capabilities
    pub fn into_parts(self) -> (M, S, T, O) {
        (
            self.rig.mount,
            self.rig.solver,
            self.rig.timebase,
            self.rig.observer,
        )
    }

    /// Run a complete alignment session
    ///
    /// Each call starts from a fresh session: axis state is rebuilt from
    /// the settings. Errors abort the run and leave the state machine in
    /// [`State::Failed`]; stopping the mount is up to the caller.
    /// Exhausting the iterations is reported as an outcome, not an error.
    pub fn run(&mut self) -> Result<AlignOutcome, AlignError> {
        if self.state != State::Idle {
            self.altitude = Axis::from_settings(AxisId::Altitude, &self.settings.altitude);
            self.azimuth = Axis::from_settings(AxisId::Azimuth, &self.settings.azimuth);
            self.state = State::Idle;
        }

        match self.execute() {
            Ok(outcome) => {
                self.rig.emit(AlignEvent::Finished { outcome });
                Ok(outcome)
            }
            Err(e) => {
                self.transition(Event::ErrorDetected(e.failure_kind()));
                Err(e)
            }
        }
    }

    fn execute(&mut self) -> Result<AlignOutcome, AlignError> {
        if self.settings.consecutive_solves > 0 {
            self.transition(Event::WaitForSolver);
            self.wait_for_solver()?;
            self.transition(Event::SolverReady);
        } else {
            self.transition(Event::StartCalibration);
        }

        self.calibrate()?;
        self.transition(Event::CalibrationComplete);

        self.align()
    }

    fn transition(&mut self, event: Event) {
        let next = self.state.transition(event);
        if next != self.state {
            let from = self.state;
            self.state = next;
            self.rig.emit(AlignEvent::StateChanged { from, to: next });
        }
    }

    /// Poll the solver until enough consecutive solutions were seen
    fn wait_for_solver(&mut self) -> Result<(), AlignError> {
        let required = self.settings.consecutive_solves;
        let max_wait_ms = self.settings.max_wait_ms();
        let interval_ms = self.settings.wait_interval_ms();
        let started = self.rig.timebase.now_ms();
        let mut consecutive = 0;

        loop {
            let success = self
                .rig
                .solver
                .solve(false)
                .map_err(|error| AlignError::Solver {
                    phase: Phase::Waiting,
                    error,
                })?;

            consecutive = if success { consecutive + 1 } else { 0 };
            self.rig.emit(AlignEvent::SolverPolled {
                success,
                consecutive,
            });

            if consecutive >= required {
                return Ok(());
            }

            let waited_ms = self.rig.timebase.now_ms().saturating_sub(started);
            if waited_ms >= max_wait_ms {
                return Err(AlignError::SolverTimeout {
                    waited_ms,
                    consecutive,
                });
            }

            self.rig.timebase.delay_ms(interval_ms);
        }
    }

    /// Calibrate altitude, then azimuth
    fn calibrate(&mut self) -> Result<(), AlignError> {
        let calibrator = Calibrator::new(&self.settings);
        let target = self.settings.target_alignment;

        let altitude_margin = if self.settings.start_at_low_altitude {
            -(self.altitude.backlash_compensation() + target)
        } else {
            0.0
        };
        let request =
            calibration_request(self.settings.altitude.backlash_calibration, altitude_margin);
        let altitude = calibrator.calibrate_axis(&mut self.rig, &mut self.altitude, request)?;

        let mut request = calibration_request(self.settings.azimuth.backlash_calibration, 0.0);
        if self.settings.start_at_opposite_azimuth {
            // Azimuth is assumed orthogonal to altitude in solver space. Which
            // way it runs is only known once calibrated, so the side is
            // resolved by the calibrator.
            let offset = self.rig.measure(Phase::Calibration)?;
            let across = altitude.direction.perpendicular();
            request.margin = self.azimuth.backlash_compensation() + target;
            request.opposite_of = Some(across * across.dot(offset));
        }
        calibrator.calibrate_axis(&mut self.rig, &mut self.azimuth, request)?;

        Ok(())
    }

    /// Axis-space move that cancels a solver-space offset
    fn correction_for(&self, offset: Vec2) -> Vec2 {
        let project = |axis: &Axis| {
            axis.calibration()
                .map_or(0.0, |calibration| calibration.axis_offset(-offset))
        };
        Vec2::from_alt_az(project(&self.altitude), project(&self.azimuth))
    }

    fn axis_mut(&mut self, id: AxisId) -> &mut Axis {
        match id {
            AxisId::Altitude => &mut self.altitude,
            AxisId::Azimuth => &mut self.azimuth,
        }
    }

    /// Iterative correction loop followed by the acceptance decision
    fn align(&mut self) -> Result<AlignOutcome, AlignError> {
        let iterations = self.settings.max_alignment_iterations;
        let target = self.settings.target_alignment;
        let mut previous: Option<Vec2> = None;

        for iteration in 0..iterations {
            let offset = self.rig.measure(Phase::Alignment)?;
            let correction = self.correction_for(offset);
            let aggressiveness = self.settings.aggressiveness(iteration);

            self.rig.emit(AlignEvent::IterationMeasured {
                iteration,
                offset: offset.length(),
                correction,
                aggressiveness,
            });

            if let Some(previous) = previous {
                self.adapt_backlash(AxisId::Altitude, previous.altitude(), correction.altitude());
                self.adapt_backlash(AxisId::Azimuth, previous.azimuth(), correction.azimuth());
            }

            let mut step = correction;
            if self.settings.resist_direction_change {
                let altitude = self.resist(AxisId::Altitude, correction.altitude());
                let azimuth = self.resist(AxisId::Azimuth, correction.azimuth());
                if altitude.is_none() && azimuth.is_none() {
                    self.transition(Event::TargetReached);
                    return Ok(AlignOutcome::Converged {
                        iterations: iteration + 1,
                    });
                }
                step = Vec2::from_alt_az(altitude.unwrap_or(0.0), azimuth.unwrap_or(0.0));
            }

            for (id, amount) in [
                (AxisId::Altitude, step.altitude()),
                (AxisId::Azimuth, step.azimuth()),
            ] {
                if amount != 0.0 {
                    let axis = match id {
                        AxisId::Altitude => &mut self.altitude,
                        AxisId::Azimuth => &mut self.azimuth,
                    };
                    self.rig
                        .move_axis(axis, amount * aggressiveness, 1.0, Phase::Alignment)?;
                }
            }

            self.rig.emit(AlignEvent::IterationComplete { iteration });

            if correction.length() < target {
                self.transition(Event::TargetReached);
                return Ok(AlignOutcome::Converged {
                    iterations: iteration + 1,
                });
            }

            previous = Some(correction);
        }

        if self.settings.accept_best_effort {
            self.transition(Event::Accepted);
            return Ok(AlignOutcome::BestEffort { iterations });
        }

        let last = self.rig.measure(Phase::Alignment)?;
        let residual = self.correction_for(last).length();
        if residual < self.settings.acceptance_bound() {
            self.transition(Event::Accepted);
            Ok(AlignOutcome::WithinAcceptance { residual })
        } else {
            self.transition(Event::NotConverged);
            Ok(AlignOutcome::NotConverged { residual })
        }
    }

    /// Shrink the backlash compensation of an axis that overshot
    fn adapt_backlash(&mut self, id: AxisId, previous: f64, current: f64) {
        if !self.settings.axis(id).backlash_calibration {
            return;
        }
        if previous == 0.0 || current == 0.0 || sign(previous) == sign(current) {
            return;
        }

        let axis = self.axis_mut(id);
        axis.set_backlash_compensation(axis.backlash_compensation() - current.abs());
        let backlash = axis.backlash_compensation();
        self.rig
            .emit(AlignEvent::BacklashAdjusted { axis: id, backlash });
    }

    /// Component to apply on `id`, or `None` when there is nothing to move
    ///
    /// Small corrections that would reverse the last move are suppressed.
    fn resist(&mut self, id: AxisId, correction: f64) -> Option<f64> {
        if correction == 0.0 {
            return None;
        }

        let last = self.axis(id).last_direction();
        if last != 0
            && sign(correction) != f64::from(last)
            && correction.abs() < self.settings.resist_radius()
        {
            self.rig
                .emit(AlignEvent::DirectionChangeResisted { axis: id, correction });
            return None;
        }

        Some(correction)
    }
}

/// Probe direction that leaves the final calibration leg heading toward `margin`
fn calibration_request(calibrate_backlash: bool, margin: f64) -> CalibrationRequest {
    let reverse = if calibrate_backlash {
        margin > 0.0
    } else {
        margin < 0.0
    };

    CalibrationRequest {
        calibrate_backlash,
        reverse,
        margin,
        opposite_of: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::FailureKind;
    use crate::traits::MountError;
    use core::cell::{Cell, RefCell};
    use embedded_hal::delay::DelayNs;
    use std::collections::VecDeque;

    /// Solver replaying a fixed list of offsets; the last one repeats
    struct ScriptedSolver {
        offsets: VecDeque<Vec2>,
        current: Vec2,
        polls: VecDeque<Result<bool, SolverError>>,
    }

    impl ScriptedSolver {
        fn new(offsets: &[(f64, f64)]) -> Self {
            Self {
                offsets: offsets.iter().map(|&(x, y)| Vec2::new(x, y)).collect(),
                current: Vec2::ZERO,
                polls: VecDeque::new(),
            }
        }

        fn with_polls(mut self, polls: &[Result<bool, SolverError>]) -> Self {
            self.polls = polls.iter().copied().collect();
            self
        }
    }

    impl PlateSolver for ScriptedSolver {
        fn solve(&mut self, repeat_until_success: bool) -> Result<bool, SolverError> {
            if !repeat_until_success {
                return self.polls.pop_front().unwrap_or(Ok(false));
            }
            if let Some(next) = self.offsets.pop_front() {
                self.current = next;
            }
            Ok(true)
        }

        fn alignment_offset(&self) -> Vec2 {
            self.current
        }
    }

    #[derive(Default)]
    struct RecordingMount {
        moves: Vec<(AxisId, f64)>,
        fail_on: Option<AxisId>,
    }

    impl Mount for RecordingMount {
        fn move_altitude(&mut self, amount: f64) -> Result<(), MountError> {
            self.record(AxisId::Altitude, amount)
        }

        fn move_azimuth(&mut self, amount: f64) -> Result<(), MountError> {
            self.record(AxisId::Azimuth, amount)
        }
    }

    impl RecordingMount {
        fn record(&mut self, axis: AxisId, amount: f64) -> Result<(), MountError> {
            if self.fail_on == Some(axis) {
                return Err(MountError::Timeout);
            }
            self.moves.push((axis, amount));
            Ok(())
        }
    }

    /// Mount and solver over a linear sky: offset = pole + alt * dy + az * dx
    struct LinearSky {
        offset: Vec2,
    }

    struct SkyMount<'a>(&'a RefCell<LinearSky>);
    struct SkySolver<'a>(&'a RefCell<LinearSky>);

    impl Mount for SkyMount<'_> {
        fn move_altitude(&mut self, amount: f64) -> Result<(), MountError> {
            self.0.borrow_mut().offset.y += amount;
            Ok(())
        }

        fn move_azimuth(&mut self, amount: f64) -> Result<(), MountError> {
            self.0.borrow_mut().offset.x += amount;
            Ok(())
        }
    }

    impl PlateSolver for SkySolver<'_> {
        fn solve(&mut self, _repeat_until_success: bool) -> Result<bool, SolverError> {
            Ok(true)
        }

        fn alignment_offset(&self) -> Vec2 {
            self.0.borrow().offset
        }
    }

    #[derive(Default)]
    struct MockClock {
        now_ns: Cell<u64>,
    }

    impl DelayNs for MockClock {
        fn delay_ns(&mut self, ns: u32) {
            self.now_ns.set(self.now_ns.get() + u64::from(ns));
        }
    }

    impl Timebase for MockClock {
        fn now_ms(&self) -> u64 {
            self.now_ns.get() / 1_000_000
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<AlignEvent>,
    }

    impl AlignObserver for Recorder {
        fn on_event(&mut self, event: &AlignEvent) {
            self.events.push(*event);
        }
    }

    fn plain_settings() -> Settings {
        let mut settings = Settings {
            samples_per_measurement: 1,
            start_aggressiveness: 1.0,
            end_aggressiveness: 1.0,
            ..Default::default()
        };
        settings.altitude.backlash = 0.0;
        settings.azimuth.backlash = 0.0;
        settings
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = Settings {
            max_alignment_iterations: 0,
            ..Default::default()
        };
        let result = Aligner::new(
            RecordingMount::default(),
            ScriptedSolver::new(&[]),
            MockClock::default(),
            (),
            settings,
        );
        assert!(matches!(result, Err(AlignError::InvalidSettings(_))));
    }

    #[test]
    fn test_converges_on_linear_sky() {
        let sky = RefCell::new(LinearSky {
            offset: Vec2::new(42.0, -87.0),
        });
        let mut aligner = Aligner::new(
            SkyMount(&sky),
            SkySolver(&sky),
            MockClock::default(),
            Recorder::default(),
            plain_settings(),
        )
        .unwrap();

        let outcome = aligner.run().unwrap();

        assert!(matches!(outcome, AlignOutcome::Converged { .. }));
        assert_eq!(aligner.state(), State::Converged);
        assert!(sky.borrow().offset.length() < 0.2);

        let altitude = aligner.axis(AxisId::Altitude).calibration().unwrap();
        assert!((altitude.direction.y - 1.0).abs() < 1e-9);
        assert!((altitude.magnitude - 1.0).abs() < 1e-9);

        let events = &aligner.observer().events;
        assert_eq!(
            events.first(),
            Some(&AlignEvent::StateChanged {
                from: State::Idle,
                to: State::Calibrating,
            })
        );
        assert_eq!(events.last(), Some(&AlignEvent::Finished { outcome }));
    }

    #[test]
    fn test_settling_delay_after_each_move() {
        let sky = RefCell::new(LinearSky {
            offset: Vec2::new(3.0, 4.0),
        });
        let settings = Settings {
            settling_time_s: 2.0,
            ..plain_settings()
        };
        let mut aligner =
            Aligner::new(SkyMount(&sky), SkySolver(&sky), MockClock::default(), (), settings)
                .unwrap();

        aligner.run().unwrap();

        // Two probe moves, then one correction per axis
        let (_, _, clock, _) = aligner.into_parts();
        assert_eq!(clock.now_ms(), 4 * 2000);
    }

    #[test]
    fn test_resisted_reversal_skips_axis() {
        // Calibration: altitude along +y, azimuth along +x, unit scale
        let solver = ScriptedSolver::new(&[
            (0.0, 0.0),
            (0.0, 90.0),
            (0.0, 0.0),
            (90.0, 0.0),
            (-5.0, -3.0),
            (-2.0, 0.1),
            (0.01, 0.01),
        ]);
        let settings = Settings {
            resist_direction_change: true,
            ..plain_settings()
        };
        let mut aligner = Aligner::new(
            RecordingMount::default(),
            solver,
            MockClock::default(),
            Recorder::default(),
            settings,
        )
        .unwrap();

        let outcome = aligner.run().unwrap();

        assert_eq!(outcome, AlignOutcome::Converged { iterations: 3 });
        let moves: Vec<(AxisId, f64)> = aligner
            .mount()
            .moves
            .iter()
            .map(|&(axis, amount)| (axis, (amount * 1e6).round() / 1e6))
            .collect();
        assert_eq!(
            moves,
            [
                (AxisId::Altitude, 90.0),
                (AxisId::Azimuth, 90.0),
                (AxisId::Altitude, 3.0),
                (AxisId::Azimuth, 5.0),
                (AxisId::Azimuth, 2.0),
            ]
        );
        assert!(aligner.observer().events.iter().any(|e| matches!(
            e,
            AlignEvent::DirectionChangeResisted {
                axis: AxisId::Altitude,
                ..
            }
        )));
    }

    #[test]
    fn test_overshoot_reduces_backlash() {
        let solver = ScriptedSolver::new(&[
            // Altitude: start, probe, after uncompensated return
            (0.0, 0.0),
            (0.0, 90.0),
            (0.0, -6.0),
            // Azimuth
            (0.0, 0.0),
            (90.0, 0.0),
            // Alignment
            (0.0, -2.0),
            (0.0, 0.5),
            (0.0, 0.0),
        ]);
        let mut settings = plain_settings();
        settings.altitude.backlash = 10.0;
        settings.altitude.backlash_calibration = true;

        let mut aligner = Aligner::new(
            RecordingMount::default(),
            solver,
            MockClock::default(),
            Recorder::default(),
            settings,
        )
        .unwrap();

        let outcome = aligner.run().unwrap();
        assert_eq!(outcome, AlignOutcome::Converged { iterations: 3 });

        let backlash = aligner.axis(AxisId::Altitude).backlash_compensation();
        assert!((backlash - 3.3).abs() < 1e-9, "backlash {backlash}");
        assert!(aligner.observer().events.iter().any(|e| matches!(
            e,
            AlignEvent::BacklashAdjusted {
                axis: AxisId::Altitude,
                ..
            }
        )));
    }

    /// Offsets for a unit-scale calibration of both axes
    const CALIBRATION: [(f64, f64); 4] = [(0.0, 0.0), (0.0, 90.0), (0.0, 0.0), (90.0, 0.0)];

    fn scripted(alignment: &[(f64, f64)]) -> ScriptedSolver {
        let mut offsets = CALIBRATION.to_vec();
        offsets.extend_from_slice(alignment);
        ScriptedSolver::new(&offsets)
    }

    #[test]
    fn test_wait_phase_resets_on_failed_poll() {
        let solver = scripted(&[(0.01, 0.01)])
            .with_polls(&[Ok(true), Ok(false), Ok(true), Ok(true)]);
        let settings = Settings {
            consecutive_solves: 2,
            settling_time_s: 0.0,
            ..plain_settings()
        };
        let mut aligner = Aligner::new(
            RecordingMount::default(),
            solver,
            MockClock::default(),
            Recorder::default(),
            settings,
        )
        .unwrap();

        let outcome = aligner.run().unwrap();
        assert_eq!(outcome, AlignOutcome::Converged { iterations: 1 });

        let polls: Vec<u32> = aligner
            .observer()
            .events
            .iter()
            .filter_map(|e| match e {
                AlignEvent::SolverPolled { consecutive, .. } => Some(*consecutive),
                _ => None,
            })
            .collect();
        assert_eq!(polls, [1, 0, 1, 2]);

        let (_, _, clock, _) = aligner.into_parts();
        assert_eq!(clock.now_ms(), 3000);
    }

    #[test]
    fn test_wait_phase_timeout() {
        let settings = Settings {
            consecutive_solves: 3,
            max_wait_s: 5.0,
            ..plain_settings()
        };
        let mut aligner = Aligner::new(
            RecordingMount::default(),
            scripted(&[]),
            MockClock::default(),
            (),
            settings,
        )
        .unwrap();

        let err = aligner.run().unwrap_err();

        assert_eq!(
            err,
            AlignError::SolverTimeout {
                waited_ms: 5000,
                consecutive: 0,
            }
        );
        assert_eq!(aligner.state(), State::Failed(FailureKind::SolverTimeout));
        assert!(aligner.mount().moves.is_empty());
    }

    #[test]
    fn test_solver_fault_while_waiting() {
        let solver = scripted(&[]).with_polls(&[Err(SolverError::NotConnected)]);
        let settings = Settings {
            consecutive_solves: 1,
            ..plain_settings()
        };
        let mut aligner =
            Aligner::new(RecordingMount::default(), solver, MockClock::default(), (), settings)
                .unwrap();

        assert_eq!(
            aligner.run(),
            Err(AlignError::Solver {
                phase: Phase::Waiting,
                error: SolverError::NotConnected,
            })
        );
        assert_eq!(aligner.state(), State::Failed(FailureKind::HardwareFault));
    }

    #[test]
    fn test_mount_fault_aborts_run() {
        let mount = RecordingMount {
            fail_on: Some(AxisId::Altitude),
            ..Default::default()
        };
        let mut aligner =
            Aligner::new(mount, scripted(&[]), MockClock::default(), (), plain_settings())
                .unwrap();

        assert_eq!(
            aligner.run(),
            Err(AlignError::Mount {
                axis: AxisId::Altitude,
                error: MountError::Timeout,
            })
        );
        assert_eq!(aligner.state(), State::Failed(FailureKind::HardwareFault));
    }

    #[test]
    fn test_iterations_exhausted() {
        let settings = Settings {
            max_alignment_iterations: 2,
            ..plain_settings()
        };

        // Solver never sees the corrections
        let mut aligner = Aligner::new(
            RecordingMount::default(),
            scripted(&[(3.0, 4.0)]),
            MockClock::default(),
            (),
            settings,
        )
        .unwrap();
        let outcome = aligner.run().unwrap();
        assert_eq!(outcome, AlignOutcome::NotConverged { residual: 5.0 });
        assert!(!outcome.is_success());
        assert_eq!(aligner.state(), State::Failed(FailureKind::NotConverged));

        let mut aligner = Aligner::new(
            RecordingMount::default(),
            scripted(&[(3.0, 4.0), (3.0, 4.0), (0.3, 0.0)]),
            MockClock::default(),
            (),
            settings,
        )
        .unwrap();
        let outcome = aligner.run().unwrap();
        assert!(
            matches!(
                outcome,
                AlignOutcome::WithinAcceptance { residual } if (residual - 0.3).abs() < 1e-9
            )
        );
        assert_eq!(aligner.state(), State::BestEffortAccepted);

        let best_effort = Settings {
            accept_best_effort: true,
            ..settings
        };
        let mut aligner = Aligner::new(
            RecordingMount::default(),
            scripted(&[(3.0, 4.0)]),
            MockClock::default(),
            (),
            best_effort,
        )
        .unwrap();
        let outcome = aligner.run().unwrap();
        assert_eq!(outcome, AlignOutcome::BestEffort { iterations: 2 });
        assert!(outcome.is_success());
    }

    #[test]
    fn test_calibration_request_heads_toward_margin() {
        assert!(!calibration_request(false, 0.0).reverse);
        assert!(calibration_request(false, -1.0).reverse);
        assert!(!calibration_request(true, -1.0).reverse);
        assert!(calibration_request(true, 1.0).reverse);
    }
}
