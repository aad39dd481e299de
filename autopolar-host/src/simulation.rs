//! Batch simulation runs and their summary table

use core::cell::RefCell;
use core::fmt;

use autopolar_core::align::{AlignError, AlignOutcome, Aligner};
use autopolar_core::traits::{AlignEvent, AlignObserver, Mount, Timebase};
use autopolar_drivers::sim::{SimulatedMount, SimulatedSolver, SkyModel};
use autopolar_drivers::ReversedMount;
use log::{error, warn};

use crate::config::HostConfig;
use crate::observer::LogObserver;

/// Result of one simulated alignment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunRecord {
    pub seed: u64,
    pub result: Result<AlignOutcome, AlignError>,
    /// True pole offset when the run ended
    pub final_offset: f64,
    /// True pole offset summed over completed iterations
    pub total_offset: f64,
    pub iterations: u32,
}

impl RunRecord {
    pub fn is_success(&self) -> bool {
        matches!(self.result, Ok(outcome) if outcome.is_success())
    }

    fn status(&self) -> &'static str {
        match self.result {
            Ok(AlignOutcome::Converged { .. }) => "converged",
            Ok(AlignOutcome::BestEffort { .. }) => "best effort",
            Ok(AlignOutcome::WithinAcceptance { .. }) => "accepted",
            Ok(AlignOutcome::NotConverged { .. }) => "failed",
            Err(_) => "error",
        }
    }
}

/// Adds true-offset bookkeeping to another observer
struct Tracker<'a, O> {
    sky: &'a RefCell<SkyModel>,
    inner: O,
    total_offset: f64,
    iterations: u32,
}

impl<O: AlignObserver> AlignObserver for Tracker<'_, O> {
    fn on_event(&mut self, event: &AlignEvent) {
        if let AlignEvent::IterationComplete { .. } = event {
            self.total_offset += self.sky.borrow().true_offset().length();
            self.iterations += 1;
        }
        self.inner.on_event(event);
    }
}

/// Run one alignment against a freshly seeded rig
pub fn run_once<T: Timebase>(config: &HostConfig, run: u32, seed: u64, timebase: T) -> RunRecord {
    let sky = RefCell::new(SkyModel::new(&config.simulation, seed));
    let mount = ReversedMount::from_settings(SimulatedMount::new(&sky), &config.settings);
    let tracker = Tracker {
        sky: &sky,
        inner: LogObserver::for_run(run),
        total_offset: 0.0,
        iterations: 0,
    };

    let (result, total_offset, iterations) = match Aligner::new(
        mount,
        SimulatedSolver::new(&sky),
        timebase,
        tracker,
        config.settings,
    ) {
        Ok(mut aligner) => {
            let result = aligner.run();
            if let Err(e) = &result {
                error!("[run {run}] alignment aborted: {e}");
                if let Err(stop) = aligner.mount_mut().stop() {
                    warn!("[run {run}] failed to stop mount: {stop}");
                }
            }
            let (_, _, _, tracker) = aligner.into_parts();
            (result, tracker.total_offset, tracker.iterations)
        }
        Err(e) => (Err(e), 0.0, 0),
    };

    let final_offset = sky.borrow().true_offset().length();
    RunRecord {
        seed,
        result,
        final_offset,
        total_offset,
        iterations,
    }
}

/// Run `runs` alignments with consecutive seeds starting at `seed`
pub fn run_batch<T, F>(config: &HostConfig, runs: u32, seed: u64, mut timebase: F) -> BatchReport
where
    T: Timebase,
    F: FnMut() -> T,
{
    let records = (0..runs)
        .map(|run| run_once(config, run, seed.wrapping_add(u64::from(run)), timebase()))
        .collect();
    BatchReport { records }
}

/// Per-run results of a batch
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    records: Vec<RunRecord>,
}

impl BatchReport {
    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    pub fn successes(&self) -> usize {
        self.records.iter().filter(|r| r.is_success()).count()
    }

    /// Mean final offset, total offset and iteration count
    pub fn averages(&self) -> Option<(f64, f64, f64)> {
        if self.records.is_empty() {
            return None;
        }
        let n = self.records.len() as f64;
        let sum = self.records.iter().fold((0.0, 0.0, 0.0), |acc, r| {
            (
                acc.0 + r.final_offset,
                acc.1 + r.total_offset,
                acc.2 + f64::from(r.iterations),
            )
        });
        Some((sum.0 / n, sum.1 / n, sum.2 / n))
    }
}

const RULE: &str = "────────────────────────────────────────────────────────";

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "┌{RULE}┐")?;
        writeln!(
            f,
            "│ {:>4} {:>11}  {:>11}  {:>10}  {:<11} │",
            "Run", "Offset", "Total", "Iterations", "Result"
        )?;
        writeln!(f, "├{RULE}┤")?;
        for (i, r) in self.records.iter().enumerate() {
            writeln!(
                f,
                "│ {:>4} {:>11.2}  {:>11.2}  {:>10}  {:<11} │",
                i,
                r.final_offset,
                r.total_offset,
                r.iterations,
                r.status()
            )?;
        }
        if let Some((offset, total, iterations)) = self.averages() {
            writeln!(f, "├{RULE}┤")?;
            writeln!(
                f,
                "│ {:>4} {:>11.2}  {:>11.2}  {:>10.2}  {:>11} │",
                "Avg.",
                offset,
                total,
                iterations,
                format!("{}/{}", self.successes(), self.records.len())
            )?;
        }
        writeln!(f, "└{RULE}┘")
    }
}
