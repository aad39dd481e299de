//! Run observer on top of the `log` facade

use autopolar_core::traits::{AlignEvent, AlignObserver};
use log::{debug, info, trace, warn};

/// Writes every alignment event to the log
///
/// Milestones go to `info`, per-move detail to `debug`, and an
/// unsuccessful finish to `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver {
    run: Option<u32>,
}

impl LogObserver {
    /// Prefix messages with a run number
    pub fn for_run(run: u32) -> Self {
        Self { run: Some(run) }
    }

    fn prefix(&self) -> String {
        self.run.map(|run| format!("[run {run}] ")).unwrap_or_default()
    }
}

impl AlignObserver for LogObserver {
    fn on_event(&mut self, event: &AlignEvent) {
        let p = self.prefix();
        match *event {
            AlignEvent::StateChanged { from, to } => info!("{p}{from:?} -> {to:?}"),
            AlignEvent::SolverPolled {
                success,
                consecutive,
            } => debug!("{p}solver poll: success={success} consecutive={consecutive}"),
            AlignEvent::CalibrationStarted {
                axis,
                reverse,
                margin,
            } => info!("{p}calibrating {axis} (reverse={reverse}, margin={margin:.3})"),
            AlignEvent::AxisCalibrated {
                axis,
                direction,
                magnitude,
            } => info!("{p}{axis} calibrated: direction {direction}, magnitude {magnitude:.5}"),
            AlignEvent::BacklashCalibrated { axis, backlash } => {
                info!("{p}{axis} backlash calibrated: {backlash:.3}")
            }
            AlignEvent::Positioned {
                axis,
                axis_offset,
                attempts,
            } => info!("{p}{axis} positioned at {axis_offset:.3} after {attempts} moves"),
            AlignEvent::AxisMoved {
                axis,
                requested,
                commanded,
                position,
            } => debug!(
                "{p}move {axis}: requested {requested:.3}, commanded {commanded:.3}, position {position:.3}"
            ),
            AlignEvent::IterationMeasured {
                iteration,
                offset,
                correction,
                aggressiveness,
            } => info!(
                "{p}iteration {iteration}: offset {offset:.3}, correction alt {:.3} az {:.3}, aggressiveness {aggressiveness:.3}",
                correction.altitude(),
                correction.azimuth()
            ),
            AlignEvent::BacklashAdjusted { axis, backlash } => {
                info!("{p}{axis} overshot, backlash reduced to {backlash:.3}")
            }
            AlignEvent::DirectionChangeResisted { axis, correction } => {
                debug!("{p}{axis} reversal of {correction:.3} resisted")
            }
            AlignEvent::IterationComplete { iteration } => trace!("{p}iteration {iteration} done"),
            AlignEvent::Finished { outcome } => {
                if outcome.is_success() {
                    info!("{p}{outcome}")
                } else {
                    warn!("{p}{outcome}")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix() {
        assert_eq!(LogObserver::default().prefix(), "");
        assert_eq!(LogObserver::for_run(3).prefix(), "[run 3] ");
    }
}
