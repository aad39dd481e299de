//! Wall-clock timebase

use std::time::{Duration, Instant};

use autopolar_core::traits::Timebase;
use embedded_hal::delay::DelayNs;

/// Timebase backed by `std::thread::sleep` and [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct StdTimebase {
    origin: Instant,
}

impl StdTimebase {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for StdTimebase {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayNs for StdTimebase {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

impl Timebase for StdTimebase {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_is_monotonic() {
        let mut clock = StdTimebase::new();
        let before = clock.now_ms();
        clock.delay_ms(5);
        assert!(clock.now_ms() >= before + 5);
    }
}
