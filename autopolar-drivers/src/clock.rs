//! Virtual time source
//!
//! Delays complete instantly and advance the clock instead, so simulated
//! runs with long settling and poll intervals finish immediately while
//! still observing the configured timing.

use autopolar_core::traits::Timebase;
use embedded_hal::delay::DelayNs;

/// Clock that advances only when delayed
#[derive(Debug, Default, Clone)]
pub struct VirtualClock {
    now_ns: u64,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total virtual time elapsed, in nanoseconds
    pub fn elapsed_ns(&self) -> u64 {
        self.now_ns
    }

    /// Advance without a delay call
    pub fn advance_ms(&mut self, ms: u64) {
        self.now_ns = self.now_ns.saturating_add(ms.saturating_mul(1_000_000));
    }
}

impl DelayNs for VirtualClock {
    fn delay_ns(&mut self, ns: u32) {
        self.now_ns = self.now_ns.saturating_add(u64::from(ns));
    }

    fn delay_us(&mut self, us: u32) {
        self.now_ns = self.now_ns.saturating_add(u64::from(us) * 1_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance_ms(u64::from(ms));
    }
}

impl Timebase for VirtualClock {
    fn now_ms(&self) -> u64 {
        self.now_ns / 1_000_000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_advance_time() {
        let mut clock = VirtualClock::new();
        assert_eq!(clock.now_ms(), 0);

        clock.delay_ms(1500);
        assert_eq!(clock.now_ms(), 1500);

        clock.delay_us(999);
        assert_eq!(clock.elapsed_ns(), 1_500_999_000);
        assert_eq!(clock.now_ms(), 1500);

        // Sub-millisecond delays carry into the next millisecond
        clock.delay_ns(1_000);
        assert_eq!(clock.elapsed_ns(), 1_501_000_000);
        assert_eq!(clock.now_ms(), 1501);
    }

    #[test]
    fn test_long_delay_does_not_wrap() {
        let mut clock = VirtualClock::new();
        clock.delay_ms(u32::MAX);
        assert_eq!(clock.now_ms(), u64::from(u32::MAX));
    }
}
