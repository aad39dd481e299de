//! Time source for settling delays and the solver wait phase

use embedded_hal::delay::DelayNs;

/// Blocking delay plus a monotonic millisecond clock
pub trait Timebase: DelayNs {
    /// Milliseconds since an arbitrary fixed origin
    fn now_ms(&self) -> u64;
}

impl<T: Timebase + ?Sized> Timebase for &mut T {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}
