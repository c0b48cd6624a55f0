//! Host time adapter.
//!
//! Provides the monotonic [`Clock`] shared by every execution context and a
//! busy-wait [`DelayNs`] for microsecond-scale trigger pulses, where a
//! sleeping syscall would overshoot by far more than the pulse width.

use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;

use crate::app::ports::Clock;

/// Monotonic clock anchored at construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    /// Microseconds since construction (monotonic, wraps at `u64::MAX`).
    fn now_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

/// Spins for sub-millisecond waits and sleeps for anything longer.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpinDelay;

/// Waits at or above this go to the scheduler instead of spinning.
const SPIN_LIMIT: Duration = Duration::from_millis(1);

impl DelayNs for SpinDelay {
    fn delay_ns(&mut self, ns: u32) {
        let wait = Duration::from_nanos(u64::from(ns));
        if wait >= SPIN_LIMIT {
            std::thread::sleep(wait);
            return;
        }
        let until = Instant::now() + wait;
        while Instant::now() < until {
            core::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_monotonic() {
        let clock = MonotonicClock::new();
        let a = clock.now_us();
        let b = clock.now_us();
        assert!(b >= a);
    }

    #[test]
    fn spin_delay_waits_at_least_requested() {
        let mut d = SpinDelay;
        let t = Instant::now();
        d.delay_us(200);
        assert!(t.elapsed() >= Duration::from_micros(200));
    }
}
