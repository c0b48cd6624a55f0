//! Anti-flicker actuator latch.
//!
//! Callers record intent with [`ActuatorLatch::request`]; only
//! [`ActuatorLatch::apply`] touches hardware, and it defers a flip until
//! the minimum dwell for the current output level has elapsed:
//!
//! ```text
//!   actual=off ──[desired=on  && off for ≥ MIN_OFF]──▶ actual=on
//!   actual=on  ──[desired=off && on  for ≥ MIN_ON ]──▶ actual=off
//! ```
//!
//! The first change after construction is never deferred.

use log::debug;

use crate::app::ports::ActuatorPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorLatch {
    desired: bool,
    actual: bool,
    /// Time (ms) of the last hardware flip; `None` until the first one.
    last_change: Option<u64>,
    min_on_ms: u64,
    min_off_ms: u64,
}

impl ActuatorLatch {
    pub fn new(min_on_ms: u64, min_off_ms: u64) -> Self {
        Self {
            desired: false,
            actual: false,
            last_change: None,
            min_on_ms,
            min_off_ms,
        }
    }

    /// Record the wanted output level.  Never touches hardware.
    pub fn request(&mut self, on: bool) {
        self.desired = on;
    }

    /// Flip the hardware if a change is pending and the dwell allows it.
    ///
    /// Returns `Some(level)` when the outputs were driven, `None` otherwise.
    /// Calling it with nothing pending is a no-op.
    pub fn apply(&mut self, now_ms: u64, hw: &mut dyn ActuatorPort) -> Option<bool> {
        if self.desired == self.actual {
            return None;
        }
        if let Some(changed) = self.last_change {
            let dwell = if self.actual {
                self.min_on_ms
            } else {
                self.min_off_ms
            };
            let held = now_ms.saturating_sub(changed);
            if held < dwell {
                debug!(
                    "latch: flip to {} deferred ({} of {} ms)",
                    self.desired, held, dwell
                );
                return None;
            }
        }
        hw.drive(self.desired);
        self.actual = self.desired;
        self.last_change = Some(now_ms);
        Some(self.actual)
    }

    /// Drive everything off immediately, ignoring the dwell.  Used on
    /// shutdown.
    pub fn force_off(&mut self, now_ms: u64, hw: &mut dyn ActuatorPort) {
        hw.all_off();
        self.desired = false;
        if self.actual {
            self.last_change = Some(now_ms);
        }
        self.actual = false;
    }

    pub fn desired(&self) -> bool {
        self.desired
    }

    pub fn actual(&self) -> bool {
        self.actual
    }

    pub fn last_change(&self) -> Option<u64> {
        self.last_change
    }

    /// True when `apply` still has work to do.
    pub fn pending(&self) -> bool {
        self.desired != self.actual
    }
}
