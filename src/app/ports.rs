//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AgentService (domain)
//! ```
//!
//! Driven adapters (GPIO, rangefinder, indicators, event sinks) implement
//! these traits.  The [`AgentService`](super::service::AgentService) and the
//! sensor drivers consume them, so the domain core never touches hardware
//! directly and every path is testable with mocks.

use crate::error::{RangeFault, Result};

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source shared by every execution context.
pub trait Clock: Send + Sync {
    /// Microseconds since an arbitrary fixed origin.
    fn now_us(&self) -> u64;

    fn now_ms(&self) -> u64 {
        self.now_us() / 1000
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}

// ───────────────────────────────────────────────────────────────
// Sensor ports (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Digital motion input (PIR).
pub trait MotionSensor {
    /// Current level of the PIR output.
    fn is_motion(&mut self) -> bool;
}

/// Pull resistor applied to an input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    Up,
    Down,
}

/// Input pins whose pull resistor can be changed at runtime.
pub trait PullSelect {
    fn select_pull(&mut self, pull: Pull) -> Result<()>;
}

/// Distance measurement.
///
/// Both calls are synchronous and bounded by the echo timeout; neither
/// retries internally.
pub trait RangeSensor {
    /// One trigger/echo cycle, in centimetres.
    fn measure_once(&mut self) -> core::result::Result<f32, RangeFault>;

    /// Median of `samples` measurements inside the valid window.
    fn measure_median(&mut self, samples: usize) -> core::result::Result<f32, RangeFault>;
}

/// Best-effort wireless link quality, telemetry only.
pub trait SignalProbe {
    /// Signal level in dBm, or `None` if unavailable.
    fn signal_strength(&self) -> Option<i32>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// The synchronised indicator pair (LEDs + buzzer).
///
/// Only [`ActuatorLatch`](crate::control::latch::ActuatorLatch) calls
/// [`drive`](Self::drive); shutdown paths use [`all_off`](Self::all_off).
pub trait ActuatorPort {
    /// Drive every LED and the buzzer to `on` in one call.
    fn drive(&mut self, on: bool);

    /// Unconditionally de-energise every output.
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / reporting)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AgentEvent`](super::events::AgentEvent)s
/// through this port.  Adapters decide where they go (log, status service).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AgentEvent);
}

/// Fan an event out to two sinks.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &super::events::AgentEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}
