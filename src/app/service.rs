//! Agent service: the per-context slot tasks.
//!
//! [`AgentService`] is the hardware-agnostic body of every scheduler slot.
//! Each execution context (main loop, range tracker) owns one, all of them
//! sharing a [`SharedContext`].  Sensors and sinks are injected at the call
//! site through port traits, making every path testable with mocks.
//!
//! ```text
//!  MotionSensor ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!  RangeSensor  ──▶ │       AgentService        │
//!                   │ presence · latch · flags  │──▶ ActuatorPort
//!                   └──────────────────────────┘     (under the lock)
//! ```
//!
//! A slot never propagates an error: faults become events and the slot
//! returns so the scheduler can move on.

use std::sync::Arc;

use log::debug;

use super::events::AgentEvent;
use super::ports::{Clock, EventSink, MotionSensor, RangeSensor};
use super::shared::{EventBatch, SharedContext};
use crate::config::AgentConfig;

/// Cadence knobs the slot tasks need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceTuning {
    /// Every Nth tracking sample is a median (0 disables).
    pub median_every: u32,
    pub median_samples: usize,
    pub heartbeat_ms: u64,
}

impl From<&AgentConfig> for ServiceTuning {
    fn from(c: &AgentConfig) -> Self {
        Self {
            median_every: c.median_every,
            median_samples: c.median_samples,
            heartbeat_ms: c.heartbeat_ms,
        }
    }
}

pub struct AgentService {
    shared: SharedContext,
    clock: Arc<dyn Clock>,
    tuning: ServiceTuning,
    /// Samples taken in the current tracking run.
    track_samples: u32,
    last_heartbeat_ms: Option<u64>,
}

impl AgentService {
    pub fn new(shared: SharedContext, clock: Arc<dyn Clock>, tuning: ServiceTuning) -> Self {
        Self {
            shared,
            clock,
            tuning,
            track_samples: 0,
            last_heartbeat_ms: None,
        }
    }

    pub fn shared(&self) -> &SharedContext {
        &self.shared
    }

    // ── Slot tasks ────────────────────────────────────────────

    /// Read the PIR and feed the presence machine.
    pub fn sample_pir<P>(&mut self, pir: &mut P, sink: &mut impl EventSink)
    where
        P: MotionSensor + ?Sized,
    {
        let high = pir.is_motion();
        let now = self.clock.now_ms();
        let events = self.shared.with(|s| {
            let outcome = s.presence.observe_pir(high, s.flags.system_active, now);
            s.apply_outcome(outcome, now)
        });
        emit_all(sink, &events);
    }

    /// Take one range sample if the machine is tracking.
    ///
    /// The measurement runs with the lock released; only the outcome is
    /// applied under it, and only if the same tracking run is still going.
    pub fn track_range<R>(&mut self, range: &mut R, sink: &mut impl EventSink)
    where
        R: RangeSensor + ?Sized,
    {
        let run = self.shared.with(|s| {
            s.presence
                .tracking_run()
                .filter(|_| !s.flags.shutdown_requested)
        });
        let Some(run) = run else {
            self.track_samples = 0;
            return;
        };

        self.track_samples = self.track_samples.wrapping_add(1);
        let every = self.tuning.median_every;
        let reading = if every > 0 && self.track_samples % every == 0 {
            range.measure_median(self.tuning.median_samples)
        } else {
            range.measure_once()
        };
        if let Ok(cm) = reading {
            debug!("TRACK | distance={cm:.1} cm");
        }

        let now = self.clock.now_ms();
        let events = self.shared.with(|s| {
            let outcome =
                s.presence
                    .observe_range_for_run(run, reading, s.flags.system_active, now);
            s.apply_outcome(outcome, now)
        });
        emit_all(sink, &events);
    }

    /// Cooldown expiry, deferred latch flips, and the heartbeat.
    pub fn service_actuators(&mut self, sink: &mut impl EventSink) {
        let now = self.clock.now_ms();
        let events = self.shared.with(|s| {
            let outcome = s.presence.poll(s.flags.system_active, now);
            s.apply_outcome(outcome, now)
        });
        emit_all(sink, &events);

        let due = self
            .last_heartbeat_ms
            .is_none_or(|last| now.saturating_sub(last) >= self.tuning.heartbeat_ms);
        if due {
            self.last_heartbeat_ms = Some(now);
            let telemetry = self.shared.snapshot().telemetry();
            sink.emit(&AgentEvent::Heartbeat(telemetry));
        }
    }

    /// Force every output off and drop back to `Idle`.
    pub fn shutdown(&mut self, sink: &mut impl EventSink) {
        let now = self.clock.now_ms();
        let events = self.shared.with(|s| s.force_off(now));
        emit_all(sink, &events);
    }
}

fn emit_all(sink: &mut impl EventSink, events: &EventBatch) {
    for event in events {
        sink.emit(event);
    }
}
