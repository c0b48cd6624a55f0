//! Mock hardware adapters for integration tests.
//!
//! Records every indicator call so tests can assert on the full output
//! history, and scripts the PIR, rangefinder, and clock so whole presence
//! scenarios run deterministically on the host.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use occupancy::app::events::AgentEvent;
use occupancy::app::ports::{ActuatorPort, Clock, EventSink, MotionSensor, RangeSensor};
use occupancy::app::service::{AgentService, ServiceTuning};
use occupancy::app::shared::SharedContext;
use occupancy::config::PresenceConfig;
use occupancy::control::latch::ActuatorLatch;
use occupancy::error::RangeFault;
use occupancy::fsm::PresenceMachine;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    Drive(bool),
    AllOff,
}

/// Indicator mock; clones share one call log.
#[derive(Clone, Default)]
pub struct MockOutputs {
    calls: Arc<Mutex<Vec<ActuatorCall>>>,
}

#[allow(dead_code)]
impl MockOutputs {
    pub fn calls(&self) -> Vec<ActuatorCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Level implied by the last call.
    pub fn lit(&self) -> bool {
        match self.calls.lock().unwrap().last() {
            Some(ActuatorCall::Drive(on)) => *on,
            _ => false,
        }
    }

    pub fn drive_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, ActuatorCall::Drive(_)))
            .count()
    }
}

impl ActuatorPort for MockOutputs {
    fn drive(&mut self, on: bool) {
        self.calls.lock().unwrap().push(ActuatorCall::Drive(on));
    }

    fn all_off(&mut self) {
        self.calls.lock().unwrap().push(ActuatorCall::AllOff);
    }
}

// ── Clock ─────────────────────────────────────────────────────

/// Millisecond clock advanced by hand.
#[derive(Default)]
pub struct ManualClock(AtomicU64);

#[allow(dead_code)]
impl ManualClock {
    pub fn set_ms(&self, ms: u64) {
        self.0.store(ms, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_us(&self) -> u64 {
        self.0.load(Ordering::SeqCst) * 1000
    }
}

// ── Sensors ───────────────────────────────────────────────────

/// PIR level set from the test body.
#[derive(Clone, Default)]
pub struct MockPir(Arc<AtomicBool>);

#[allow(dead_code)]
impl MockPir {
    pub fn set(&self, high: bool) {
        self.0.store(high, Ordering::SeqCst);
    }
}

impl MotionSensor for MockPir {
    fn is_motion(&mut self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Rangefinder that replays queued readings, then a fallback.
#[derive(Clone)]
pub struct ScriptedRange {
    queue: Arc<Mutex<VecDeque<Result<f32, RangeFault>>>>,
    fallback: Result<f32, RangeFault>,
}

#[allow(dead_code)]
impl ScriptedRange {
    pub fn new(fallback: Result<f32, RangeFault>) -> Self {
        Self {
            queue: Arc::default(),
            fallback,
        }
    }

    pub fn push(&self, reading: Result<f32, RangeFault>) {
        self.queue.lock().unwrap().push_back(reading);
    }

    fn next(&self) -> Result<f32, RangeFault> {
        self.queue.lock().unwrap().pop_front().unwrap_or(self.fallback)
    }
}

impl RangeSensor for ScriptedRange {
    fn measure_once(&mut self) -> Result<f32, RangeFault> {
        self.next()
    }

    fn measure_median(&mut self, _samples: usize) -> Result<f32, RangeFault> {
        self.next()
    }
}

// ── Event sink ────────────────────────────────────────────────

/// Sink that records events in order.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AgentEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AgentEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AgentEvent) {
        self.events.push(*event);
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// One service wired to mocks.
pub struct Rig {
    pub service: AgentService,
    pub outputs: MockOutputs,
    pub clock: Arc<ManualClock>,
    pub pir: MockPir,
    pub range: ScriptedRange,
    pub sink: RecordingSink,
}

#[allow(dead_code)]
impl Rig {
    pub fn new(presence: PresenceConfig) -> Self {
        let outputs = MockOutputs::default();
        let clock = Arc::new(ManualClock::default());
        let shared = SharedContext::new(
            PresenceMachine::new(presence, false),
            ActuatorLatch::new(250, 250),
            Box::new(outputs.clone()),
        );
        let service = AgentService::new(
            shared,
            clock.clone(),
            ServiceTuning {
                median_every: 0,
                median_samples: 3,
                heartbeat_ms: 1000,
            },
        );
        Self {
            service,
            outputs,
            clock,
            pir: MockPir::default(),
            range: ScriptedRange::new(Err(RangeFault::OutOfRange)),
            sink: RecordingSink::default(),
        }
    }

    pub fn shared(&self) -> SharedContext {
        self.service.shared().clone()
    }

    /// One 100 ms step: PIR sample, range sample, actuator service.
    pub fn step(&mut self) {
        self.clock.advance_ms(100);
        self.service.sample_pir(&mut self.pir, &mut self.sink);
        self.service.track_range(&mut self.range, &mut self.sink);
        self.service.service_actuators(&mut self.sink);
    }

    pub fn run_for_ms(&mut self, ms: u64) {
        for _ in 0..ms / 100 {
            self.step();
        }
    }
}
