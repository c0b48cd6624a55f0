//! Stimulus-level facade over the presence FSM.
//!
//! The sensing contexts never poke at [`FsmContext`] directly.  They feed
//! PIR samples, range outcomes and timer ticks into [`PresenceMachine`] and
//! get back an [`Outcome`]: the indicator level to request (if any) and
//! the events the stimulus produced.

use heapless::Vec;
use log::debug;

use super::context::{FsmContext, MAX_EVENTS_PER_STIMULUS, Stimulus};
use super::states::build_state_table;
use super::{Fsm, Phase};
use crate::app::events::AgentEvent;
use crate::config::PresenceConfig;
use crate::error::RangeFault;

/// Read-only view of the presence state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceState {
    pub phase: Phase,
    pub armed: bool,
    /// `Some` only while in `Cooldown`.
    pub cooldown_until_ms: Option<u64>,
}

/// What a single stimulus asks the caller to do.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Outcome {
    /// Indicator level to pass to `ActuatorLatch::request`.
    pub indicator: Option<bool>,
    pub events: Vec<AgentEvent, MAX_EVENTS_PER_STIMULUS>,
}

pub struct PresenceMachine {
    fsm: Fsm,
    ctx: FsmContext,
}

impl PresenceMachine {
    /// Build and start the machine in `Idle`, armed.  `pir_high` seeds the
    /// edge detector so a PIR already high at boot is seen as a level, not
    /// an edge.
    pub fn new(config: PresenceConfig, pir_high: bool) -> Self {
        let mut ctx = FsmContext::new(config, pir_high);
        let mut fsm = Fsm::new(build_state_table(), Phase::Idle);
        fsm.start(&mut ctx);
        Self { fsm, ctx }
    }

    /// Reset the edge detector to the line's current level without
    /// treating it as an edge.  Used once the sensor has settled.
    pub fn seed_pir(&mut self, high: bool) {
        self.ctx.pir_high = high;
    }

    /// Feed a PIR sample.
    pub fn observe_pir(&mut self, high: bool, active: bool, now_ms: u64) -> Outcome {
        let was = self.ctx.pir_high;
        let rose = high && !was;
        let fell = !high && was;
        self.ctx.pir_high = high;
        if rose {
            self.ctx.emit(AgentEvent::MotionDetected);
        }
        if fell {
            self.ctx.emit(AgentEvent::MotionCleared);
        }
        self.step(Stimulus::Pir { rose, fell }, active, now_ms)
    }

    /// Feed a range measurement outcome.  Ignored outside `Tracking`
    /// except for the usual Idle→Tracking check.
    pub fn observe_range(
        &mut self,
        reading: Result<f32, RangeFault>,
        active: bool,
        now_ms: u64,
    ) -> Outcome {
        self.step(Stimulus::Range(reading), active, now_ms)
    }

    /// Feed a range outcome measured during tracking run `run`.  Dropped
    /// if that run ended while the measurement was in progress.
    pub fn observe_range_for_run(
        &mut self,
        run: u32,
        reading: Result<f32, RangeFault>,
        active: bool,
        now_ms: u64,
    ) -> Outcome {
        if self.tracking_run() != Some(run) {
            debug!("range sample from ended tracking run {run} dropped");
            return Outcome::default();
        }
        self.observe_range(reading, active, now_ms)
    }

    /// Timer tick: cooldown expiry and active-flag changes.
    pub fn poll(&mut self, active: bool, now_ms: u64) -> Outcome {
        self.step(Stimulus::Tick, active, now_ms)
    }

    /// Drop back to `Idle` immediately (shutdown).  Releases the indicator
    /// if a cooldown was running.
    pub fn halt(&mut self) -> Outcome {
        self.fsm.force_transition(Phase::Idle, &mut self.ctx);
        self.drain()
    }

    pub fn state(&self) -> PresenceState {
        let phase = self.fsm.current_state();
        PresenceState {
            phase,
            armed: self.ctx.armed,
            cooldown_until_ms: (phase == Phase::Cooldown).then_some(self.ctx.cooldown_until_ms),
        }
    }

    pub fn phase(&self) -> Phase {
        self.fsm.current_state()
    }

    /// True while range samples are being consumed.
    pub fn wants_range(&self) -> bool {
        self.fsm.current_state() == Phase::Tracking
    }

    /// Current tracking run, `None` outside `Tracking`.
    pub fn tracking_run(&self) -> Option<u32> {
        self.wants_range().then_some(self.ctx.tracking_run)
    }

    pub fn pir_high(&self) -> bool {
        self.ctx.pir_high
    }

    pub fn config(&self) -> &PresenceConfig {
        &self.ctx.config
    }

    fn step(&mut self, stimulus: Stimulus, active: bool, now_ms: u64) -> Outcome {
        self.ctx.stimulus = stimulus;
        self.ctx.system_active = active;
        self.ctx.now_ms = now_ms;
        self.fsm.tick(&mut self.ctx);
        self.ctx.stimulus = Stimulus::Tick;
        self.drain()
    }

    fn drain(&mut self) -> Outcome {
        Outcome {
            indicator: self.ctx.indicator_request.take(),
            events: core::mem::take(&mut self.ctx.events),
        }
    }
}
