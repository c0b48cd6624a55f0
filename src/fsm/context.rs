//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to: the stimulus being processed, the latest PIR level, the
//! armed flag, the proximity debounce, configuration, and the outputs
//! handlers request (indicator level, events).  Think of it as the
//! "blackboard" in a blackboard architecture.

use heapless::Vec;
use log::debug;

use crate::app::events::AgentEvent;
use crate::config::PresenceConfig;
use crate::control::debounce::ConsecutiveFilter;
use crate::error::RangeFault;

/// Most events a single stimulus can produce (fall + exit + enter + spare).
pub const MAX_EVENTS_PER_STIMULUS: usize = 6;

// ---------------------------------------------------------------------------
// Stimulus
// ---------------------------------------------------------------------------

/// What woke the machine up this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stimulus {
    /// Timer check only (cooldown expiry, active flag changes).
    Tick,
    /// A fresh PIR sample; the level itself is in `FsmContext::pir_high`.
    Pir { rose: bool, fell: bool },
    /// A range measurement outcome.
    Range(Result<f32, RangeFault>),
}

impl Stimulus {
    pub fn pir_fell(&self) -> bool {
        matches!(self, Self::Pir { fell: true, .. })
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

pub struct FsmContext {
    // -- Timing --
    /// Monotonic time of the current stimulus (ms).
    pub now_ms: u64,

    // -- Inputs --
    pub stimulus: Stimulus,
    pub pir_high: bool,
    /// Mirror of `ControlFlags::system_active` at the time of the stimulus.
    pub system_active: bool,

    // -- Presence state --
    pub armed: bool,
    /// Only meaningful while in `Cooldown`.
    pub cooldown_until_ms: u64,
    pub proximity: ConsecutiveFilter,
    /// Bumped on every entry into `Tracking`.
    pub tracking_run: u32,
    /// Last distance that satisfied proximity.
    pub last_distance_cm: Option<f32>,

    // -- Configuration --
    pub config: PresenceConfig,

    // -- Outputs (drained after every stimulus) --
    /// Indicator level requested by an enter/exit action.
    pub indicator_request: Option<bool>,
    pub events: Vec<AgentEvent, MAX_EVENTS_PER_STIMULUS>,
}

impl FsmContext {
    pub fn new(config: PresenceConfig, pir_high: bool) -> Self {
        Self {
            now_ms: 0,
            stimulus: Stimulus::Tick,
            pir_high,
            system_active: true,
            armed: true,
            cooldown_until_ms: 0,
            proximity: ConsecutiveFilter::new(config.debounce_samples),
            tracking_run: 0,
            last_distance_cm: None,
            config,
            indicator_request: None,
            events: Vec::new(),
        }
    }

    /// Queue an event for the caller.  Overflow is dropped.
    pub fn emit(&mut self, event: AgentEvent) {
        if self.events.push(event).is_err() {
            debug!("FSM event queue full, dropped {:?}", event);
        }
    }

    /// True if `cm` satisfies the proximity condition.
    pub fn is_near(&self, cm: f32) -> bool {
        self.config.in_window(cm) && cm <= self.config.threshold_cm
    }
}
