//! The one lock shared by every execution context.
//!
//! Presence state, the actuator latch, the control flags, and the physical
//! indicator outputs live together in [`AgentState`] behind a single
//! `embassy-sync` blocking mutex.  Every access is a short closure passed
//! to [`SharedContext::with`]; sensor measurements and network calls
//! happen outside it, and events produced inside are handed back to the
//! caller to emit after the lock is released.
//!
//! ```text
//!   main loop ─┐
//!   tracker  ──┼──▶ SharedContext::with(|state| …) ──▶ AgentState
//!   control  ──┘         (CriticalSectionMutex<RefCell<_>>)
//! ```

use core::cell::RefCell;
use std::sync::Arc;

use embassy_sync::blocking_mutex::CriticalSectionMutex;
use heapless::Vec;
use log::info;

use super::commands::ControlCommand;
use super::events::{AgentEvent, Telemetry};
use super::ports::ActuatorPort;
use crate::control::latch::ActuatorLatch;
use crate::fsm::{Outcome, Phase, PresenceMachine};

/// Events produced under the lock by one operation.
pub type EventBatch = Vec<AgentEvent, 8>;

// ───────────────────────────────────────────────────────────────
// Control flags
// ───────────────────────────────────────────────────────────────

/// Process-wide switches, reset only by a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlFlags {
    pub system_active: bool,
    pub shutdown_requested: bool,
}

impl Default for ControlFlags {
    fn default() -> Self {
        Self {
            system_active: true,
            shutdown_requested: false,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Guarded state
// ───────────────────────────────────────────────────────────────

pub struct AgentState {
    pub presence: PresenceMachine,
    pub latch: ActuatorLatch,
    pub flags: ControlFlags,
    actuators: Box<dyn ActuatorPort + Send>,
}

impl AgentState {
    /// Forward a presence outcome to the latch and flip the outputs if
    /// the dwell allows.  Returns every event to emit.
    pub fn apply_outcome(&mut self, outcome: Outcome, now_ms: u64) -> EventBatch {
        if let Some(on) = outcome.indicator {
            self.latch.request(on);
        }
        let mut events: EventBatch = outcome.events.into_iter().collect();
        if let Some(on) = self.drive_latch(now_ms) {
            let _ = events.push(AgentEvent::IndicatorChanged { on });
        }
        events
    }

    /// Give a deferred latch flip another chance.
    pub fn drive_latch(&mut self, now_ms: u64) -> Option<bool> {
        self.latch.apply(now_ms, self.actuators.as_mut())
    }

    /// Leave `Cooldown`/`Tracking` and de-energise every output now.
    pub fn force_off(&mut self, now_ms: u64) -> EventBatch {
        let was_on = self.latch.actual();
        let outcome = self.presence.halt();
        let mut events: EventBatch = outcome.events.into_iter().collect();
        self.latch.force_off(now_ms, self.actuators.as_mut());
        if was_on {
            let _ = events.push(AgentEvent::IndicatorChanged { on: false });
        }
        events
    }
}

/// Copy of everything the heartbeat and `/health` need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentSnapshot {
    pub phase: Phase,
    pub armed: bool,
    pub pir_high: bool,
    pub indicator_on: bool,
    pub flags: ControlFlags,
}

impl AgentSnapshot {
    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            phase: self.phase,
            armed: self.armed,
            pir_high: self.pir_high,
            indicator_on: self.indicator_on,
            active: self.flags.system_active,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// SharedContext
// ───────────────────────────────────────────────────────────────

/// Cheap, cloneable handle to the shared agent state.
#[derive(Clone)]
pub struct SharedContext {
    inner: Arc<CriticalSectionMutex<RefCell<AgentState>>>,
}

impl SharedContext {
    pub fn new(
        presence: PresenceMachine,
        latch: ActuatorLatch,
        actuators: Box<dyn ActuatorPort + Send>,
    ) -> Self {
        let state = AgentState {
            presence,
            latch,
            flags: ControlFlags::default(),
            actuators,
        };
        Self {
            inner: Arc::new(CriticalSectionMutex::new(RefCell::new(state))),
        }
    }

    /// Run `f` with exclusive access.  Must not block or re-enter.
    pub fn with<R>(&self, f: impl FnOnce(&mut AgentState) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    pub fn flags(&self) -> ControlFlags {
        self.with(|s| s.flags)
    }

    pub fn is_active(&self) -> bool {
        self.flags().system_active
    }

    pub fn shutdown_requested(&self) -> bool {
        self.flags().shutdown_requested
    }

    /// Set `system_active`; returns `true` if it changed.
    pub fn set_active(&self, active: bool) -> bool {
        self.with(|s| {
            let changed = s.flags.system_active != active;
            s.flags.system_active = active;
            changed
        })
    }

    pub fn request_shutdown(&self) {
        self.with(|s| s.flags.shutdown_requested = true);
    }

    /// Apply a control command and return the resulting flags.
    pub fn apply_command(&self, cmd: ControlCommand) -> ControlFlags {
        let flags = self.with(|s| {
            match cmd {
                ControlCommand::Wake => s.flags.system_active = true,
                ControlCommand::Sleep => s.flags.system_active = false,
                ControlCommand::Quit => s.flags.shutdown_requested = true,
            }
            s.flags
        });
        info!("CONTROL | {:?} -> active={} quitting={}", cmd, flags.system_active, flags.shutdown_requested);
        flags
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        self.with(|s| {
            let presence = s.presence.state();
            AgentSnapshot {
                phase: presence.phase,
                armed: presence.armed,
                pir_high: s.presence.pir_high(),
                indicator_on: s.latch.actual(),
                flags: s.flags,
            }
        })
    }
}
