//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │  StateTable                                               │
//! │  ┌──────────┬───────────┬──────────┬───────────────────┐  │
//! │  │ Phase    │ on_enter  │ on_exit  │ on_update         │  │
//! │  ├──────────┼───────────┼──────────┼───────────────────┤  │
//! │  │ Idle     │ fn(ctx)   │ -        │ fn(ctx)->Option<> │  │
//! │  │ Tracking │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │  │
//! │  │ Cooldown │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │  │
//! │  └──────────┴───────────┴──────────┴───────────────────┘  │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(next)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next, and updates the
//! current pointer.  All functions receive `&mut FsmContext` which
//! holds the stimulus being processed, the armed flag, the debounce
//! filter, config, and the outputs requested by the handlers.
//!
//! [`PresenceMachine`] wraps the engine with the stimulus-level API the
//! rest of the agent uses.

pub mod context;
pub mod presence;
pub mod states;

use context::FsmContext;
use log::info;

pub use presence::{Outcome, PresenceMachine, PresenceState};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Presence phases.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Phase {
    /// Not tracking; waiting for PIR while armed.
    Idle = 0,
    /// PIR asserted, sampling range.
    Tracking = 1,
    /// Actuators latched on, sampling suspended, timer running.
    Cooldown = 2,
}

impl Phase {
    /// Total number of states; used to size the table array.
    pub const COUNT: usize = 3;

    /// Convert an index back to `Phase`.  Panics on out-of-range in
    /// debug builds; returns `Idle` in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::Tracking,
            2 => Self::Cooldown,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Idle
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn = fn(&mut FsmContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<Phase>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
pub struct StateDescriptor {
    pub id: Phase,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
pub struct Fsm {
    /// Fixed-size table indexed by `Phase as usize`.
    table: [StateDescriptor; Phase::COUNT],
    current: usize,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; Phase::COUNT], initial: Phase) -> Self {
        Self {
            table,
            current: initial as usize,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("presence: starting in {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one stimulus.
    ///
    /// 1. Call `on_update` for the current state.
    /// 2. If it returns `Some(next)`, execute the transition:
    ///    `on_exit(current)` → update pointer → `on_enter(next)`.
    pub fn tick(&mut self, ctx: &mut FsmContext) {
        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            if next_id as usize != self.current {
                self.transition(next_id, ctx);
            }
        }
    }

    /// Force an immediate transition regardless of what `on_update` would
    /// return (used when the agent halts).
    pub fn force_transition(&mut self, next: Phase, ctx: &mut FsmContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    pub fn current_state(&self) -> Phase {
        Phase::from_index(self.current)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: Phase, ctx: &mut FsmContext) {
        let next_idx = next_id as usize;

        info!(
            "presence: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
