//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers, no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!  IDLE ──[PIR high ∧ armed ∧ active]──▶ TRACKING
//!    ▲                                     │   │
//!    │◀──────[PIR fell ∨ ¬active]──────────┘   │
//!    │                                 [K near samples]
//!    │                                         ▼
//!    └───────[cooldown over]─────────────── COOLDOWN
//!                                              │
//!   (cooldown re-arm, PIR high ∧ active) ──────┘──▶ TRACKING
//!
//!  PIR fell, any state ──▶ armed := true
//! ```

use super::context::{FsmContext, Stimulus};
use super::{Phase, StateDescriptor};
use crate::app::events::AgentEvent;
use crate::config::RearmPolicy;
use log::{info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once per machine.
pub fn build_state_table() -> [StateDescriptor; Phase::COUNT] {
    [
        // Index 0: Idle
        StateDescriptor {
            id: Phase::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        // Index 1: Tracking
        StateDescriptor {
            id: Phase::Tracking,
            name: "Tracking",
            on_enter: Some(tracking_enter),
            on_exit: Some(tracking_exit),
            on_update: tracking_update,
        },
        // Index 2: Cooldown
        StateDescriptor {
            id: Phase::Cooldown,
            name: "Cooldown",
            on_enter: Some(cooldown_enter),
            on_exit: Some(cooldown_exit),
            on_update: cooldown_update,
        },
    ]
}

/// Shared by every state: a PIR high→low edge re-arms the machine.
fn rearm_on_pir_fall(ctx: &mut FsmContext) -> bool {
    if ctx.stimulus.pir_fell() {
        ctx.armed = true;
        true
    } else {
        false
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut FsmContext) {
    info!("IDLE: waiting for motion (armed={})", ctx.armed);
}

fn idle_update(ctx: &mut FsmContext) -> Option<Phase> {
    rearm_on_pir_fall(ctx);

    if ctx.pir_high && ctx.armed && ctx.system_active {
        return Some(Phase::Tracking);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  TRACKING state: sampling range while PIR is asserted
// ═══════════════════════════════════════════════════════════════════════════

fn tracking_enter(ctx: &mut FsmContext) {
    ctx.tracking_run = ctx.tracking_run.wrapping_add(1);
    ctx.proximity.reset();
    ctx.last_distance_cm = None;
    ctx.emit(AgentEvent::TrackingStarted);
    info!(
        "TRACKING: sampling range, threshold {:.0} cm, K={}",
        ctx.config.threshold_cm,
        ctx.proximity.required()
    );
}

fn tracking_exit(ctx: &mut FsmContext) {
    ctx.proximity.reset();
}

fn tracking_update(ctx: &mut FsmContext) -> Option<Phase> {
    if rearm_on_pir_fall(ctx) {
        info!("TRACKING: motion cleared");
        return Some(Phase::Idle);
    }
    if !ctx.system_active {
        info!("TRACKING: paused (system inactive)");
        return Some(Phase::Idle);
    }

    if let Stimulus::Range(reading) = ctx.stimulus {
        match reading {
            Ok(cm) => {
                let near = ctx.is_near(cm);
                if near {
                    ctx.last_distance_cm = Some(cm);
                }
                if ctx.proximity.push(near) {
                    return Some(Phase::Cooldown);
                }
            }
            Err(fault) => {
                ctx.proximity.reset();
                warn!("TRACKING: range fault: {} ({})", fault, fault.hint());
                ctx.emit(AgentEvent::RangeFault(fault));
            }
        }
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  COOLDOWN state: actuators latched on, timer running
// ═══════════════════════════════════════════════════════════════════════════

fn cooldown_enter(ctx: &mut FsmContext) {
    ctx.cooldown_until_ms = ctx.now_ms + ctx.config.cooldown_ms;
    if ctx.config.rearm == RearmPolicy::Edge {
        ctx.armed = false;
    }
    ctx.indicator_request = Some(true);
    let distance_cm = ctx.last_distance_cm.unwrap_or(ctx.config.threshold_cm);
    ctx.emit(AgentEvent::Triggered { distance_cm });
    info!(
        "COOLDOWN: triggered at {:.1} cm, holding {} ms (rearm={})",
        distance_cm,
        ctx.config.cooldown_ms,
        ctx.config.rearm.as_str()
    );
}

fn cooldown_exit(ctx: &mut FsmContext) {
    ctx.indicator_request = Some(false);
    ctx.emit(AgentEvent::CooldownEnded);
}

fn cooldown_update(ctx: &mut FsmContext) -> Option<Phase> {
    rearm_on_pir_fall(ctx);

    if ctx.now_ms < ctx.cooldown_until_ms {
        return None;
    }

    match ctx.config.rearm {
        RearmPolicy::Cooldown => {
            ctx.armed = true;
            if ctx.pir_high && ctx.system_active {
                Some(Phase::Tracking)
            } else {
                Some(Phase::Idle)
            }
        }
        RearmPolicy::Edge => Some(Phase::Idle),
    }
}
