//! Outbound agent events.
//!
//! The presence machine and the agent service emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them: log them, or turn them into rate-limited
//! reports for the status service.

use crate::error::RangeFault;
use crate::fsm::Phase;

/// Structured events emitted by the agent core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgentEvent {
    /// Sensing has started after warm-up.
    Started,

    /// PIR went high.
    MotionDetected,

    /// PIR went low; the machine is re-armed.
    MotionCleared,

    /// Proximity tracking began (Idle → Tracking).
    TrackingStarted,

    /// Proximity confirmed; actuators latched on for the cooldown.
    Triggered { distance_cm: f32 },

    /// Cooldown expired; actuators released.
    CooldownEnded,

    /// A range measurement failed (no phase change).
    RangeFault(RangeFault),

    /// The physical indicator pair changed state.
    IndicatorChanged { on: bool },

    /// `system_active` changed (control endpoint or remote power flag).
    PowerChanged { active: bool },

    /// Periodic heartbeat snapshot.
    Heartbeat(Telemetry),

    /// The sensing loop has exited and outputs are off.
    Stopped,
}

impl AgentEvent {
    /// Report category used for per-category rate limiting, or `None` for
    /// events that never leave the device.
    pub fn category(&self) -> Option<ReportCategory> {
        match self {
            Self::Started | Self::Stopped => Some(ReportCategory::Lifecycle),
            Self::MotionCleared => Some(ReportCategory::Motion),
            Self::Triggered { .. } => Some(ReportCategory::Proximity),
            Self::RangeFault(_) => Some(ReportCategory::SensorFault),
            Self::MotionDetected
            | Self::TrackingStarted
            | Self::CooldownEnded
            | Self::IndicatorChanged { .. }
            | Self::PowerChanged { .. }
            | Self::Heartbeat(_) => None,
        }
    }
}

/// Outbound report categories, each gated independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportCategory {
    Lifecycle,
    Motion,
    Proximity,
    SensorFault,
}

impl ReportCategory {
    pub const COUNT: usize = 4;

    pub fn index(self) -> usize {
        self as usize
    }
}

/// A point-in-time snapshot for the heartbeat log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Telemetry {
    pub phase: Phase,
    pub armed: bool,
    pub pir_high: bool,
    pub indicator_on: bool,
    pub active: bool,
}
