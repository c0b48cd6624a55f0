//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured agent events to the
//! `log` facade (stderr via `env_logger` on the Pi).

use log::{info, warn};

use crate::app::events::{AgentEvent, Telemetry};
use crate::app::ports::EventSink;
use crate::fsm::Phase;

/// Adapter that logs every [`AgentEvent`].
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

/// The `[HB]` line body.
pub fn heartbeat_line(t: &Telemetry) -> String {
    let yn = |b: bool| if b { "Y" } else { "N" };
    format!(
        "[HB] PIR={}  LED={}  TRACK={}  ARMED={}  ACTIVE={}",
        if t.pir_high { "HIGH" } else { "LOW" },
        if t.indicator_on { "ON" } else { "OFF" },
        if t.phase == Phase::Tracking { "ON" } else { "OFF" },
        yn(t.armed),
        yn(t.active),
    )
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AgentEvent) {
        match event {
            AgentEvent::Started => info!("START | sensing"),
            AgentEvent::MotionDetected => info!("STATE | PIR high"),
            AgentEvent::MotionCleared => info!("STATE | PIR low, re-armed"),
            AgentEvent::TrackingStarted => info!("STATE | tracking"),
            AgentEvent::Triggered { distance_cm } => {
                info!("STATE | person at {:.1} cm, cooldown", distance_cm);
            }
            AgentEvent::CooldownEnded => info!("STATE | cooldown over"),
            AgentEvent::RangeFault(fault) => warn!("TRACK | {} ({})", fault, fault.hint()),
            AgentEvent::IndicatorChanged { on } => {
                info!("STATE | indicator {}", if *on { "ON" } else { "OFF" });
            }
            AgentEvent::PowerChanged { active } => info!("POWER | system_active -> {}", active),
            AgentEvent::Heartbeat(t) => info!("{}", heartbeat_line(t)),
            AgentEvent::Stopped => info!("STOP | outputs off"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heartbeat_format() {
        let t = Telemetry {
            phase: Phase::Tracking,
            armed: true,
            pir_high: true,
            indicator_on: false,
            active: true,
        };
        assert_eq!(
            heartbeat_line(&t),
            "[HB] PIR=HIGH  LED=OFF  TRACK=ON  ARMED=Y  ACTIVE=Y"
        );
    }

    #[test]
    fn cooldown_is_not_tracking() {
        let t = Telemetry {
            phase: Phase::Cooldown,
            armed: false,
            pir_high: false,
            indicator_on: true,
            active: false,
        };
        assert_eq!(
            heartbeat_line(&t),
            "[HB] PIR=LOW  LED=ON  TRACK=OFF  ARMED=N  ACTIVE=N"
        );
    }
}
