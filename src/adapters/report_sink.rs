//! Rate-gated reporting sink.
//!
//! Implements [`EventSink`] by turning reportable [`AgentEvent`]s into
//! status-service reports.  Each [`ReportCategory`] has its own token
//! bucket, so a flapping PIR cannot starve proximity reports and vice
//! versa.  Each execution context owns its own sink and therefore its own
//! gates.

use core::time::Duration;

use burster::Limiter;
use log::debug;

use super::status_client::Reporter;
use crate::app::events::{AgentEvent, ReportCategory};
use crate::app::ports::EventSink;
use crate::config::RearmPolicy;

/// A single send per gate before it has to refill.
const GATE_BURST: u64 = 1;

type Gate = burster::TokenBucket<fn() -> Duration>;

fn new_gate(rate_per_sec: u64) -> Gate {
    burster::TokenBucket::new_with_time_provider(
        rate_per_sec.max(1) as _,
        GATE_BURST as _,
        platform_now as fn() -> Duration,
    )
}

fn platform_now() -> Duration {
    use std::time::Instant;
    static START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
    START.get_or_init(Instant::now).elapsed()
}

/// Human-readable report text for an event, with its distance if any.
pub fn report_message(event: &AgentEvent, rearm: RearmPolicy) -> Option<(String, Option<f32>)> {
    let msg = match event {
        AgentEvent::Started => (format!("agent started (rearm={})", rearm.as_str()), None),
        AgentEvent::Stopped => (format!("agent stopped (rearm={})", rearm.as_str()), None),
        AgentEvent::MotionCleared => ("motion cleared".to_owned(), None),
        AgentEvent::Triggered { distance_cm } => {
            ("person detected, indicator on".to_owned(), Some(*distance_cm))
        }
        AgentEvent::RangeFault(fault) => (format!("no ultrasonic echo: {fault}"), None),
        _ => return None,
    };
    Some(msg)
}

pub struct ReportingSink {
    reporter: Reporter,
    rearm: RearmPolicy,
    gates: [Gate; ReportCategory::COUNT],
}

impl ReportingSink {
    pub fn new(reporter: Reporter, rearm: RearmPolicy, rate_per_sec: u64) -> Self {
        Self {
            reporter,
            rearm,
            gates: core::array::from_fn(|_| new_gate(rate_per_sec)),
        }
    }

    /// Consume a token for `category`; `false` if the gate is closed.
    fn admit(&mut self, category: ReportCategory) -> bool {
        self.gates[category.index()].try_consume(1).is_ok()
    }
}

impl EventSink for ReportingSink {
    fn emit(&mut self, event: &AgentEvent) {
        let Some(category) = event.category() else {
            return;
        };
        let Some((message, distance)) = report_message(event, self.rearm) else {
            return;
        };
        if !self.admit(category) {
            debug!("report gated ({:?}): {}", category, message);
            return;
        }
        self.reporter.report(message, distance);
    }
}
