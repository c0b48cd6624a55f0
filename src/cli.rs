//! Process start parameters.
//!
//! Every flag is optional; anything left out keeps the
//! [`AgentConfig::default`] value.

use clap::Parser;

use crate::config::{AgentConfig, PullMode, RearmPolicy, TrackingMode};

#[derive(Parser, Debug, Default)]
#[command(
    name = "occupancy-agent",
    version,
    about = "PIR + ultrasonic occupancy agent with LED/buzzer indicator",
    long_about = "Samples a PIR sensor and an ultrasonic rangefinder, latches an \
                  LED/buzzer indicator when someone comes within range, reports \
                  to a status service and serves a small control endpoint \
                  (/health /wake /sleep /quit)."
)]
pub struct Args {
    /// Status service base URL
    #[arg(long)]
    pub server: Option<String>,

    /// Device identifier used in reports
    #[arg(long)]
    pub device: Option<String>,

    /// URL the status service should use to reach the control endpoint
    #[arg(long)]
    pub control_url: Option<String>,

    /// PIR input (BCM)
    #[arg(long)]
    pub pir: Option<u8>,

    /// Ultrasonic trigger output (BCM)
    #[arg(long)]
    pub trig: Option<u8>,

    /// Ultrasonic echo input (BCM)
    #[arg(long)]
    pub echo: Option<u8>,

    /// Indicator LED (BCM), repeat for more
    #[arg(long)]
    pub led: Vec<u8>,

    /// Buzzer output (BCM)
    #[arg(long, conflicts_with = "no_buzzer")]
    pub buzzer: Option<u8>,

    /// Run without a buzzer
    #[arg(long)]
    pub no_buzzer: bool,

    /// PIR pull resistor
    #[arg(long, value_enum)]
    pub pud: Option<PullMode>,

    /// PIR warm-up in seconds
    #[arg(long)]
    pub warmup: Option<u32>,

    /// Re-arm policy after a cooldown
    #[arg(long, value_enum)]
    pub rearm: Option<RearmPolicy>,

    /// Proximity threshold in centimetres
    #[arg(long)]
    pub threshold_cm: Option<f32>,

    /// Indicator latch time after a trigger
    #[arg(long)]
    pub cooldown_ms: Option<u64>,

    /// Main frame slot length
    #[arg(long)]
    pub slot_ms: Option<u64>,

    /// Slots per main frame
    #[arg(long)]
    pub num_slots: Option<usize>,

    /// Where range tracking runs
    #[arg(long, value_enum)]
    pub tracking: Option<TrackingMode>,

    /// Background tracker period
    #[arg(long)]
    pub track_period_ms: Option<u64>,

    /// Control endpoint port
    #[arg(long)]
    pub port: Option<u16>,
}

impl Args {
    /// Overlay the given flags on the defaults.
    pub fn into_config(self) -> AgentConfig {
        let mut c = AgentConfig::default();
        if let Some(v) = self.server {
            c.server_url = v;
        }
        if let Some(v) = self.device {
            c.device_id = v;
        }
        c.control_url = self.control_url.or(c.control_url);
        if let Some(v) = self.pir {
            c.pins.pir = v;
        }
        if let Some(v) = self.trig {
            c.pins.trigger = v;
        }
        if let Some(v) = self.echo {
            c.pins.echo = v;
        }
        if !self.led.is_empty() {
            c.pins.leds = self.led;
        }
        if self.no_buzzer {
            c.pins.buzzer = None;
        } else if let Some(v) = self.buzzer {
            c.pins.buzzer = Some(v);
        }
        if let Some(v) = self.pud {
            c.pull_mode = v;
        }
        if let Some(v) = self.warmup {
            c.pir_warmup_secs = v;
        }
        if let Some(v) = self.rearm {
            c.presence.rearm = v;
        }
        if let Some(v) = self.threshold_cm {
            c.presence.threshold_cm = v;
        }
        if let Some(v) = self.cooldown_ms {
            c.presence.cooldown_ms = v;
        }
        if let Some(v) = self.slot_ms {
            c.slot_ms = v;
        }
        if let Some(v) = self.num_slots {
            c.num_slots = v;
        }
        if let Some(v) = self.tracking {
            c.tracking_mode = v;
        }
        if let Some(v) = self.track_period_ms {
            c.track_period_ms = v;
        }
        if let Some(v) = self.port {
            c.control_port = v;
        }
        c
    }
}
