//! Agent configuration parameters
//!
//! Every tunable for the occupancy agent.  Values come from process start
//! parameters (see [`crate::cli`]); anything not given falls back to
//! [`AgentConfig::default`].

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pins;

/// Highest usable BCM GPIO number on the 40-pin header.
pub const MAX_BCM_PIN: u8 = 27;

// ---------------------------------------------------------------------------
// Enumerated modes
// ---------------------------------------------------------------------------

/// How the agent becomes eligible to trigger again after a cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RearmPolicy {
    /// Re-arm when the cooldown expires; re-track at once if PIR is still high.
    Cooldown,
    /// Re-arm only on the next PIR low→high edge.
    Edge,
}

impl RearmPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cooldown => "cooldown",
            Self::Edge => "edge",
        }
    }
}

/// PIR input pull resistor selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PullMode {
    /// Start with pull-down, switch to pull-up if the line never reads high.
    Auto,
    Up,
    Down,
}

/// Where fast proximity tracking runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TrackingMode {
    /// Range tracking owns a slot in the main frame.
    Slotted,
    /// Range tracking runs in its own thread at `track_period_ms`.
    Background,
}

// ---------------------------------------------------------------------------
// Pin assignment
// ---------------------------------------------------------------------------

/// BCM pin numbers for every peripheral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinAssignment {
    pub pir: u8,
    pub trigger: u8,
    pub echo: u8,
    /// One or more indicator LEDs, all driven identically.
    pub leds: Vec<u8>,
    /// Buzzer pin (hardware PWM capable), `None` to run without one.
    pub buzzer: Option<u8>,
}

impl Default for PinAssignment {
    fn default() -> Self {
        Self {
            pir: pins::PIR_GPIO,
            trigger: pins::TRIG_GPIO,
            echo: pins::ECHO_GPIO,
            leds: vec![pins::LED_GPIO],
            buzzer: Some(pins::BUZZER_GPIO),
        }
    }
}

impl PinAssignment {
    /// Every assigned pin, in a fixed order.
    pub fn all(&self) -> Vec<u8> {
        let mut out = vec![self.pir, self.trigger, self.echo];
        out.extend_from_slice(&self.leds);
        out.extend(self.buzzer);
        out
    }

    fn validate(&self) -> Result<()> {
        if self.leds.is_empty() {
            return Err(Error::Config("at least one LED pin is required"));
        }
        let all = self.all();
        if all.iter().any(|&p| p > MAX_BCM_PIN) {
            return Err(Error::Config("pin number above BCM 27"));
        }
        for (i, p) in all.iter().enumerate() {
            if all[i + 1..].contains(p) {
                return Err(Error::Config("pin assigned twice"));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Presence tuning
// ---------------------------------------------------------------------------

/// Parameters consumed by the presence state machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresenceConfig {
    pub rearm: RearmPolicy,
    /// A reading at or below this distance satisfies proximity.
    pub threshold_cm: f32,
    /// How long actuators stay latched after a trigger.
    pub cooldown_ms: u64,
    /// Consecutive qualifying samples needed to trigger (K).
    pub debounce_samples: u8,
    /// Valid measuring window; readings outside it count as absent.
    pub dist_min_cm: f32,
    pub dist_max_cm: f32,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            rearm: RearmPolicy::Cooldown,
            threshold_cm: 150.0,
            cooldown_ms: 3000,
            debounce_samples: 2,
            dist_min_cm: 2.0,
            dist_max_cm: 400.0,
        }
    }
}

impl PresenceConfig {
    /// True if `cm` lies inside the valid measuring window.
    pub fn in_window(&self, cm: f32) -> bool {
        cm >= self.dist_min_cm && cm <= self.dist_max_cm
    }

    fn validate(&self) -> Result<()> {
        if self.debounce_samples == 0 {
            return Err(Error::Config("debounce_samples must be at least 1"));
        }
        if self.dist_min_cm >= self.dist_max_cm {
            return Err(Error::Config("dist_min_cm must be below dist_max_cm"));
        }
        if !self.in_window(self.threshold_cm) {
            return Err(Error::Config("threshold_cm outside the distance window"));
        }
        if self.cooldown_ms == 0 {
            return Err(Error::Config("cooldown_ms must be non-zero"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AgentConfig
// ---------------------------------------------------------------------------

/// Core agent configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    // --- Remote status service ---
    /// Base URL of the status service, e.g. `http://10.0.0.5:5000`.
    pub server_url: String,
    pub device_id: String,
    /// URL the status service should use to reach our control endpoint.
    pub control_url: Option<String>,
    pub http_timeout_ms: u64,
    pub power_poll_interval_ms: u64,
    /// Sends per second allowed for each report category.
    pub report_rate_per_sec: u64,

    // --- Hardware ---
    pub pins: PinAssignment,
    pub pull_mode: PullMode,
    pub pir_warmup_secs: u32,

    // --- Presence ---
    pub presence: PresenceConfig,
    /// Echo wait ceiling, applied separately to the rise and the fall.
    pub echo_timeout_us: u64,
    /// Every Nth tracking sample is a median (0 disables).
    pub median_every: u32,
    pub median_samples: usize,

    // --- Actuators ---
    pub min_on_ms: u64,
    pub min_off_ms: u64,
    pub buzzer_duty_percent: u8,
    pub buzzer_pwm_hz: f64,

    // --- Timing ---
    pub slot_ms: u64,
    pub num_slots: usize,
    pub tracking_mode: TrackingMode,
    pub track_period_ms: u64,
    pub heartbeat_ms: u64,

    // --- Control endpoint ---
    pub control_port: u16,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            device_id: "chair1".into(),
            control_url: None,
            http_timeout_ms: 2500,
            power_poll_interval_ms: 3000,
            report_rate_per_sec: 1,

            pins: PinAssignment::default(),
            pull_mode: PullMode::Auto,
            pir_warmup_secs: 45,

            presence: PresenceConfig::default(),
            echo_timeout_us: 40_000,
            median_every: 5,
            median_samples: 3,

            min_on_ms: 250,
            min_off_ms: 250,
            buzzer_duty_percent: 10,
            buzzer_pwm_hz: 2000.0,

            slot_ms: 50,   // 4 slots -> 200 ms frame
            num_slots: 4,
            tracking_mode: TrackingMode::Background,
            track_period_ms: 100, // 10 Hz
            heartbeat_ms: 1000,

            control_port: 8088,
        }
    }
}

impl AgentConfig {
    /// Reject configurations that would start the hardware in an
    /// inconsistent state.
    pub fn validate(&self) -> Result<()> {
        if self.device_id.trim().is_empty() {
            return Err(Error::Config("device id must not be empty"));
        }
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(Error::Config("server url must start with http:// or https://"));
        }
        self.pins.validate()?;
        self.presence.validate()?;
        if self.buzzer_duty_percent > 100 {
            return Err(Error::Config("buzzer duty above 100%"));
        }
        if self.track_period_ms == 0 {
            return Err(Error::Config("track_period_ms must be non-zero"));
        }
        Ok(())
    }

    /// Base URL without a trailing slash.
    pub fn server_base(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let c = AgentConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.presence.rearm, RearmPolicy::Cooldown);
        assert_eq!(c.pins.all(), vec![17, 23, 24, 25, 18]);
    }

    #[test]
    fn serde_roundtrip() {
        let c = AgentConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: AgentConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c, c2);
        assert!(json.contains("\"rearm\":\"cooldown\""));
    }

    #[test]
    fn duplicate_pin_rejected() {
        let mut c = AgentConfig::default();
        c.pins.leds = vec![25, 23];
        assert_eq!(c.validate(), Err(Error::Config("pin assigned twice")));
    }

    #[test]
    fn pin_above_header_rejected() {
        let mut c = AgentConfig::default();
        c.pins.echo = 40;
        assert!(matches!(c.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn empty_led_list_rejected() {
        let mut c = AgentConfig::default();
        c.pins.leds.clear();
        assert!(c.validate().is_err());
    }

    #[test]
    fn threshold_must_sit_inside_window() {
        let mut c = AgentConfig::default();
        c.presence.threshold_cm = 500.0;
        assert!(c.validate().is_err());
        c.presence.threshold_cm = 150.0;
        c.presence.dist_min_cm = 400.0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn zero_debounce_rejected() {
        let mut c = AgentConfig::default();
        c.presence.debounce_samples = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn server_url_scheme_checked() {
        let mut c = AgentConfig::default();
        c.server_url = "10.0.0.5:5000".into();
        assert!(c.validate().is_err());
        c.server_url = "http://10.0.0.5:5000/".into();
        assert!(c.validate().is_ok());
        assert_eq!(c.server_base(), "http://10.0.0.5:5000");
    }

    #[test]
    fn timing_ratios_make_sense() {
        let c = AgentConfig::default();
        assert!(c.track_period_ms < c.slot_ms * c.num_slots as u64);
        assert!(c.echo_timeout_us / 1000 < c.track_period_ms);
        assert!(c.slot_ms * (c.num_slots as u64) < c.heartbeat_ms);
    }
}
