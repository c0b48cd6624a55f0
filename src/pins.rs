//! Default BCM pin assignments for the sensor board.
//!
//! Single source of truth for the wiring defaults; every one of them can be
//! overridden from the command line.

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// PIR motion sensor digital output.
pub const PIR_GPIO: u8 = 17;

/// HC-SR04 trigger (output).
pub const TRIG_GPIO: u8 = 23;
/// HC-SR04 echo (input).  The sensor drives 5 V; wire it through a divider.
pub const ECHO_GPIO: u8 = 24;

// ---------------------------------------------------------------------------
// Indicators
// ---------------------------------------------------------------------------

pub const LED_GPIO: u8 = 25;

/// Buzzer on a hardware-PWM capable pin (PWM0 on BCM 18).
pub const BUZZER_GPIO: u8 = 18;
