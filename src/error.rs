//! Unified error types for the occupancy agent.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! startup path and the slot tasks uniform.  All variants are `Copy` so they
//! can be handed across the shared lock and into events without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level agent error
// ---------------------------------------------------------------------------

/// Every fallible operation in the agent funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read.
    Sensor(SensorError),
    /// An actuator command failed.
    Actuator(ActuatorError),
    /// The status service could not be reached or answered badly.
    Comms(CommsError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Range faults
// ---------------------------------------------------------------------------

/// Outcome of a failed ultrasonic measurement.
///
/// Faults are non-fatal: the caller treats them as "no data this tick".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeFault {
    /// Echo line never rose after the trigger pulse.
    EchoLowTimeout,
    /// Echo line rose but never fell again.
    EchoHighTimeout,
    /// Every median sample fell outside the valid distance window.
    OutOfRange,
    /// Driving the trigger or reading the echo GPIO failed.
    PinError,
}

impl RangeFault {
    /// Operator hint logged alongside the fault.
    pub fn hint(self) -> &'static str {
        match self {
            Self::EchoLowTimeout => "check sensor power/wiring",
            Self::EchoHighTimeout => "check echo level shifter / divider",
            Self::OutOfRange => "nothing inside the measuring window",
            Self::PinError => "trigger/echo GPIO access failed",
        }
    }
}

impl fmt::Display for RangeFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EchoLowTimeout => write!(f, "no echo (low timeout)"),
            Self::EchoHighTimeout => write!(f, "no echo (high timeout)"),
            Self::OutOfRange => write!(f, "no sample in range"),
            Self::PinError => write!(f, "rangefinder pin error"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// GPIO read returned an error.
    GpioReadFailed,
    /// Switching the PIR pull resistor failed.
    PullSelectFailed,
    /// Ultrasonic measurement failed.
    Range(RangeFault),
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioReadFailed => write!(f, "GPIO read failed"),
            Self::PullSelectFailed => write!(f, "pull resistor select failed"),
            Self::Range(fault) => write!(f, "range: {fault}"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

impl From<RangeFault> for Error {
    fn from(e: RangeFault) -> Self {
        Self::Sensor(SensorError::Range(e))
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO set failed.
    GpioWriteFailed,
    /// Buzzer duty-cycle write failed.
    PwmWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
            Self::PwmWriteFailed => write!(f, "PWM write failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// The request exceeded the HTTP timeout.
    Timeout,
    /// The status service refused or dropped the connection.
    Connect,
    /// The status service answered with a non-2xx status.
    Status(u16),
    /// The response body could not be decoded.
    Decode,
    /// Any other request failure.
    Request,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "request timed out"),
            Self::Connect => write!(f, "connection failed"),
            Self::Status(code) => write!(f, "HTTP {code}"),
            Self::Decode => write!(f, "response decode failed"),
            Self::Request => write!(f, "request failed"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Agent-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
