//! Actuator drivers.

pub mod indicator;

pub use indicator::IndicatorBank;
