//! Sensor drivers: PIR motion input, HC-SR04 rangefinder, and the wireless
//! link probe used for report telemetry.
//!
//! The drivers are generic over `embedded-hal` traits so the same code runs
//! against rppal pins on the Pi and against mocks in tests.

pub mod pir;
pub mod rssi;
pub mod ultrasonic;

pub use pir::PirSensor;
pub use rssi::WirelessProbe;
pub use ultrasonic::RangeFinder;
