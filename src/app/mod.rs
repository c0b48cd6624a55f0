//! Application core: domain logic behind port traits.
//!
//! Presence orchestration, the shared lock, and the slot tasks for each
//! execution context.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod shared;
