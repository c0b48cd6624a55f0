//! Occupancy agent library.
//!
//! Exposes the pure-logic core and the host-side adapters for integration
//! testing.  Real GPIO access lives behind the `rpi` feature.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod power;
pub mod runtime;
pub mod scheduler;
pub mod sensors;

mod pins;
