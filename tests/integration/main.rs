//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host with no real GPIO
//! required.

mod control_endpoint_tests;
mod mock_hw;
mod presence_flow_tests;
mod reporting_tests;
