//! Signal conditioning between the presence machine and the outputs.

pub mod debounce;
pub mod latch;
