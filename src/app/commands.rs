//! Inbound commands to the agent.
//!
//! These are the actions the control endpoint (or a process signal) asks
//! for.  [`SharedContext::apply_command`](super::shared::SharedContext::apply_command)
//! interprets them under the shared lock.

/// Commands that external adapters can send into the agent core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Resume sensing (`system_active := true`).
    Wake,

    /// Pause sensing (`system_active := false`).
    Sleep,

    /// Stop the agent (`shutdown_requested := true`).
    Quit,
}
