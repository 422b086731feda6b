//! JSON-lines bridge between the action-button core and its host.
//!
//! Architecture:
//! - Line reader thread: parses commands from stdin, forwards them over a
//!   bounded channel
//! - Dispatch loop: runs each command against the shared [`ActionButtons`]
//!   service and answers on stdout
//! - Host collaborators: effect chains go out as `process-effects` events and
//!   the click waits for `action-buttons:effects-finished`; chat panels go out
//!   as `chatUpdate` events
//!
//! Protocol:
//! - Each line is a JSON object
//! - Events (bridge → host): {"event": "...", ...}
//! - Commands (host → bridge): {"cmd": "...", ...}
//!
//! [`ActionButtons`]: crate::buttons::ActionButtons

mod protocol;
mod router;
mod session;

#[cfg(test)]
mod tests;

pub use protocol::{IpcCommand, IpcEvent};
pub use session::{run_bridge, run_ipc_mode, EventWriter, IpcEffectRunner};
