// Gateway module - per-remote-chain message plumbing
// Emits outbound transfer messages and runs the inbound confirm-then-execute
// state machine keyed by message hash.

mod confirm;
mod link;

pub use confirm::{ConfirmPolicy, ConfirmSet, RelayPath};
pub use link::{Gateway, GatewayError, GatewayEvent};
