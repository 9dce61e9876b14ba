//! Core engine modules - command encoding, control channel, turn gate
//!
//! These modules form the control-channel engine, independent of HTTP.

pub mod channel;
pub mod command;
pub mod gate;

// Re-exports for convenience
pub use channel::{ChannelClient, ControlReply};
pub use command::{OverlayEdit, ParamValue};
pub use gate::{AcquireError, CancelFlag, ChannelGate, Turn};
