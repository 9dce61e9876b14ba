//! CHYRON - Overlay control gateway library
//!
//! Re-exports all modules for use by binary targets.

// Core engine (command encoding, control channel, turn gate)
pub mod core;

// App modules
pub mod auth;
pub mod cli;
pub mod config;
pub mod paths;
pub mod server;

// Re-export commonly used types from core
pub use core::channel::{ChannelClient, ControlReply};
pub use core::command::{OverlayEdit, ParamValue};
pub use core::gate::{AcquireError, CancelFlag, ChannelGate};

// Re-export app types
pub use config::Settings;
pub use server::Gateway;
