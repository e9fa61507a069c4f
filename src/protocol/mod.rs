//! Console protocol implementation
//!
//! Handles command parsing, dispatch to the core operations, and response
//! generation.

pub mod commands;
pub mod handlers;
pub mod responses;

pub use commands::{Command, CommandData, CommandResult, CommandStatus, parse_command};
pub use handlers::{handle_command, handle_upload};
