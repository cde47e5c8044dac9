//! Chat protocol implementation
//!
//! Handles line classification, command dispatch, and response formatting.

pub mod commands;
pub mod handlers;
pub mod responses;

pub use commands::{Command, Message, parse_line};
pub use handlers::{CommandResult, CommandStatus, handle_command};
