//! Command handlers module for the chat server.
//!
//! Executes slash commands against the registry. Handlers never write to a
//! socket: they return what should be sent back to the caller and what should
//! be announced to everyone else.

use crate::client::{ConnectionId, Registry};
use crate::error::RegistryError;
use crate::protocol::Command;
use crate::protocol::responses;

/// Represents the outcome status of executing a command.
#[derive(Debug, PartialEq)]
pub enum CommandStatus {
    Success,
    Failure(String),
}

/// Struct encapsulating the full result of a command execution.
#[derive(Debug)]
pub struct CommandResult {
    pub status: CommandStatus,
    /// Reply line for the client that issued the command
    pub message: Option<String>,
    /// Body of a server notice for every other client
    pub notice: Option<String>,
}

/// Dispatches a parsed command to its handler.
pub async fn handle_command(
    id: ConnectionId,
    command: &Command,
    registry: &Registry,
) -> CommandResult {
    match command {
        Command::Nick(nickname) => handle_cmd_nick(id, nickname, registry).await,
        Command::Unknown(cmd) => handle_cmd_unknown(cmd),
    }
}

/// Handles `/nick`: renames the client and announces the change.
async fn handle_cmd_nick(
    id: ConnectionId,
    nickname: &str,
    registry: &Registry,
) -> CommandResult {
    match registry.rename(id, nickname).await {
        Ok(old) => CommandResult {
            status: CommandStatus::Success,
            message: Some(responses::nickname_changed(nickname)),
            notice: Some(responses::nickname_change_notice(&old, nickname)),
        },
        Err(RegistryError::NicknameTooLong { length, max }) => CommandResult {
            status: CommandStatus::Failure(format!(
                "Nickname of {} characters rejected",
                length
            )),
            message: Some(responses::nickname_too_long(max)),
            notice: None,
        },
        // Connection is being torn down concurrently
        Err(e) => CommandResult {
            status: CommandStatus::Failure(e.to_string()),
            message: None,
            notice: None,
        },
    }
}

fn handle_cmd_unknown(cmd: &str) -> CommandResult {
    CommandResult {
        status: CommandStatus::Failure(format!("Unknown command {}", cmd)),
        message: Some(responses::unknown_command(cmd)),
        notice: None,
    }
}
