//! Module `commands`
//!
//! Classifies a received line as empty, chat, or command, and parses commands.

/// A single inbound line after trimming.
#[derive(Debug, PartialEq)]
pub enum Message {
    Empty,
    Chat(String),
    Command(Command),
}

/// Represents a slash command parsed from the client input.
#[derive(Debug, PartialEq)]
pub enum Command {
    /// `/nick <name>`; the name is trimmed and never empty
    Nick(String),
    /// Any other command, or `/nick` without an argument. Holds the command token.
    Unknown(String),
}

/// Parses a raw line received from a client.
///
/// Surrounding whitespace (including a trailing `\r`) is ignored. Commands are
/// split on the first space into the command token and its argument.
pub fn parse_line(raw: &str) -> Message {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Message::Empty;
    }
    if !trimmed.starts_with('/') {
        return Message::Chat(trimmed.to_string());
    }

    let mut parts = trimmed.splitn(2, ' ');
    let cmd = parts.next().unwrap_or("");
    let arg = parts.next().unwrap_or("").trim();

    let command = match cmd {
        "/nick" if !arg.is_empty() => Command::Nick(arg.to_string()),
        _ => Command::Unknown(cmd.to_string()),
    };
    Message::Command(command)
}
