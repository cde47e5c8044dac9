//! Chat response formatting
//!
//! Every server-to-client line, terminated with `\n`.

/// Sender label used for server notices
pub const SERVER_LABEL: &str = "Server";

pub const WELCOME: &str = "Welcome Simple Chat! Use /nick to change nick name.\n";
pub const SERVER_FULL: &str = "Server is full. Try again later.\n";

/// Format a broadcast line: `<label>: <body>\n`
pub fn format_line(label: &str, body: &str) -> String {
    format!("{}: {}\n", label, body)
}

pub fn nickname_changed(nickname: &str) -> String {
    format!("Your nickname has been changed to: {}\n", nickname)
}

pub fn nickname_too_long(max: usize) -> String {
    format!(
        "Nickname is too long. Maximum length is {} characters.\n",
        max
    )
}

pub fn line_too_long(max: usize) -> String {
    format!("Line is too long. Maximum length is {} bytes.\n", max)
}

pub fn unknown_command(cmd: &str) -> String {
    format!("Unknown command: {}\n", cmd)
}

/// Body of the server notice sent when a client renames
pub fn nickname_change_notice(old: &str, new: &str) -> String {
    format!("{} changed nickname to {}", old, new)
}

/// Body of the server notice sent when a client disconnects
pub fn departure_notice(nickname: &str) -> String {
    format!("{} left the chat", nickname)
}
