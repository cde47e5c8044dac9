//! Error handlers
//!
//! Reports errors that end a connection's task.

use crate::error::types::{ChatServerError, RegistryError};
use log::{error, info, warn};

/// Log an error raised by a connection task at a level matching its kind
pub fn handle_error(err: &ChatServerError) {
    match err {
        ChatServerError::Registry(RegistryError::ServerFull { .. }) => info!("{}", err),
        ChatServerError::Registry(RegistryError::DuplicateConnection(_)) => {
            error!("Chat server error: {}", err)
        }
        ChatServerError::Registry(_) | ChatServerError::IoError(_) => warn!("{}", err),
        ChatServerError::Config(_) | ChatServerError::Bind { .. } => {
            error!("Chat server error: {}", err)
        }
    }
}
