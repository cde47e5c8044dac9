//! Error types
//!
//! Defines domain-specific error types for the registry and the server.

use std::fmt;
use std::io;

use crate::client::ConnectionId;

/// Connection registry errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The connection is already registered. Never expected in normal flow.
    DuplicateConnection(ConnectionId),
    NicknameTooLong { length: usize, max: usize },
    ClientNotFound(ConnectionId),
    ServerFull { capacity: usize },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateConnection(id) => {
                write!(f, "Connection already registered: {}", id)
            }
            RegistryError::NicknameTooLong { length, max } => {
                write!(f, "Nickname too long: {} characters (max {})", length, max)
            }
            RegistryError::ClientNotFound(id) => write!(f, "Client not found: {}", id),
            RegistryError::ServerFull { capacity } => {
                write!(f, "Server full: {} clients connected", capacity)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Failure to queue a line for a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// The client's queue is full; it is not reading fast enough
    Stalled,
    /// The client's writer is gone
    Closed,
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryError::Stalled => write!(f, "Outbound queue full"),
            DeliveryError::Closed => write!(f, "Connection closing"),
        }
    }
}

impl std::error::Error for DeliveryError {}

/// General chat server error that encompasses all error types
#[derive(Debug)]
pub enum ChatServerError {
    Registry(RegistryError),
    Config(config::ConfigError),
    Bind { address: String, source: io::Error },
    IoError(io::Error),
}

impl fmt::Display for ChatServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatServerError::Registry(e) => write!(f, "Registry error: {}", e),
            ChatServerError::Config(e) => write!(f, "Configuration error: {}", e),
            ChatServerError::Bind { address, source } => {
                write!(f, "Failed to bind to {}: {}", address, source)
            }
            ChatServerError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ChatServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChatServerError::Registry(e) => Some(e),
            ChatServerError::Config(e) => Some(e),
            ChatServerError::Bind { source, .. } => Some(source),
            ChatServerError::IoError(e) => Some(e),
        }
    }
}

impl From<RegistryError> for ChatServerError {
    fn from(error: RegistryError) -> Self {
        ChatServerError::Registry(error)
    }
}

impl From<config::ConfigError> for ChatServerError {
    fn from(error: config::ConfigError) -> Self {
        ChatServerError::Config(error)
    }
}

impl From<io::Error> for ChatServerError {
    fn from(error: io::Error) -> Self {
        ChatServerError::IoError(error)
    }
}
