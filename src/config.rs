//! Configuration management for smallchat
//!
//! Values are layered: built-in defaults, then an optional `config.toml` in the
//! working directory, then `SMALLCHAT_*` environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8972;
pub const DEFAULT_MAX_NICK_LENGTH: usize = 32;
pub const DEFAULT_MAX_CLIENTS: usize = 1000;
pub const DEFAULT_MAX_LINE_LENGTH: usize = 4096;
pub const DEFAULT_OUTBOUND_QUEUE_SIZE: usize = 256;

/// Server configuration, loaded once at startup
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// IP address the chat listener binds to
    /// Environment: SMALLCHAT_BIND_ADDRESS
    pub bind_address: String,

    /// Port for the chat listener
    /// Environment: SMALLCHAT_PORT
    pub port: u16,

    /// Maximum nickname length in characters
    /// Environment: SMALLCHAT_MAX_NICK_LENGTH
    pub max_nick_length: usize,

    /// Maximum concurrent clients, 0 for no limit
    /// Environment: SMALLCHAT_MAX_CLIENTS
    pub max_clients: usize,

    /// Maximum inbound line length in bytes, excluding the terminating `\n`
    /// Environment: SMALLCHAT_MAX_LINE_LENGTH
    pub max_line_length: usize,

    /// Lines queued per client before it is dropped as stalled
    /// Environment: SMALLCHAT_OUTBOUND_QUEUE_SIZE
    pub outbound_queue_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            max_nick_length: DEFAULT_MAX_NICK_LENGTH,
            max_clients: DEFAULT_MAX_CLIENTS,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            outbound_queue_size: DEFAULT_OUTBOUND_QUEUE_SIZE,
        }
    }
}

impl ServerConfig {
    /// Load configuration from config.toml (optional) with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from the given file stem, e.g. `"config"` for `config.toml`
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("max_nick_length", DEFAULT_MAX_NICK_LENGTH as i64)?
            .set_default("max_clients", DEFAULT_MAX_CLIENTS as i64)?
            .set_default("max_line_length", DEFAULT_MAX_LINE_LENGTH as i64)?
            .set_default("outbound_queue_size", DEFAULT_OUTBOUND_QUEUE_SIZE as i64)?
            .add_source(File::with_name(config_path).required(false))
            .add_source(Environment::with_prefix("SMALLCHAT").try_parsing(true))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::Message("bind_address cannot be empty".into()));
        }

        if self.max_nick_length == 0 {
            return Err(ConfigError::Message(
                "max_nick_length must be greater than 0".into(),
            ));
        }

        if self.max_line_length < self.max_nick_length {
            return Err(ConfigError::Message(
                "max_line_length cannot be smaller than max_nick_length".into(),
            ));
        }

        if self.outbound_queue_size == 0 {
            return Err(ConfigError::Message(
                "outbound_queue_size must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Bind address and port as a socket address string
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Client capacity, `None` when unlimited
    pub fn client_limit(&self) -> Option<usize> {
        (self.max_clients > 0).then_some(self.max_clients)
    }
}
