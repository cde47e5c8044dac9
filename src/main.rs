//! smallchat - Entry Point
//!
//! A multi-client TCP chat server speaking newline-delimited text.

use log::{error, info};

use smallchat::error::ChatServerError;
use smallchat::error::handlers::handle_error;
use smallchat::utils::logging::setup_logging;
use smallchat::{Server, ServerConfig};

#[tokio::main]
async fn main() {
    setup_logging();

    let config = match ServerConfig::load().map_err(ChatServerError::from) {
        Ok(config) => config,
        Err(e) => {
            handle_error(&e);
            std::process::exit(1);
        }
    };

    info!("Launching chat server...");

    let server = match Server::bind(config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            std::process::exit(1);
        }
    };

    tokio::select! {
        _ = server.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested, stopping chat server");
        }
    }
}
