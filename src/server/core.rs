use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};

use crate::client::Registry;
use crate::client::handle_client;
use crate::client::state::ConnectionIdAllocator;
use crate::config::ServerConfig;
use crate::error::ChatServerError;
use crate::error::handlers::handle_error;

pub struct Server {
    registry: Arc<Registry>,
    listener: TcpListener,
    config: Arc<ServerConfig>,
    ids: ConnectionIdAllocator,
}

impl Server {
    /// Binds the listener described by `config`. Failing to bind is fatal.
    pub async fn bind(config: ServerConfig) -> Result<Self, ChatServerError> {
        let address = config.listen_socket();

        let listener = match TcpListener::bind(&address).await {
            Ok(listener) => {
                info!("Server bound to {}", address);
                listener
            }
            Err(source) => {
                error!("Failed to bind to {}: {}", address, source);
                return Err(ChatServerError::Bind { address, source });
            }
        };

        let registry = Registry::new(config.max_nick_length, config.client_limit());

        Ok(Self {
            registry: Arc::new(registry),
            listener,
            config: Arc::new(config),
            ids: ConnectionIdAllocator::default(),
        })
    }

    /// Address the listener is actually bound to
    pub fn local_addr(&self) -> Result<SocketAddr, ChatServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Accepts connections forever, one task per client.
    pub async fn run(&self) {
        match self.config.client_limit() {
            Some(limit) => info!(
                "Starting chat server on {} (max {} clients)",
                self.config.listen_socket(),
                limit
            ),
            None => info!("Starting chat server on {}", self.config.listen_socket()),
        }

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => self.spawn_client(stream, addr),
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                }
            }
        }
    }

    fn spawn_client(&self, stream: TcpStream, addr: SocketAddr) {
        let id = self.ids.next_id();
        let registry = Arc::clone(&self.registry);
        let config = Arc::clone(&self.config);

        // Spawn a task for each client so accept loop doesn't block
        tokio::spawn(async move {
            if let Err(e) = handle_client(stream, id, addr, registry, config).await {
                handle_error(&e);
            }
        });
    }
}
