//! Client registry
//!
//! The only shared mutable state of the server: a map from connection handle
//! to client entry. Every operation takes the lock once and releases it before
//! returning, so callers never hold it across socket I/O.

use std::collections::HashMap;

use log::debug;
use tokio::sync::Mutex;

use crate::client::state::{ClientEntry, ConnectionId, nickname_length};
use crate::error::RegistryError;

/// Registry for tracking active clients
pub struct Registry {
    clients: Mutex<HashMap<ConnectionId, ClientEntry>>,
    max_nick_length: usize,
    capacity: Option<usize>,
}

impl Registry {
    /// Creates an empty registry. `capacity` of `None` means unlimited.
    pub fn new(max_nick_length: usize, capacity: Option<usize>) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            max_nick_length,
            capacity,
        }
    }

    fn check_nickname(&self, nickname: &str) -> Result<(), RegistryError> {
        let length = nickname_length(nickname);
        if length > self.max_nick_length {
            return Err(RegistryError::NicknameTooLong {
                length,
                max: self.max_nick_length,
            });
        }
        Ok(())
    }

    /// Adds a client entry.
    pub async fn register(
        &self,
        id: ConnectionId,
        entry: ClientEntry,
    ) -> Result<(), RegistryError> {
        self.check_nickname(entry.nickname())?;

        let mut clients = self.clients.lock().await;
        if clients.contains_key(&id) {
            return Err(RegistryError::DuplicateConnection(id));
        }
        if let Some(capacity) = self.capacity {
            if clients.len() >= capacity {
                return Err(RegistryError::ServerFull { capacity });
            }
        }

        debug!("Registered {} from {} as {}", id, entry.peer(), entry.nickname());
        clients.insert(id, entry);
        Ok(())
    }

    /// Removes a client, returning its last nickname.
    ///
    /// Returns `None` if the client was already removed.
    pub async fn unregister(&self, id: ConnectionId) -> Option<String> {
        let removed = self.clients.lock().await.remove(&id);
        removed.map(|entry| {
            debug!("Unregistered {} ({})", id, entry.nickname());
            entry.nickname().to_string()
        })
    }

    /// Changes a client's nickname, returning the previous one.
    ///
    /// A rejected nickname leaves the entry untouched.
    pub async fn rename(
        &self,
        id: ConnectionId,
        nickname: &str,
    ) -> Result<String, RegistryError> {
        self.check_nickname(nickname)?;

        let mut clients = self.clients.lock().await;
        match clients.get_mut(&id) {
            Some(entry) => Ok(entry.replace_nickname(nickname.to_string())),
            None => Err(RegistryError::ClientNotFound(id)),
        }
    }

    /// Point-in-time copy of every registered client.
    pub async fn snapshot(&self) -> Vec<(ConnectionId, ClientEntry)> {
        self.clients
            .lock()
            .await
            .iter()
            .map(|(id, entry)| (*id, entry.clone()))
            .collect()
    }

    /// Current nickname of a client.
    pub async fn get(&self, id: ConnectionId) -> Option<String> {
        self.clients
            .lock()
            .await
            .get(&id)
            .map(|entry| entry.nickname().to_string())
    }

    pub async fn len(&self) -> usize {
        self.clients.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.lock().await.is_empty()
    }
}
