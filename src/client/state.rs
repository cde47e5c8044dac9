//! Module `state`
//!
//! Defines the connection handle and the per-client data kept in the registry.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Notify, mpsc};

use crate::error::DeliveryError;

/// Sending side of a connection's bounded outbound line queue.
///
/// Every line queued here is written to the socket by that connection's
/// writer task, in order. A full queue marks the connection as stalled.
#[derive(Debug, Clone)]
pub struct Outbound {
    lines: mpsc::Sender<String>,
    stalled: Arc<Notify>,
}

impl Outbound {
    /// Creates a queue holding at most `capacity` pending lines.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (lines, receiver) = mpsc::channel(capacity);
        let outbound = Self {
            lines,
            stalled: Arc::new(Notify::new()),
        };
        (outbound, receiver)
    }

    /// Queues a line without waiting.
    ///
    /// A full queue wakes whoever waits in [`Outbound::stalled`].
    pub fn deliver(&self, line: String) -> Result<(), DeliveryError> {
        match self.lines.try_send(line) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.stalled.notify_one();
                Err(DeliveryError::Stalled)
            }
            Err(TrySendError::Closed(_)) => Err(DeliveryError::Closed),
        }
    }

    /// Resolves once a delivery found the queue full.
    pub async fn stalled(&self) {
        self.stalled.notified().await
    }
}

/// Opaque, unique handle to a live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

/// Hands out connection handles, never reusing one.
#[derive(Debug)]
pub struct ConnectionIdAllocator {
    next: AtomicU64,
}

impl Default for ConnectionIdAllocator {
    fn default() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }
}

impl ConnectionIdAllocator {
    pub fn next_id(&self) -> ConnectionId {
        ConnectionId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Represents a registered chat client.
#[derive(Debug, Clone)]
pub struct ClientEntry {
    nickname: String,
    peer: SocketAddr,
    outbound: Outbound,
}

impl ClientEntry {
    /// Creates an entry with the default nickname derived from the peer port.
    pub fn new(peer: SocketAddr, outbound: Outbound) -> Self {
        Self {
            nickname: default_nickname(&peer),
            peer,
            outbound,
        }
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn outbound(&self) -> &Outbound {
        &self.outbound
    }

    /// Replaces the nickname, returning the previous one.
    pub(crate) fn replace_nickname(&mut self, nickname: String) -> String {
        std::mem::replace(&mut self.nickname, nickname)
    }
}

/// Default nickname for a fresh connection: `user<port>`.
pub fn default_nickname(peer: &SocketAddr) -> String {
    format!("user{}", peer.port())
}

/// Nickname length as users count it.
pub fn nickname_length(nickname: &str) -> usize {
    nickname.chars().count()
}
