use log::{debug, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc;

use crate::client::{ClientEntry, ConnectionId, Outbound, Registry, Session, broadcast};
use crate::config::ServerConfig;
use crate::error::{ChatServerError, RegistryError};
use crate::protocol::responses::{self, SERVER_LABEL};
use crate::protocol::{CommandStatus, Message, handle_command, parse_line};

/// Handles a chat client session using Tokio async runtime.
///
/// - Registers the client under its default nickname and sends the welcome banner.
/// - Reads newline-terminated lines of at most `max_line_length` bytes and dispatches them.
/// - Socket writes happen in a separate writer task fed by the client's outbound queue.
/// - On end of input, I/O error or a stalled outbound queue, unregisters the client
///   and announces the departure.
pub async fn handle_client(
    stream: TcpStream,
    id: ConnectionId,
    peer: SocketAddr,
    registry: Arc<Registry>,
    config: Arc<ServerConfig>,
) -> Result<(), ChatServerError> {
    let mut session = Session::new(id, peer);
    let (read_half, mut write_half) = stream.into_split();
    let (outbound, inbound) = Outbound::channel(config.outbound_queue_size);

    if let Err(e) = registry
        .register(id, ClientEntry::new(peer, outbound.clone()))
        .await
    {
        if matches!(e, RegistryError::ServerFull { .. }) {
            let _ = write_half.write_all(responses::SERVER_FULL.as_bytes()).await;
        }
        let _ = write_half.shutdown().await;
        session.close();
        return Err(e.into());
    }

    let mut writer = tokio::spawn(write_lines(id, write_half, inbound));
    let _ = outbound.deliver(responses::WELCOME.to_string());
    session.activate();
    info!("Client {} connected from {}", session.id(), session.peer());

    let max_line_length = config.max_line_length;
    let mut reader = BufReader::new(read_half);
    let mut buf = Vec::new();
    // Set while the tail of a rejected line is being skipped
    let mut discarding = false;
    let mut stalled = false;

    while session.is_active() {
        buf.clear();
        tokio::select! {
            read = read_bounded_line(&mut reader, &mut buf, max_line_length) => match read {
                Ok(0) => {
                    info!("Connection closed by client {}", session.peer());
                    session.close();
                }
                Ok(_) => {
                    let complete = buf.last() == Some(&b'\n');
                    if discarding {
                        discarding = !complete;
                    } else if !complete && buf.len() > max_line_length {
                        debug!("{} sent an overlong line", session.id());
                        discarding = true;
                        let _ = outbound.deliver(responses::line_too_long(max_line_length));
                    } else {
                        let line = String::from_utf8_lossy(&buf);
                        process_line(session.id(), &line, &registry, &outbound).await;
                    }
                }
                Err(e) => {
                    warn!("Failed to read from {}: {}", session.peer(), e);
                    session.close();
                }
            },
            _ = &mut writer => {
                warn!("Output to {} failed, closing connection", session.peer());
                session.close();
            }
            _ = outbound.stalled() => {
                warn!("{} stopped reading, closing connection", session.peer());
                stalled = true;
                session.close();
            }
        }
    }

    if stalled {
        writer.abort();
    }

    if let Some(nickname) = registry.unregister(id).await {
        info!("Client left: {}", nickname);
        broadcast(
            &registry,
            None,
            SERVER_LABEL,
            &responses::departure_notice(&nickname),
        )
        .await;
    }

    Ok(())
}

/// Reads up to and including the next `\n`, but never more than `limit + 1` bytes.
///
/// A result without a trailing `\n` that is longer than `limit` is the head of
/// an oversized line.
async fn read_bounded_line<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    limit: usize,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    reader.take(limit as u64 + 1).read_until(b'\n', buf).await
}

/// Classifies one inbound line and acts on it.
async fn process_line(id: ConnectionId, raw: &str, registry: &Registry, outbound: &Outbound) {
    match parse_line(raw) {
        Message::Empty => {}
        Message::Chat(text) => match registry.get(id).await {
            Some(nickname) => {
                broadcast(registry, Some(id), &nickname, &text).await;
            }
            None => debug!("Dropping message from unregistered {}", id),
        },
        Message::Command(command) => {
            debug!("Received from {}: {:?}", id, command);
            let result = handle_command(id, &command, registry).await;

            match &result.status {
                CommandStatus::Success => info!("{}: {:?} succeeded", id, command),
                CommandStatus::Failure(reason) => debug!("{}: {}", id, reason),
            }
            if let Some(msg) = result.message {
                let _ = outbound.deliver(msg);
            }
            if let Some(notice) = result.notice {
                broadcast(registry, Some(id), SERVER_LABEL, &notice).await;
            }
        }
    }
}

/// Drains a client's outbound queue into its socket.
///
/// Ends when every sender is dropped or on the first write error.
async fn write_lines(
    id: ConnectionId,
    mut write_half: OwnedWriteHalf,
    mut inbound: mpsc::Receiver<String>,
) {
    while let Some(line) = inbound.recv().await {
        if let Err(e) = write_half.write_all(line.as_bytes()).await {
            warn!("Failed to write to {}: {}", id, e);
            return;
        }
    }
    let _ = write_half.shutdown().await;
}
