//! Broadcast primitive
//!
//! Fans a line out to every registered client. Delivery is per-recipient
//! fire-and-forget: lines are queued on each recipient's bounded outbound
//! queue and written by that recipient's own writer task. A recipient whose
//! queue is full is signalled as stalled and disconnects itself.

use log::{debug, warn};

use crate::client::{ConnectionId, Registry};
use crate::error::DeliveryError;
use crate::protocol::responses::format_line;

/// Sends `<label>: <body>` to every client in a registry snapshot except `origin`.
///
/// Returns the number of recipients the line was queued for.
pub async fn broadcast(
    registry: &Registry,
    origin: Option<ConnectionId>,
    label: &str,
    body: &str,
) -> usize {
    let line = format_line(label, body);
    let recipients = registry.snapshot().await;

    let mut delivered = 0;
    for (id, entry) in recipients {
        if Some(id) == origin {
            continue;
        }
        match entry.outbound().deliver(line.clone()) {
            Ok(()) => delivered += 1,
            Err(DeliveryError::Stalled) => {
                warn!("{} ({}) is not reading, dropping it", id, entry.peer())
            }
            Err(DeliveryError::Closed) => {
                debug!("Skipping {} ({}): connection closing", id, entry.nickname())
            }
        }
    }
    delivered
}
