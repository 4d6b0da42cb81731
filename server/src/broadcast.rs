//! Best-effort fan-out of a line to every registered connection

use crate::registry::{ConnectionId, Registry};
use log::warn;

/// Outcome of a single broadcast, counted per recipient
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Sends `message` to every registered connection except `excluding`
///
/// Only the snapshot is taken under the registry lock; the writes happen
/// afterwards, one recipient at a time. A failed write is logged and counted
/// but neither aborts the fan-out nor unregisters the recipient. Its own
/// session notices the broken socket and cleans up.
pub async fn broadcast(
    registry: &Registry,
    message: &str,
    excluding: Option<ConnectionId>,
) -> BroadcastReport {
    let recipients = registry.snapshot();
    let mut report = BroadcastReport::default();

    for member in recipients {
        if Some(member.connection.id()) == excluding {
            continue;
        }

        match member.connection.send(message).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                warn!(
                    "Failed to send to {} ({}): {}",
                    member.nickname,
                    member.connection.peer(),
                    e
                );
                report.failed += 1;
            }
        }
    }

    report
}
