//! Directed and broadcast delivery, built on top of the [`Registry`].
//!
//! Both operations here only ever touch the registry (to resolve ids to
//! outbound senders) and per-session outbound channels (to enqueue); they
//! never perform socket I/O themselves — that's the writer half of each
//! session's own task. That split is what lets `broadcast` stay fast and
//! non-blocking even when one peer's socket is backed up: a full queue
//! just means `try_send` returns an error for that one peer, not that the
//! broadcaster waits on it.

use crate::error::RouteError;
use crate::id::PeerId;
use crate::protocol::OutboundMessage;
use crate::registry::Registry;

#[cfg(test)]
use crate::protocol::OutboundFrame;

/// Route a single frame to exactly one peer.
///
/// FIFO for a given (source, destination) pair falls out for free: the
/// caller (a session's single-threaded dispatch loop) calls this
/// sequentially, and `mpsc::Sender::try_send` from one producer preserves
/// submission order into the destination's queue.
pub fn send_to(registry: &Registry, target: &PeerId, frame: OutboundMessage) -> Result<(), RouteError> {
    let Some((_, sender)) = registry.sender_for(target) else {
        return Err(RouteError::NoSuchPeer(target.clone()));
    };
    sender
        .try_send(frame)
        .map_err(|_| RouteError::NotReady(target.clone()))
}

/// Deliver `frame` to every live peer except `except`. Per-peer failures
/// (full queue, already torn down) are swallowed: the target's own session
/// will notice its socket is gone and tear itself down independently.
/// Broadcast itself never fails.
pub fn broadcast(registry: &Registry, frame: OutboundMessage, except: Option<&str>) {
    for (_, sender) in registry.senders_except(except) {
        let _ = sender.try_send(frame.clone());
    }
}
