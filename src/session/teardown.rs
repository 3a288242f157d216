//! `closing` → `closed` (§4.4).
//!
//! `Registry::remove` returning `true` is the only signal teardown acts
//! on, which is what makes calling this twice (once from a read error,
//! once from a concurrently-firing close) safe: the second call finds
//! nothing to remove and emits nothing.

use std::sync::Arc;

use crate::hub::Hub;
use crate::protocol::{OutboundFrame, OutboundMessage};
use crate::session::handshake::Session;

/// Remove the peer and broadcast its departure, exactly once. Returns
/// whether this call was the one that actually performed teardown.
pub fn run(hub: &Arc<Hub>, session: &Session) -> bool {
    if !hub.registry.remove(&session.id) {
        return false;
    }
    crate::router::broadcast(
        &hub.registry,
        OutboundMessage::Typed(OutboundFrame::PeerDisconnected { peer_id: session.id.clone() }),
        None,
    );
    true
}
