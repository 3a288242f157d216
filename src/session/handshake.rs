//! `opening` → `active` (§4.4).
//!
//! Steps 3, 4, 5 of the handshake (insert, welcome, arrival broadcast) run
//! in that exact order; nothing in between is allowed to observe a peer
//! that's been inserted but hasn't been welcomed yet.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::hub::Hub;
use crate::id::{self, PeerId};
use crate::protocol::{OutboundFrame, OutboundMessage};

#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("welcome frame could not be delivered")]
    WelcomeUndeliverable,
}

/// Everything the rest of the session needs to know about itself once
/// `active`.
pub struct Session {
    pub id: PeerId,
    pub name: String,
}

fn truncate_name(name: &str, max_len: usize) -> String {
    name.chars().take(max_len).collect()
}

fn default_name(id: &str) -> String {
    format!("guest-{}", &id[..id.len().min(4)])
}

/// Run the handshake. On any failure the session must be treated as
/// `closed` by the caller without ever having broadcast `new-peer`.
pub async fn perform(
    hub: &Arc<Hub>,
    requested_name: Option<String>,
    outbound: mpsc::Sender<OutboundMessage>,
) -> Result<Session, HandshakeError> {
    let requested_name = requested_name
        .map(|n| truncate_name(&n, hub.config.max_name_len))
        .filter(|n| !n.is_empty());

    // Step 2 + 3: generate an id, retrying on the vanishingly rare
    // collision, and insert atomically once a free id is found.
    let (peer_id, name) = loop {
        let candidate_id = id::generate();
        let candidate_name = requested_name
            .clone()
            .unwrap_or_else(|| default_name(&candidate_id));
        match hub
            .registry
            .insert(candidate_id.clone(), candidate_name.clone(), outbound.clone())
        {
            Ok(()) => break (candidate_id, candidate_name),
            Err(_) => continue, // id collision, retry with a fresh id
        }
    };

    // Step 4: welcome, built from a snapshot excluding the peer itself.
    let peers = hub.registry.snapshot(Some(&peer_id));
    let registered = OutboundFrame::Registered {
        peer_id: peer_id.clone(),
        your_name: name.clone(),
        peers,
    };
    if outbound.send(OutboundMessage::Typed(registered)).await.is_err() {
        // Never became observably active: undo step 3 and report failure
        // without ever reaching step 5.
        hub.registry.remove(&peer_id);
        return Err(HandshakeError::WelcomeUndeliverable);
    }

    // Step 5: tell everyone else this peer exists.
    crate::router::broadcast(
        &hub.registry,
        OutboundMessage::Typed(OutboundFrame::NewPeer {
            peer: crate::protocol::PeerInfo { id: peer_id.clone(), name: name.clone() },
        }),
        Some(&peer_id),
    );

    Ok(Session { id: peer_id, name })
}
