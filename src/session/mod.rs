//! The per-socket session state machine (§4.4): `opening` → `active` →
//! `closing` → `closed`.
//!
//! Mirrors the teacher's `connection::handle_io_with_meta` shape — one
//! reader loop owning the inbound half, one spawned writer task draining
//! an `mpsc::Receiver` into the outbound half — generalized from a raw TCP
//! line protocol to an axum WebSocket and from IRC's line format to JSON
//! frames.

pub mod handshake;
pub mod teardown;

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::hub::Hub;
use crate::protocol::{self, InboundFrame, OutboundFrame, OutboundMessage};

pub use handshake::Session;

/// Drive one accepted WebSocket end to end. Never returns an error: every
/// failure mode here is session-scoped and handled by tearing the session
/// down, per §7's propagation policy (one session's errors never escape
/// to another, or to the listener).
pub async fn run(socket: WebSocket, hub: Arc<Hub>, requested_name: Option<String>) {
    let (mut sink, mut stream) = socket.split();
    let (outbound_tx, mut outbound_rx) =
        mpsc::channel::<OutboundMessage>(hub.config.outbound_queue_depth);

    let session = match handshake::perform(&hub, requested_name, outbound_tx.clone()).await {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(error = %e, "handshake failed, closing without becoming active");
            return;
        }
    };
    tracing::info!(peer_id = %session.id, name = %session.name, "peer active");

    let write_timeout = hub.config.write_timeout();
    let writer_session_id = session.id.clone();
    let writer = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            let send = sink.send(Message::Text(msg.encode().into()));
            if tokio::time::timeout(write_timeout, send).await.is_err() {
                tracing::warn!(peer_id = %writer_session_id, "write timed out, closing");
                break;
            }
        }
        let _ = sink.close().await;
    });

    let mut shutdown_rx = hub.subscribe_shutdown();
    let idle_timeout = hub.config.read_idle_timeout();

    loop {
        let idle_sleep = async {
            match idle_timeout {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = shutdown_rx.recv() => {
                tracing::info!(peer_id = %session.id, "shutdown signaled");
                break;
            }
            _ = idle_sleep => {
                tracing::info!(peer_id = %session.id, "idle timeout, closing");
                break;
            }
            next = stream.next() => {
                match next {
                    None => break,
                    Some(Err(_)) => break,
                    Some(Ok(Message::Close(_))) => break,
                    Some(Ok(Message::Text(text))) => dispatch(&hub, &session, &text, &outbound_tx),
                    Some(Ok(_)) => {} // ping/pong/binary carry no protocol meaning here
                }
            }
        }
    }

    teardown::run(&hub, &session);
    drop(outbound_tx);
    let _ = writer.await;
}

/// Decode and act on one inbound frame (§4.4 "Inbound dispatch"). Never
/// panics, never propagates an error outward — every failure becomes
/// either a reply `error` frame or a silent no-op, matching §7.
fn dispatch(hub: &Arc<Hub>, session: &Session, text: &str, outbound: &mpsc::Sender<OutboundMessage>) {
    let frame = match protocol::decode_inbound(text, hub.config.max_frame_bytes) {
        Ok(frame) => frame,
        Err(e) => {
            reply_error(outbound, e.to_string());
            return;
        }
    };

    match frame {
        InboundFrame::Directed { to, raw, .. } => {
            let annotated = protocol::annotate_for_forward(raw, &session.id, &session.name);
            match crate::router::send_to(&hub.registry, &to, OutboundMessage::Forwarded(annotated)) {
                Ok(()) => {}
                Err(e) => reply_error(outbound, e.to_string()),
            }
        }
        InboundFrame::GetPeers => {
            let peers = hub.registry.snapshot(Some(&session.id));
            let _ = outbound.try_send(OutboundMessage::Typed(OutboundFrame::PeerList { peers }));
        }
        InboundFrame::UpdateName { name } => match validate_name(name.as_deref(), hub.config.max_name_len) {
            Some(new_name) => {
                // Rename can't fail here: the session calling this is, by
                // construction, the same one live in the registry.
                let _ = hub.registry.rename(&session.id, new_name.clone());
                crate::router::broadcast(
                    &hub.registry,
                    OutboundMessage::Typed(OutboundFrame::PeerNameUpdated {
                        peer_id: session.id.clone(),
                        name: new_name.clone(),
                    }),
                    Some(&session.id),
                );
                let _ = outbound.try_send(OutboundMessage::Typed(OutboundFrame::NameUpdatedAck { name: new_name }));
            }
            None => reply_error(outbound, crate::error::ProtocolError::InvalidName.to_string()),
        },
        InboundFrame::Unknown => reply_error(outbound, crate::error::ProtocolError::UnknownType.to_string()),
    }
}

fn validate_name(name: Option<&str>, max_len: usize) -> Option<String> {
    let name = name?.trim();
    if name.is_empty() {
        return None;
    }
    Some(name.chars().take(max_len).collect())
}

fn reply_error(outbound: &mpsc::Sender<OutboundMessage>, message: String) {
    let _ = outbound.try_send(OutboundMessage::Typed(OutboundFrame::Error { message }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PeerInfo;

    fn hub_with_peer(name: &str) -> (Arc<Hub>, Session, mpsc::Receiver<OutboundMessage>) {
        // Built synchronously against the registry directly (no socket
        // needed) so dispatch can be unit tested without spinning up a
        // WebSocket — the handshake itself is covered in handshake.rs.
        let hub = Hub::new(crate::config::HubConfig::for_test());
        let (tx, rx) = mpsc::channel(16);
        hub.registry.insert(format!("{name}-id"), name.to_string(), tx).unwrap();
        (hub.clone(), Session { id: format!("{name}-id"), name: name.to_string() }, rx)
    }

    #[test]
    fn get_peers_excludes_self() {
        let (hub, session, _rx) = hub_with_peer("Alice");
        hub.registry.insert("bob-id".into(), "Bob".into(), mpsc::channel(8).0).unwrap();
        let (out_tx, mut out_rx) = mpsc::channel(8);
        dispatch(&hub, &session, r#"{"type":"get-peers"}"#, &out_tx);
        match out_rx.try_recv().unwrap() {
            OutboundMessage::Typed(OutboundFrame::PeerList { peers }) => {
                assert_eq!(peers.len(), 1);
                assert_eq!(peers[0].id, "bob-id");
                assert!(!peers.iter().any(|p: &PeerInfo| p.id == session.id));
            }
            _ => panic!("expected peer-list"),
        }
    }

    #[test]
    fn update_name_acks_and_broadcasts() {
        let (hub, session, _rx) = hub_with_peer("Alice");
        hub.registry
            .insert("bob-id".into(), "Bob".into(), mpsc::channel(8).0)
            .unwrap();
        let (out_tx, mut out_rx) = mpsc::channel(8);
        dispatch(&hub, &session, r#"{"type":"update-name","name":"Alicia"}"#, &out_tx);
        match out_rx.try_recv().unwrap() {
            OutboundMessage::Typed(OutboundFrame::NameUpdatedAck { name }) => assert_eq!(name, "Alicia"),
            _ => panic!("expected ack"),
        }
        assert_eq!(hub.registry.snapshot(None).iter().find(|p| p.id == session.id).unwrap().name, "Alicia");
    }

    #[test]
    fn update_name_with_empty_name_is_rejected_and_registry_untouched() {
        let (hub, session, _rx) = hub_with_peer("Alice");
        let (out_tx, mut out_rx) = mpsc::channel(8);
        dispatch(&hub, &session, r#"{"type":"update-name","name":""}"#, &out_tx);
        match out_rx.try_recv().unwrap() {
            OutboundMessage::Typed(OutboundFrame::Error { .. }) => {}
            _ => panic!("expected error frame"),
        }
        assert_eq!(hub.registry.snapshot(None)[0].name, "Alice");
    }

    #[test]
    fn directed_to_unknown_peer_yields_error_only_to_sender() {
        let (hub, session, _rx) = hub_with_peer("Alice");
        let (out_tx, mut out_rx) = mpsc::channel(8);
        dispatch(&hub, &session, r#"{"type":"offer","to":"ghost","sdp":"x"}"#, &out_tx);
        match out_rx.try_recv().unwrap() {
            OutboundMessage::Typed(OutboundFrame::Error { message }) => assert!(message.contains("ghost")),
            _ => panic!("expected error frame"),
        }
    }

    #[test]
    fn directed_to_live_peer_forwards_with_from_and_name() {
        let (hub, session, _rx) = hub_with_peer("Alice");
        let (bob_tx, mut bob_rx) = mpsc::channel(8);
        hub.registry.insert("bob-id".into(), "Bob".into(), bob_tx).unwrap();
        let (out_tx, mut out_rx) = mpsc::channel(8);
        dispatch(&hub, &session, r#"{"type":"offer","to":"bob-id","sdp":"v=0"}"#, &out_tx);
        assert!(out_rx.try_recv().is_err()); // no error for the sender
        match bob_rx.try_recv().unwrap() {
            OutboundMessage::Forwarded(value) => {
                assert_eq!(value["from"], session.id);
                assert_eq!(value["name"], "Alice");
                assert_eq!(value["sdp"], "v=0");
            }
            _ => panic!("expected forwarded frame"),
        }
    }

    #[test]
    fn malformed_frame_yields_error_and_session_unaffected() {
        let (hub, session, _rx) = hub_with_peer("Alice");
        let (out_tx, mut out_rx) = mpsc::channel(8);
        dispatch(&hub, &session, "not-json", &out_tx);
        match out_rx.try_recv().unwrap() {
            OutboundMessage::Typed(OutboundFrame::Error { message }) => {
                assert_eq!(message, "Invalid message format.");
            }
            _ => panic!("expected error frame"),
        }
        assert!(hub.registry.contains(&session.id));
    }

    #[test]
    fn unknown_type_yields_error() {
        let (hub, session, _rx) = hub_with_peer("Alice");
        let (out_tx, mut out_rx) = mpsc::channel(8);
        dispatch(&hub, &session, r#"{"type":"wat"}"#, &out_tx);
        assert!(matches!(
            out_rx.try_recv().unwrap(),
            OutboundMessage::Typed(OutboundFrame::Error { .. })
        ));
    }
}
