//! Structured error taxonomy for the hub's internal components.
//!
//! These are matched against by callers that need to decide how to respond
//! to a peer (send an `error` frame, drop silently, tear down the session).
//! Fatal process-level failures (listener bind failure, etc.) are surfaced
//! as `anyhow::Error` at the `main.rs` boundary instead.

use thiserror::Error;

/// Failure modes for a single registry operation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("id already in use")]
    IdCollision,
    #[error("no peer with that id")]
    NotFound,
}

/// Failure modes for routing a message to a target peer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("Peer {0} not available.")]
    NoSuchPeer(String),
    #[error("Peer {0} is not ready to receive messages.")]
    NotReady(String),
}

/// Failure modes surfaced while decoding or validating an inbound frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid message format.")]
    Malformed,
    #[error("Message exceeds the maximum allowed size.")]
    TooLarge,
    #[error("Unknown message type.")]
    UnknownType,
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Invalid name.")]
    InvalidName,
}
