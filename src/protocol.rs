//! Wire frame schema and codec.
//!
//! Frames are single-line, UTF-8 JSON objects with a `type` discriminator.
//! Directed negotiation frames (`offer`/`answer`/`ice-candidate`) carry
//! opaque fields the hub must forward byte-for-byte — those are kept as a
//! raw [`serde_json::Value`] rather than modeled with typed fields, so the
//! hub never has to know (or guess at) the shape of an SDP blob or ICE
//! candidate.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::id::PeerId;

/// A peer as it appears in roster-shaped frames (`registered`, `peer-list`,
/// `new-peer`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeerInfo {
    pub id: PeerId,
    pub name: String,
}

/// The three directed (peer-to-peer negotiation) frame kinds. The hub
/// routes these by `to` without inspecting anything else in the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectedKind {
    Offer,
    Answer,
    IceCandidate,
}

impl DirectedKind {
    fn as_str(self) -> &'static str {
        match self {
            DirectedKind::Offer => "offer",
            DirectedKind::Answer => "answer",
            DirectedKind::IceCandidate => "ice-candidate",
        }
    }
}

/// A decoded inbound frame (peer → hub).
#[derive(Debug)]
pub enum InboundFrame {
    /// `offer` | `answer` | `ice-candidate`. `raw` is the full original
    /// object, untouched, ready to be re-annotated and forwarded.
    Directed {
        kind: DirectedKind,
        to: PeerId,
        raw: Value,
    },
    GetPeers,
    /// `name` is `None` when the field was absent or not a string; the
    /// caller is responsible for validating length/emptiness (§4.4).
    UpdateName { name: Option<String> },
    /// Well-formed JSON, recognized `type`-less-ness or an unrecognized
    /// `type` value. Accepted at parse, rejected at dispatch.
    Unknown,
}

/// Decode one inbound frame, enforcing the maximum frame size first so an
/// oversized payload never reaches the JSON parser.
pub fn decode_inbound(text: &str, max_frame_bytes: usize) -> Result<InboundFrame, ProtocolError> {
    if text.len() > max_frame_bytes {
        return Err(ProtocolError::TooLarge);
    }
    let value: Value = serde_json::from_str(text).map_err(|_| ProtocolError::Malformed)?;
    let obj = value.as_object().ok_or(ProtocolError::Malformed)?;
    let ty = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::Malformed)?;

    match ty {
        "offer" => directed(DirectedKind::Offer, value),
        "answer" => directed(DirectedKind::Answer, value),
        "ice-candidate" => directed(DirectedKind::IceCandidate, value),
        "get-peers" => Ok(InboundFrame::GetPeers),
        "update-name" => {
            let name = obj.get("name").and_then(Value::as_str).map(str::to_owned);
            Ok(InboundFrame::UpdateName { name })
        }
        _ => Ok(InboundFrame::Unknown),
    }
}

fn directed(kind: DirectedKind, raw: Value) -> Result<InboundFrame, ProtocolError> {
    let to = raw
        .get("to")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(ProtocolError::MissingField("to"))?
        .to_owned();
    Ok(InboundFrame::Directed { kind, to, raw })
}

/// Re-annotate a directed frame with sender identity before forwarding.
/// Adds exactly `from` and `name`; every other field (including `to` and
/// the opaque negotiation payload) passes through unchanged.
pub fn annotate_for_forward(mut raw: Value, from: &PeerId, name: &str) -> Value {
    if let Some(obj) = raw.as_object_mut() {
        obj.insert("from".to_string(), Value::String(from.clone()));
        obj.insert("name".to_string(), Value::String(name.to_string()));
    }
    raw
}

/// An outbound frame (hub → peer), sent once JSON-serialized.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum OutboundFrame {
    #[serde(rename = "registered")]
    Registered {
        #[serde(rename = "peerId")]
        peer_id: PeerId,
        #[serde(rename = "yourName")]
        your_name: String,
        peers: Vec<PeerInfo>,
    },
    #[serde(rename = "peer-list")]
    PeerList { peers: Vec<PeerInfo> },
    #[serde(rename = "new-peer")]
    NewPeer { peer: PeerInfo },
    #[serde(rename = "peer-disconnected")]
    PeerDisconnected {
        #[serde(rename = "peerId")]
        peer_id: PeerId,
    },
    #[serde(rename = "peer-name-updated")]
    PeerNameUpdated {
        #[serde(rename = "peerId")]
        peer_id: PeerId,
        name: String,
    },
    #[serde(rename = "name-updated-ack")]
    NameUpdatedAck { name: String },
    #[serde(rename = "error")]
    Error { message: String },
}

impl OutboundFrame {
    /// Render as the single-line text payload sent on the wire.
    pub fn encode(&self) -> String {
        serde_json::to_string(self).expect("OutboundFrame always serializes")
    }
}

/// Everything that can go out over a session's outbound queue.
///
/// Kept distinct from [`OutboundFrame`] rather than folded into it as a
/// newtype variant: a forwarded directed frame already has its own `type`
/// field from the opaque payload (`"offer"`, `"answer"`, ...), and an
/// internally-tagged enum would collide with it trying to inject its own
/// tag. Forwarded frames bypass the tagged representation entirely and
/// serialize exactly as received plus the two annotated fields.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    Typed(OutboundFrame),
    Forwarded(Value),
}

impl OutboundMessage {
    pub fn encode(&self) -> String {
        match self {
            OutboundMessage::Typed(frame) => frame.encode(),
            OutboundMessage::Forwarded(value) => value.to_string(),
        }
    }
}

impl From<OutboundFrame> for OutboundMessage {
    fn from(frame: OutboundFrame) -> Self {
        OutboundMessage::Typed(frame)
    }
}
