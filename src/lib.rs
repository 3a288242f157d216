//! A peer-discovery and WebRTC signaling relay.
//!
//! A listener (`web`) upgrades HTTP connections to WebSockets and hands
//! each one to a `session`, which registers the peer in a shared `hub`,
//! dispatches its frames through `router`, and tears it down on exit.

pub mod config;
pub mod error;
pub mod hub;
pub mod id;
pub mod protocol;
pub mod registry;
pub mod router;
pub mod session;
pub mod web;
