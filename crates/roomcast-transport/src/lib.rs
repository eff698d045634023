//! Transport layer for Roomcast.
//!
//! Wraps `tokio-tungstenite` behind a small adapter that the rest of the
//! stack consumes: a listener that accepts WebSocket upgrades while
//! capturing the HTTP request's path and headers (the upper layers need
//! both for addressing and authentication), and a connection type that
//! splits into an owned sender/receiver pair.
//!
//! The split matters: room broadcasts arrive on a connection at arbitrary
//! times, so the write side must never wait behind an in-progress read.
//! Framing, the upgrade handshake, and TLS all belong to the underlying
//! WebSocket stack — this crate only adapts it.

mod error;
mod websocket;

pub use error::TransportError;
pub use websocket::{
    ConnectionReceiver, ConnectionSender, HandshakeRequest, WebSocketConnection,
    WebSocketTransport,
};

use std::fmt;

/// Process-local identifier stamped on each accepted connection.
///
/// Exists for log correlation only — it names the raw socket, not the
/// client. The protocol-visible identity is the session layer's `ClientId`,
/// minted later during admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}
