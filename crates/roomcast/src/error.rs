//! The top-level error type.

use roomcast_protocol::ProtocolError;
use roomcast_room::RoomError;
use roomcast_session::SessionError;
use roomcast_transport::TransportError;

/// Any failure the server can surface to its caller.
///
/// Each layer keeps its own error type; this enum only stitches them
/// together for the public API.
#[derive(Debug, thiserror::Error)]
pub enum RoomcastError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Room(#[from] RoomError),
}
