//! Client-side errors.

/// Errors surfaced by [`RoomClient`](crate::RoomClient).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The WebSocket connection could not be established.
    #[error("failed to connect: {0}")]
    Connect(String),

    /// An outgoing message failed to serialize.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    /// The connection task has already terminated.
    #[error("connection closed")]
    ConnectionClosed,
}
