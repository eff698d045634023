//! Error types for the room layer.

use roomcast_protocol::RoomKey;

/// A failure reported by an application handler.
///
/// Handlers signal rejection (e.g., an invalid room id at creation) by
/// returning this. What happens next depends on which handler failed:
/// creation and join failures terminate the initiating connection, while
/// message, timer, and leave failures are logged and contained.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl From<&str> for HandlerError {
    fn from(msg: &str) -> Self {
        Self(msg.to_string())
    }
}

impl From<String> for HandlerError {
    fn from(msg: String) -> Self {
        Self(msg)
    }
}

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The creation handler rejected the room. The room was discarded and
    /// never registered; only the initiating connection is affected.
    #[error("room creation failed for {0}: {1}")]
    CreationFailed(RoomKey, #[source] HandlerError),

    /// The join handler rejected this connection. The room itself survives.
    #[error("join rejected for {0}: {1}")]
    JoinRejected(RoomKey, #[source] HandlerError),

    /// The room's command channel is closed — its actor is gone.
    #[error("room {0} is unavailable")]
    Unavailable(RoomKey),
}
