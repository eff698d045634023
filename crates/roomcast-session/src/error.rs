//! Error types for the session layer.
//!
//! Everything here is fatal to the connection it concerns: these errors
//! occur before a connection is admitted into a room, so the policy is
//! simply "terminate the stream". Nothing in a shared room is affected.

/// Errors that can occur during connection admission.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The request path doesn't follow `/{room_type}/{room_id}`.
    #[error("invalid connection path: {0:?}")]
    InvalidAddressing(String),

    /// The path parsed cleanly but names a room type the server has no
    /// registration for.
    #[error("unknown room type: {0}")]
    UnknownRoomType(String),

    /// The application's authenticator rejected the connection.
    #[error("authentication failed: {0}")]
    AuthFailed(String),
}
