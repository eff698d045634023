//! Identity types shared across the Roomcast stack.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ClientId
// ---------------------------------------------------------------------------

/// A unique identifier for a single connection.
///
/// This is a newtype wrapper around the random hex string the session layer
/// generates on admission. Wrapping it keeps signatures honest: you can't
/// accidentally pass a `UserId` where a `ClientId` is expected, even though
/// both are strings underneath.
///
/// `#[serde(transparent)]` serializes this as the inner string, not as
/// `{ "0": "..." }`, so a client id appears as a plain JSON string on the
/// wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// UserId
// ---------------------------------------------------------------------------

/// An application-level identity returned by the authenticator.
///
/// Unlike [`ClientId`] (one per connection, server-generated), a `UserId`
/// names *who* is connected and is optional — a server without an
/// authenticator admits everyone with no identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RoomKey
// ---------------------------------------------------------------------------

/// Names one room instance: a room type plus a room id.
///
/// Derived from the connection path `/{room_type}/{room_id}`. The registry
/// guarantees at most one live room per key at any time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomKey {
    /// The application-defined room category (e.g., `"chat"`).
    pub room_type: String,
    /// The instance name within that category (e.g., `"my-chat"`).
    pub room_id: String,
}

impl RoomKey {
    /// Builds a key from its two parts.
    pub fn new(room_type: impl Into<String>, room_id: impl Into<String>) -> Self {
        Self {
            room_type: room_type.into(),
            room_id: room_id.into(),
        }
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.room_type, self.room_id)
    }
}
