//! Admission pipeline: path → identity → authenticated `ClientData`.

use rand::Rng;
use roomcast_protocol::{ClientId, RoomKey};
use roomcast_transport::HandshakeRequest;

use crate::{Authenticator, SessionError};

// ---------------------------------------------------------------------------
// ClientData
// ---------------------------------------------------------------------------

/// The composed identity of an admitted connection.
///
/// Produced once at admission and carried through every handler invocation
/// for this connection (join, messages, leave).
#[derive(Debug, Clone)]
pub struct ClientData {
    /// Server-generated identifier, unique per connection.
    pub client_id: ClientId,
    /// Identity from the authenticator; `None` for anonymous connections.
    pub user_id: Option<roomcast_protocol::UserId>,
    /// The room this connection is addressed to.
    pub room_key: RoomKey,
}

// ---------------------------------------------------------------------------
// Addressing
// ---------------------------------------------------------------------------

/// Parses a connection path of the form `/{room_type}/{room_id}`.
///
/// Both segments must be non-empty and nothing may follow the room id.
///
/// # Errors
/// Returns [`SessionError::InvalidAddressing`] for any other shape.
pub fn parse_room_path(path: &str) -> Result<RoomKey, SessionError> {
    let invalid = || SessionError::InvalidAddressing(path.to_string());
    let rest = path.strip_prefix('/').ok_or_else(invalid)?;
    match rest.split('/').collect::<Vec<_>>().as_slice() {
        [room_type, room_id] if !room_type.is_empty() && !room_id.is_empty() => {
            Ok(RoomKey::new(*room_type, *room_id))
        }
        _ => Err(invalid()),
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Generates a fresh client identifier: 16 random bytes as 32 hex chars.
///
/// 128 bits of entropy makes a collision between concurrently-open
/// connections computationally negligible, so uniqueness needs no
/// coordination or bookkeeping.
pub fn generate_client_id() -> ClientId {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    ClientId(bytes.iter().map(|b| format!("{b:02x}")).collect())
}

// ---------------------------------------------------------------------------
// Admission
// ---------------------------------------------------------------------------

/// Runs the full admission pipeline for one connection.
///
/// Order matters and mirrors the failure policy: addressing and room-type
/// validation fail before the authenticator is ever invoked, and the
/// authenticator runs before any room logic. No state is mutated here.
///
/// `is_registered_type` is supplied by the server, which owns the room-type
/// table.
///
/// # Errors
/// Any [`SessionError`]; the caller must terminate the connection.
pub async fn authenticate_connection<A, F>(
    auth: &A,
    request: &HandshakeRequest,
    is_registered_type: F,
) -> Result<ClientData, SessionError>
where
    A: Authenticator,
    F: FnOnce(&str) -> bool,
{
    let room_key = parse_room_path(&request.path)?;
    if !is_registered_type(&room_key.room_type) {
        return Err(SessionError::UnknownRoomType(room_key.room_type));
    }

    let client_id = generate_client_id();
    let user_id = auth.authenticate(request).await?;

    tracing::debug!(%client_id, %room_key, "connection admitted");
    Ok(ClientData {
        client_id,
        user_id,
        room_key,
    })
}
