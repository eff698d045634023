//! Roomcast: room-scoped real-time state synchronization over WebSockets.
//!
//! Clients connect to `/{room_type}/{room_id}`; the first connection to a
//! key creates the room, later ones join it. Application code implements
//! [`RoomLogic`] per room type — typed state, typed client messages, and
//! handlers for create/join/leave/message/timer — and the framework
//! guarantees serialized mutation per room, full-snapshot broadcast after
//! every `set_state`, and named one-shot timers that run inside the room's
//! critical section.
//!
//! The workspace splits along layer lines: `roomcast-transport` (WebSocket
//! plumbing), `roomcast-protocol` (wire frames and identifiers),
//! `roomcast-session` (admission and authentication), `roomcast-room` (the
//! actor core), and this crate, which composes them into a runnable server.

mod error;
mod handler;
mod server;

pub use error::RoomcastError;
pub use server::{Server, ServerBuilder};

pub use roomcast_protocol::{ClientId, ProtocolError, RoomKey, ServerFrame, UserId};
pub use roomcast_room::{
    ClientData, HandlerError, RoomContext, RoomError, RoomLogic, RoomState,
};
pub use roomcast_session::{Authenticator, NoAuth, SessionError};
pub use roomcast_transport::{HandshakeRequest, TransportError};

/// One-stop imports for implementing a room type and running a server.
pub mod prelude {
    pub use crate::{
        Authenticator, ClientData, HandlerError, HandshakeRequest, NoAuth, RoomContext,
        RoomLogic, RoomState, RoomcastError, Server, ServerBuilder,
    };
}
