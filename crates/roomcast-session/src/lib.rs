//! Connection admission for Roomcast.
//!
//! Everything that happens between "a WebSocket finished its upgrade" and
//! "a connection is allowed near a room" lives here:
//!
//! 1. **Addressing** — parsing the request path into a `RoomKey`
//! 2. **Identity** — generating a fresh random `ClientId`
//! 3. **Authentication** — the application's [`Authenticator`] callback
//!
//! The result is a [`ClientData`] record; any failure terminates the
//! connection before room logic runs. Admission mutates nothing — its only
//! side effect is invoking the authenticator.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room layer (above)   ← receives ClientData for join/leave/messages
//!     ↕
//! Session layer (this crate)
//!     ↕
//! Transport layer (below)  ← provides the captured HandshakeRequest
//! ```

#![allow(async_fn_in_trait)]

mod admission;
mod auth;
mod error;

pub use admission::{ClientData, authenticate_connection, generate_client_id, parse_room_path};
pub use auth::{Authenticator, NoAuth};
pub use error::SessionError;
