//! Room lifecycle management for Roomcast.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its state,
//! its join-ordered client list, and its timers. The actor's mailbox is what
//! serializes mutation: creation, joins, leaves, message handlers, and fired
//! timers for one room all execute one at a time, while different rooms run
//! fully concurrently.
//!
//! # Key types
//!
//! - [`RoomLogic`] — the trait a room type implements (create/join/leave/
//!   message/timer handlers)
//! - [`RoomState`] — the room type's state schema and its typed shallow patch
//! - [`RoomContext`] — what handlers see: state access, `set_state`, timers
//! - [`RoomRegistry`] — one live room per key, single-flight creation
//! - [`RoomHandle`] — sends commands to a running room actor

mod context;
mod error;
mod logic;
mod registry;
mod room;
mod timer;

pub use context::{ClientSender, RoomContext};
pub use error::{HandlerError, RoomError};
pub use logic::{RoomLogic, RoomState};
pub use registry::RoomRegistry;
pub use room::RoomHandle;

// Handlers receive the session layer's identity record; re-exported so
// implementors don't need a direct roomcast-session dependency.
pub use roomcast_session::ClientData;
