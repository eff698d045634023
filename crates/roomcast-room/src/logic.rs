//! The `RoomState` and `RoomLogic` traits — the extension points a room
//! type implements.
//!
//! A room type is an application-defined category of room: its state
//! schema, what clients may send it, and what happens on create, join,
//! leave, message, and timer fire. The framework calls these methods at
//! the right time, always from inside the room's critical section.

use serde::{Serialize, de::DeserializeOwned};

use crate::{ClientData, HandlerError, RoomContext};

/// A room type's state schema and its partial-update type.
///
/// The state is an ordinary struct (not an open-ended map), so the
/// compiler checks what handlers read and write. `Patch` is its partial
/// twin — typically the same fields wrapped in `Option` — and
/// [`apply`](Self::apply) overwrites exactly the fields the patch carries,
/// leaving the rest untouched. That preserves shallow-merge semantics:
/// applying p1…pn in order gives the same result as merging them
/// field-by-field in order.
///
/// `Default` is the "empty room" a creation handler starts from;
/// `Serialize` is what broadcast snapshots use.
pub trait RoomState: Send + Serialize + Default + 'static {
    /// The partial update merged by [`RoomContext::set_state`].
    type Patch: Send + 'static;

    /// Overwrites the fields present in `patch`; absent fields keep their
    /// current values.
    fn apply(&mut self, patch: Self::Patch);
}

/// The handlers for one room type.
///
/// Associated types pin down the room's data shapes:
/// - `State` — the state schema broadcast to clients
/// - `Message` — what clients send; a serde enum tagged
///   `#[serde(tag = "type", content = "value")]` so each variant is one
///   wire message kind. A frame with an unknown kind fails to decode and
///   is discarded before reaching the handler.
/// - `TimerEvent` — the payload a scheduled timer delivers to
///   [`on_timer`](Self::on_timer)
///
/// All handlers run inside the room's critical section and may freely call
/// [`RoomContext::set_state`], [`RoomContext::set_timer`], and
/// [`RoomContext::clear_timer`].
pub trait RoomLogic: Sized + Send + Sync + 'static {
    /// The room's state schema.
    type State: RoomState;

    /// Messages clients send to this room type.
    type Message: DeserializeOwned + Send + 'static;

    /// Payload carried by timers this room type schedules.
    type TimerEvent: Send + 'static;

    /// Populates a freshly constructed, empty room.
    ///
    /// Runs exactly once per room instance, before any client joins.
    /// Returning `Err` discards the room entirely — it is never registered,
    /// and the connection that triggered creation is terminated.
    fn on_create(room: &mut RoomContext<'_, Self>) -> Result<(), HandlerError>;

    /// Runs when a connection joins, *before* it is registered.
    ///
    /// State mutations here broadcast to the previously-joined clients; the
    /// joining client then receives a directed snapshot that already
    /// reflects them. Returning `Err` terminates the joining connection
    /// without registering it; the room survives. Default: accept silently.
    fn on_join(
        _room: &mut RoomContext<'_, Self>,
        _client: &ClientData,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Runs after a connection has been removed from the client set.
    ///
    /// Failures are logged and contained — a throwing leave handler must
    /// not take the room down. Default: no-op.
    fn on_leave(
        _room: &mut RoomContext<'_, Self>,
        _client: &ClientData,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Handles a decoded message from a joined client.
    ///
    /// Failures are logged and contained; the sender's connection and the
    /// room both survive.
    fn on_message(
        room: &mut RoomContext<'_, Self>,
        sender: &ClientData,
        msg: Self::Message,
    ) -> Result<(), HandlerError>;

    /// Handles a fired timer.
    ///
    /// Only current timers are delivered — a timer that was cleared or
    /// replaced never reaches this method. Failures are logged and
    /// contained. Default: no-op.
    fn on_timer(
        _room: &mut RoomContext<'_, Self>,
        _name: &str,
        _event: Self::TimerEvent,
    ) -> Result<(), HandlerError> {
        Ok(())
    }
}
