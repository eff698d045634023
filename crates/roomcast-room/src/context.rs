//! The handler-facing view of a room.

use std::time::Duration;

use roomcast_protocol::{RoomKey, encode_state};
use tokio::sync::mpsc;

use crate::logic::{RoomLogic, RoomState};
use crate::timer::TimerTable;
use crate::ClientData;

/// Channel sender delivering pre-serialized frames to one client's
/// connection writer. Unbounded so a slow client can never stall the
/// room's critical section.
pub type ClientSender = mpsc::UnboundedSender<String>;

/// One registered client: its identity plus its outbound channel.
pub(crate) struct ClientEntry {
    pub(crate) data: ClientData,
    pub(crate) sender: ClientSender,
}

/// What a handler sees while it runs: the room's state, its mutation
/// primitive, and its timers.
///
/// A context only exists inside the room actor's critical section, so
/// everything here is plain synchronous access — the mutual exclusion was
/// already paid for by the mailbox.
pub struct RoomContext<'a, L: RoomLogic> {
    pub(crate) key: &'a RoomKey,
    pub(crate) state: &'a mut L::State,
    pub(crate) clients: &'a [ClientEntry],
    pub(crate) timers: &'a mut TimerTable<L>,
}

impl<L: RoomLogic> RoomContext<'_, L> {
    /// The room's instance name (the `room_id` half of the key).
    pub fn room_id(&self) -> &str {
        &self.key.room_id
    }

    /// The full room key.
    pub fn room_key(&self) -> &RoomKey {
        self.key
    }

    /// Read access to the current state.
    pub fn state(&self) -> &L::State {
        self.state
    }

    /// Number of currently registered clients.
    ///
    /// Inside a join handler the joining client is not yet counted; inside
    /// a leave handler the leaving client is already gone.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Applies a partial update and broadcasts the resulting full state.
    ///
    /// The state is serialized exactly once, so every registered client
    /// receives a byte-identical `{"type":"state","value":...}` frame, in
    /// join order. A failed send to one client (its connection is already
    /// going away) is logged and skipped — the remaining clients still
    /// receive the frame, and the caller never sees an error.
    pub fn set_state(&mut self, patch: <L::State as RoomState>::Patch) {
        self.state.apply(patch);
        let frame = match encode_state(&*self.state) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(
                    room_key = %self.key,
                    error = %e,
                    "state snapshot failed to encode; broadcast skipped"
                );
                return;
            }
        };
        for entry in self.clients {
            if entry.sender.send(frame.clone()).is_err() {
                tracing::debug!(
                    room_key = %self.key,
                    client_id = %entry.data.client_id,
                    "dropping state frame for closing connection"
                );
            }
        }
    }

    /// Schedules `event` to be delivered to `RoomLogic::on_timer` once,
    /// after `delay`, under the given name.
    ///
    /// Re-registering a name that is still pending replaces it — the stale
    /// timer can never fire. The callback runs inside this room's critical
    /// section, like any message handler.
    pub fn set_timer(&mut self, name: impl Into<String>, delay: Duration, event: L::TimerEvent) {
        self.timers.set(name.into(), delay, event);
    }

    /// Cancels a pending timer. A no-op if the name is unknown or the
    /// timer already fired.
    pub fn clear_timer(&mut self, name: &str) {
        self.timers.clear(name);
    }
}
