//! The room registry: at most one live room per key, with single-flight
//! creation.
//!
//! When several connections race to a room that doesn't exist yet, exactly
//! one of them drives creation; the rest park on a watch channel and pick
//! up the finished room once the creator finalizes the slot. A failed
//! creation leaves no residue — the key is vacated, and the next connection
//! to ask for it (including a parked waiter) triggers a fresh attempt.

use std::collections::HashMap;

use roomcast_protocol::RoomKey;
use tokio::sync::{Mutex, watch};

use crate::RoomError;
use crate::logic::RoomLogic;
use crate::room::{RoomHandle, spawn_room};

enum RegistryEntry<L: RoomLogic> {
    /// The room exists and is accepting commands.
    Ready(RoomHandle<L>),
    /// Some task is running the creation handler right now. The receiver
    /// fires when the slot is finalized either way.
    Creating(watch::Receiver<bool>),
}

/// What a resolve attempt decided to do, settled under the map lock.
enum Plan<L: RoomLogic> {
    Done(RoomHandle<L>),
    Wait(watch::Receiver<bool>),
    Create(watch::Sender<bool>),
}

/// Maps room keys to live rooms for one room type.
///
/// Rooms are created on first demand and persist for the life of the
/// process; an emptied room keeps its state and its pending timers.
pub struct RoomRegistry<L: RoomLogic> {
    rooms: Mutex<HashMap<RoomKey, RegistryEntry<L>>>,
}

impl<L: RoomLogic> Default for RoomRegistry<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: RoomLogic> RoomRegistry<L> {
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the room for `key`, creating it if necessary.
    ///
    /// Concurrent callers for the same missing key coalesce onto a single
    /// creation attempt; the creation handler runs exactly once per room
    /// instance. If it fails, the caller that drove creation gets
    /// [`RoomError::CreationFailed`] and the key is left vacant, so a later
    /// call retries from scratch.
    pub async fn resolve(&self, key: &RoomKey) -> Result<RoomHandle<L>, RoomError> {
        loop {
            let plan = {
                let mut rooms = self.rooms.lock().await;
                match rooms.get(key) {
                    Some(RegistryEntry::Ready(handle)) => Plan::Done(handle.clone()),
                    Some(RegistryEntry::Creating(rx)) => {
                        // A closed sender means the creator's task died
                        // without finalizing; claim the slot ourselves.
                        if rx.has_changed().is_err() {
                            let (tx, rx) = watch::channel(false);
                            rooms.insert(key.clone(), RegistryEntry::Creating(rx));
                            Plan::Create(tx)
                        } else {
                            Plan::Wait(rx.clone())
                        }
                    }
                    None => {
                        let (tx, rx) = watch::channel(false);
                        rooms.insert(key.clone(), RegistryEntry::Creating(rx));
                        Plan::Create(tx)
                    }
                }
            };

            match plan {
                Plan::Done(handle) => return Ok(handle),
                Plan::Create(done_tx) => return self.create_room(key, done_tx).await,
                Plan::Wait(mut rx) => {
                    // Park until the in-flight creation finalizes, then
                    // re-inspect the map: Ready on success, vacant on
                    // failure (in which case the next lap retries).
                    let _ = rx.changed().await;
                }
            }
        }
    }

    /// Runs the creation attempt this caller claimed: spawn the actor, run
    /// the handler, finalize the slot, wake the waiters.
    async fn create_room(
        &self,
        key: &RoomKey,
        done_tx: watch::Sender<bool>,
    ) -> Result<RoomHandle<L>, RoomError> {
        tracing::info!(room_key = %key, "creating room");
        let handle = spawn_room::<L>(key.clone());
        let outcome = handle.create().await;

        let mut rooms = self.rooms.lock().await;
        match outcome {
            Ok(()) => {
                rooms.insert(key.clone(), RegistryEntry::Ready(handle.clone()));
                let _ = done_tx.send(true);
                Ok(handle)
            }
            Err(e) => {
                tracing::warn!(room_key = %key, error = %e, "room creation failed");
                rooms.remove(key);
                let _ = done_tx.send(true);
                Err(e)
            }
        }
    }
}
