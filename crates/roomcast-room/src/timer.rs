//! Per-room timer table: named, one-shot, cancelable, replaceable.
//!
//! A scheduled timer is an explicit record — name, generation, abortable
//! sleep task — owned by the room. The sleep task does nothing but wait
//! and post a `TimerFired` command back into the room's own mailbox, so a
//! fired callback runs under the same mutual exclusion as every message
//! handler.
//!
//! Staleness is handled twice over: replacing or clearing a timer aborts
//! its task, and the generation tag catches the race where the task
//! already posted its command before the abort landed.

use std::collections::HashMap;
use std::time::Duration;

use roomcast_protocol::RoomKey;
use tokio::sync::mpsc;

use crate::logic::RoomLogic;
use crate::room::RoomCommand;

struct PendingTimer {
    generation: u64,
    task: tokio::task::JoinHandle<()>,
}

pub(crate) struct TimerTable<L: RoomLogic> {
    key: RoomKey,
    next_generation: u64,
    pending: HashMap<String, PendingTimer>,
    /// Sender into the owning room's mailbox.
    self_tx: mpsc::Sender<RoomCommand<L>>,
}

impl<L: RoomLogic> TimerTable<L> {
    pub(crate) fn new(key: RoomKey, self_tx: mpsc::Sender<RoomCommand<L>>) -> Self {
        Self {
            key,
            next_generation: 0,
            pending: HashMap::new(),
            self_tx,
        }
    }

    /// Schedules (or replaces) the named timer.
    pub(crate) fn set(&mut self, name: String, delay: Duration, event: L::TimerEvent) {
        self.next_generation += 1;
        let generation = self.next_generation;

        let tx = self.self_tx.clone();
        let fired_name = name.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx
                .send(RoomCommand::TimerFired {
                    name: fired_name,
                    generation,
                    event,
                })
                .await;
        });

        if let Some(stale) = self.pending.insert(name, PendingTimer { generation, task }) {
            stale.task.abort();
        }
    }

    /// Cancels the named timer if still pending.
    pub(crate) fn clear(&mut self, name: &str) {
        if let Some(pending) = self.pending.remove(name) {
            pending.task.abort();
            tracing::debug!(room_key = %self.key, timer = name, "timer cleared");
        }
    }

    /// Checks whether a fired timer is still current, consuming its record
    /// if so. Returns `false` for timers that were cleared or replaced
    /// after their command was already in flight.
    pub(crate) fn claim(&mut self, name: &str, generation: u64) -> bool {
        match self.pending.get(name) {
            Some(pending) if pending.generation == generation => {
                self.pending.remove(name);
                true
            }
            _ => false,
        }
    }

    /// Aborts every pending timer. Called when the room actor stops.
    pub(crate) fn abort_all(&mut self) {
        for (_, pending) in self.pending.drain() {
            pending.task.abort();
        }
    }
}
