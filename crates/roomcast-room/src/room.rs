//! Room actor: an isolated Tokio task that owns one room instance.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. The mailbox is the room's critical section:
//! commands are processed strictly one at a time, which is what makes
//! `set_state` merges atomic and keeps handlers from interleaving.

use roomcast_protocol::{RoomKey, encode_state};
use tokio::sync::{mpsc, oneshot};

use crate::context::{ClientEntry, ClientSender, RoomContext};
use crate::logic::RoomLogic;
use crate::timer::TimerTable;
use crate::{ClientData, RoomError};
use roomcast_protocol::ClientId;

/// Command channel size for room actors.
const ROOM_CHANNEL_SIZE: usize = 64;

/// Commands sent to a room actor through its mailbox.
///
/// The `oneshot::Sender` in some variants is a reply channel — the caller
/// sends a command and awaits the outcome. Leave and message delivery are
/// fire-and-forget by design: their failures are contained inside the room.
pub(crate) enum RoomCommand<L: RoomLogic> {
    /// Run the creation handler against the still-empty room.
    Create {
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Run the join handler, register the client, send it a snapshot.
    Join {
        client: ClientData,
        sender: ClientSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Remove a client by identity and run the leave handler.
    Leave { client_id: ClientId },

    /// Deliver a decoded message from a joined client.
    Message { client_id: ClientId, msg: L::Message },

    /// A scheduled timer elapsed.
    TimerFired {
        name: String,
        generation: u64,
        event: L::TimerEvent,
    },
}

/// Handle to a running room actor. Cheap to clone — it's an
/// `mpsc::Sender` wrapper. The registry holds one per live room.
pub struct RoomHandle<L: RoomLogic> {
    key: RoomKey,
    sender: mpsc::Sender<RoomCommand<L>>,
}

impl<L: RoomLogic> std::fmt::Debug for RoomHandle<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomHandle")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl<L: RoomLogic> Clone for RoomHandle<L> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            sender: self.sender.clone(),
        }
    }
}

impl<L: RoomLogic> RoomHandle<L> {
    /// The key this room is registered under.
    pub fn key(&self) -> &RoomKey {
        &self.key
    }

    /// Runs the creation handler. Invoked exactly once, by the registry.
    pub(crate) async fn create(&self) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Create { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.key.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.key.clone()))?
    }

    /// Joins a client to the room.
    pub async fn join(&self, client: ClientData, sender: ClientSender) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                client,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.key.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.key.clone()))?
    }

    /// Removes a client by identity. Idempotent — a second leave for the
    /// same client is ignored by the actor.
    pub async fn leave(&self, client_id: ClientId) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Leave { client_id })
            .await
            .map_err(|_| RoomError::Unavailable(self.key.clone()))
    }

    /// Delivers a decoded client message (fire-and-forget).
    pub async fn message(&self, client_id: ClientId, msg: L::Message) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Message { client_id, msg })
            .await
            .map_err(|_| RoomError::Unavailable(self.key.clone()))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor<L: RoomLogic> {
    key: RoomKey,
    state: L::State,
    /// Registered clients in join order. Broadcast iterates this order;
    /// removal is by identity, never by position.
    clients: Vec<ClientEntry>,
    timers: TimerTable<L>,
    receiver: mpsc::Receiver<RoomCommand<L>>,
}

impl<L: RoomLogic> RoomActor<L> {
    /// Runs the actor loop until every handle is gone or creation fails.
    async fn run(mut self) {
        tracing::debug!(room_key = %self.key, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Create { reply } => {
                    let result = self.handle_create();
                    let failed = result.is_err();
                    let _ = reply.send(result);
                    if failed {
                        break;
                    }
                }
                RoomCommand::Join {
                    client,
                    sender,
                    reply,
                } => {
                    let result = self.handle_join(client, sender);
                    let _ = reply.send(result);
                }
                RoomCommand::Leave { client_id } => {
                    self.handle_leave(client_id);
                }
                RoomCommand::Message { client_id, msg } => {
                    self.handle_message(client_id, msg);
                }
                RoomCommand::TimerFired {
                    name,
                    generation,
                    event,
                } => {
                    self.handle_timer_fired(name, generation, event);
                }
            }
        }

        self.timers.abort_all();
        tracing::debug!(room_key = %self.key, "room actor stopped");
    }

    fn handle_create(&mut self) -> Result<(), RoomError> {
        let mut ctx = RoomContext {
            key: &self.key,
            state: &mut self.state,
            clients: &self.clients,
            timers: &mut self.timers,
        };
        L::on_create(&mut ctx).map_err(|e| RoomError::CreationFailed(self.key.clone(), e))
    }

    fn handle_join(&mut self, client: ClientData, sender: ClientSender) -> Result<(), RoomError> {
        // The join handler runs against the previously-joined clients:
        // its set_state calls broadcast to them, not to the newcomer.
        {
            let mut ctx = RoomContext {
                key: &self.key,
                state: &mut self.state,
                clients: &self.clients,
                timers: &mut self.timers,
            };
            L::on_join(&mut ctx, &client)
                .map_err(|e| RoomError::JoinRejected(self.key.clone(), e))?;
        }

        let client_id = client.client_id.clone();
        self.clients.push(ClientEntry {
            data: client,
            sender,
        });

        // Directed snapshot for the newcomer, reflecting whatever the join
        // handler just did to the state.
        match encode_state(&self.state) {
            Ok(frame) => {
                if let Some(entry) = self.clients.last() {
                    let _ = entry.sender.send(frame);
                }
            }
            Err(e) => {
                tracing::error!(
                    room_key = %self.key,
                    error = %e,
                    "join snapshot failed to encode"
                );
            }
        }

        tracing::info!(
            room_key = %self.key,
            %client_id,
            clients = self.clients.len(),
            "client joined"
        );
        Ok(())
    }

    fn handle_leave(&mut self, client_id: ClientId) {
        let Some(pos) = self
            .clients
            .iter()
            .position(|c| c.data.client_id == client_id)
        else {
            // Duplicate close events land here; removal is idempotent.
            tracing::debug!(room_key = %self.key, %client_id, "leave for unknown client ignored");
            return;
        };
        let entry = self.clients.remove(pos);

        tracing::info!(
            room_key = %self.key,
            %client_id,
            clients = self.clients.len(),
            "client left"
        );

        let mut ctx = RoomContext {
            key: &self.key,
            state: &mut self.state,
            clients: &self.clients,
            timers: &mut self.timers,
        };
        if let Err(e) = L::on_leave(&mut ctx, &entry.data) {
            tracing::warn!(
                room_key = %self.key,
                %client_id,
                error = %e,
                "leave handler failed"
            );
        }
    }

    fn handle_message(&mut self, client_id: ClientId, msg: L::Message) {
        let Some(sender) = self
            .clients
            .iter()
            .find(|c| c.data.client_id == client_id)
            .map(|c| c.data.clone())
        else {
            tracing::debug!(room_key = %self.key, %client_id, "message from non-member, ignoring");
            return;
        };

        let mut ctx = RoomContext {
            key: &self.key,
            state: &mut self.state,
            clients: &self.clients,
            timers: &mut self.timers,
        };
        if let Err(e) = L::on_message(&mut ctx, &sender, msg) {
            tracing::warn!(
                room_key = %self.key,
                %client_id,
                error = %e,
                "message handler failed"
            );
        }
    }

    fn handle_timer_fired(&mut self, name: String, generation: u64, event: L::TimerEvent) {
        if !self.timers.claim(&name, generation) {
            tracing::trace!(room_key = %self.key, timer = %name, "stale timer discarded");
            return;
        }

        let mut ctx = RoomContext {
            key: &self.key,
            state: &mut self.state,
            clients: &self.clients,
            timers: &mut self.timers,
        };
        if let Err(e) = L::on_timer(&mut ctx, &name, event) {
            tracing::warn!(
                room_key = %self.key,
                timer = %name,
                error = %e,
                "timer handler failed"
            );
        }
    }
}

/// Spawns a new room actor task and returns a handle to it.
///
/// The room starts empty — default state, no clients, no timers. The
/// registry runs the creation handler through the handle before anyone
/// else sees it.
pub(crate) fn spawn_room<L: RoomLogic>(key: RoomKey) -> RoomHandle<L> {
    let (tx, rx) = mpsc::channel(ROOM_CHANNEL_SIZE);

    let actor = RoomActor::<L> {
        key: key.clone(),
        state: L::State::default(),
        clients: Vec::new(),
        timers: TimerTable::new(key.clone(), tx.clone()),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { key, sender: tx }
}
