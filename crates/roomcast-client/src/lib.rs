//! A typed client for Roomcast servers.
//!
//! [`RoomClient::connect`] opens a WebSocket to one room and returns a
//! handle for sending messages plus an event stream of state snapshots.
//! The protocol is deliberately thin: every inbound frame is a full
//! `{"type":"state","value":...}` snapshot, decoded into the caller's
//! state type.

mod error;

pub use error::ClientError;

use futures_util::{SinkExt, StreamExt};
use roomcast_protocol::ServerFrame;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

/// Something the server told us, or the end of the conversation.
#[derive(Debug)]
pub enum RoomEvent<S> {
    /// A full state snapshot (the initial one on join, then one per
    /// server-side mutation).
    State(S),
    /// The connection ended. `reason` carries the server's close reason
    /// when one was sent.
    Closed { reason: Option<String> },
}

enum Outbound {
    Frame(String),
    Close,
}

/// A connection to one room.
///
/// Cheap to clone; dropping every clone closes the connection. Events
/// arrive on the receiver returned by [`connect`](Self::connect).
#[derive(Clone)]
pub struct RoomClient {
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl RoomClient {
    /// Connects to `{server_url}/{room_type}/{room_id}`.
    ///
    /// `server_url` is the base WebSocket URL, e.g. `ws://localhost:8080`.
    /// The returned receiver yields the initial snapshot first, then one
    /// [`RoomEvent::State`] per broadcast, and finally a single
    /// [`RoomEvent::Closed`].
    pub async fn connect<S>(
        server_url: &str,
        room_type: &str,
        room_id: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<RoomEvent<S>>), ClientError>
    where
        S: DeserializeOwned + Send + 'static,
    {
        let url = format!(
            "{}/{room_type}/{room_id}",
            server_url.trim_end_matches('/')
        );
        let (ws, _) = connect_async(url.as_str())
            .await
            .map_err(|e| ClientError::Connect(e.to_string()))?;
        tracing::debug!(%url, "connected");

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_connection::<S>(ws, outbound_rx, event_tx));

        Ok((
            Self {
                outbound: outbound_tx,
            },
            event_rx,
        ))
    }

    /// Sends a message to the room.
    ///
    /// `msg` is serialized to JSON; use a serde enum tagged
    /// `#[serde(tag = "type", content = "value")]` to match what the
    /// server's room type expects.
    pub fn send<M: Serialize>(&self, msg: &M) -> Result<(), ClientError> {
        let frame = serde_json::to_string(msg).map_err(ClientError::Encode)?;
        self.outbound
            .send(Outbound::Frame(frame))
            .map_err(|_| ClientError::ConnectionClosed)
    }

    /// Initiates a clean close. The event stream ends with
    /// [`RoomEvent::Closed`] once the server acknowledges.
    pub fn close(&self) {
        let _ = self.outbound.send(Outbound::Close);
    }
}

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Pumps the socket: outbound frames down, inbound snapshots up.
async fn run_connection<S>(
    mut ws: WsStream,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    events: mpsc::UnboundedSender<RoomEvent<S>>,
) where
    S: DeserializeOwned + Send + 'static,
{
    let reason = loop {
        tokio::select! {
            cmd = outbound.recv() => match cmd {
                Some(Outbound::Frame(frame)) => {
                    if ws.send(Message::Text(frame.into())).await.is_err() {
                        break None;
                    }
                }
                // Close requested, or every handle was dropped.
                Some(Outbound::Close) | None => {
                    let _ = ws.close(None).await;
                    break None;
                }
            },
            msg = ws.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ServerFrame<S>>(text.as_str()) {
                        Ok(ServerFrame::State(state)) => {
                            if events.send(RoomEvent::State(state)).is_err() {
                                break None;
                            }
                        }
                        Err(e) => {
                            tracing::debug!(error = %e, "discarding undecodable frame");
                        }
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    break frame.map(|f| f.reason.as_str().to_owned());
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    tracing::debug!(error = %e, "connection error");
                    break None;
                }
                None => break None,
            },
        }
    };

    let _ = events.send(RoomEvent::Closed { reason });
}
