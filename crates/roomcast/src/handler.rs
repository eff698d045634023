//! Per-connection driver: join a room, pump frames both ways, leave once.

use std::sync::Arc;

use roomcast_protocol::{ClientId, decode_message};
use roomcast_room::{RoomHandle, RoomLogic, RoomRegistry};
use roomcast_session::ClientData;
use roomcast_transport::{ConnectionReceiver, WebSocketConnection};
use tokio::sync::mpsc;

use crate::RoomcastError;

/// Why a connection's read loop ended. Logged at termination.
enum Disconnect {
    /// The peer sent a close frame or the stream ended cleanly.
    PeerClosed,
    /// The transport reported a read error.
    TransportError,
    /// The room's actor vanished mid-session.
    RoomGone,
}

impl Disconnect {
    fn as_str(&self) -> &'static str {
        match self {
            Disconnect::PeerClosed => "peer closed",
            Disconnect::TransportError => "transport error",
            Disconnect::RoomGone => "room gone",
        }
    }
}

/// Drives one admitted connection against its room, from join to leave.
///
/// Resolves (creating if needed) the room, joins it, then pumps frames in
/// both directions: a spawned writer task drains the room's outbound channel
/// into the socket, while this task's read loop decodes inbound messages and
/// forwards them to the room. Whatever ends the read loop, the client leaves
/// the room exactly once before this function returns.
pub(crate) async fn drive_connection<L: RoomLogic>(
    registry: Arc<RoomRegistry<L>>,
    conn: WebSocketConnection,
    client: ClientData,
) -> Result<(), RoomcastError> {
    let conn_id = conn.id();
    let client_id = client.client_id.clone();
    let room_key = client.room_key.clone();

    let handle = registry.resolve(&room_key).await?;

    let (mut sender, receiver) = conn.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();

    // Writer task: drains pre-serialized frames into the socket. Ends when
    // the room drops this client's channel (leave) or the socket dies.
    let writer = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if sender.send_text(frame).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    // If the join handler rejects us, the room drops the channel and the
    // writer closes the socket on its way out.
    if let Err(e) = handle.join(client, out_tx).await {
        let _ = writer.await;
        return Err(e.into());
    }

    let reason = read_loop::<L>(receiver, &handle, &client_id).await;

    // Leave exactly once, no matter how the read loop ended. The room
    // dropping our channel is what lets the writer finish.
    let _ = handle.leave(client_id.clone()).await;
    let _ = writer.await;

    tracing::info!(
        %conn_id,
        %client_id,
        %room_key,
        reason = reason.as_str(),
        "connection terminated"
    );
    Ok(())
}

/// Reads text frames until the connection or the room goes away.
///
/// Frames that fail to decode into `L::Message` — malformed JSON, an
/// unknown message kind, a bad payload shape — are logged and discarded;
/// the connection stays up.
async fn read_loop<L: RoomLogic>(
    mut receiver: ConnectionReceiver,
    handle: &RoomHandle<L>,
    client_id: &ClientId,
) -> Disconnect {
    loop {
        match receiver.next_text().await {
            Ok(Some(text)) => match decode_message::<L::Message>(&text) {
                Ok(msg) => {
                    if handle.message(client_id.clone(), msg).await.is_err() {
                        return Disconnect::RoomGone;
                    }
                }
                Err(e) => {
                    tracing::debug!(%client_id, error = %e, "discarding undecodable frame");
                }
            },
            Ok(None) => return Disconnect::PeerClosed,
            Err(e) => {
                tracing::debug!(%client_id, error = %e, "read failed");
                return Disconnect::TransportError;
            }
        }
    }
}

/// Type-erased entry point for one registered room type.
///
/// The server stores one of these per room-type name; each closure captures
/// that type's [`RoomRegistry`] and forwards to [`drive_connection`].
pub(crate) type AttachFn = Arc<
    dyn Fn(
            WebSocketConnection,
            ClientData,
        ) -> futures_util::future::BoxFuture<'static, Result<(), RoomcastError>>
        + Send
        + Sync,
>;

pub(crate) fn make_attach_fn<L: RoomLogic>() -> AttachFn {
    let registry = Arc::new(RoomRegistry::<L>::new());
    Arc::new(move |conn, client| {
        let registry = registry.clone();
        Box::pin(drive_connection::<L>(registry, conn, client))
    })
}
