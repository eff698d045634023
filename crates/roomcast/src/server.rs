//! The server: builder, room-type table, and accept loop.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use roomcast_room::RoomLogic;
use roomcast_session::{Authenticator, NoAuth, authenticate_connection};
use roomcast_transport::{WebSocketConnection, WebSocketTransport};

use crate::RoomcastError;
use crate::handler::{AttachFn, make_attach_fn};

// ---------------------------------------------------------------------------
// ServerBuilder
// ---------------------------------------------------------------------------

/// Configures a [`Server`] before it binds.
///
/// ```no_run
/// # use roomcast::ServerBuilder;
/// # use roomcast::{RoomContext, RoomLogic, RoomState, ClientData, HandlerError};
/// # use serde::{Deserialize, Serialize};
/// # #[derive(Default, Serialize)]
/// # struct S;
/// # impl RoomState for S { type Patch = (); fn apply(&mut self, _: ()) {} }
/// # #[derive(Deserialize)]
/// # #[serde(tag = "type", content = "value")]
/// # enum M {}
/// # struct Chat;
/// # impl RoomLogic for Chat {
/// #     type State = S;
/// #     type Message = M;
/// #     type TimerEvent = ();
/// #     fn on_create(_: &mut RoomContext<'_, Self>) -> Result<(), HandlerError> { Ok(()) }
/// #     fn on_message(_: &mut RoomContext<'_, Self>, _: &ClientData, m: M) -> Result<(), HandlerError> { match m {} }
/// # }
/// # async fn demo() -> Result<(), roomcast::RoomcastError> {
/// let server = ServerBuilder::new()
///     .bind("127.0.0.1:8080")
///     .room_type::<Chat>("chat")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct ServerBuilder<A = NoAuth> {
    addr: String,
    auth: A,
    room_types: HashMap<String, AttachFn>,
}

impl ServerBuilder<NoAuth> {
    /// Starts a builder with no authenticator (every connection is
    /// anonymous) and a localhost default address.
    pub fn new() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
            auth: NoAuth,
            room_types: HashMap::new(),
        }
    }
}

impl Default for ServerBuilder<NoAuth> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Authenticator> ServerBuilder<A> {
    /// Sets the address to listen on. Use port 0 to let the OS pick one
    /// (read it back with [`Server::local_addr`]).
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.addr = addr.into();
        self
    }

    /// Replaces the authenticator. It runs once per connection, after
    /// addressing validation and before any room is touched.
    pub fn authenticator<B: Authenticator>(self, auth: B) -> ServerBuilder<B> {
        ServerBuilder {
            addr: self.addr,
            auth,
            room_types: self.room_types,
        }
    }

    /// Registers a room type under `name` — the first path segment clients
    /// connect with. Each registered type gets its own registry, so rooms
    /// of different types never interact.
    pub fn room_type<L: RoomLogic>(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        tracing::debug!(room_type = %name, "registered room type");
        self.room_types.insert(name, make_attach_fn::<L>());
        self
    }

    /// Binds the listener and returns the ready-to-run server.
    pub async fn build(self) -> Result<Server<A>, RoomcastError> {
        let transport = WebSocketTransport::bind(&self.addr).await?;
        Ok(Server {
            transport,
            auth: Arc::new(self.auth),
            room_types: Arc::new(self.room_types),
        })
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// A bound Roomcast server. [`run`](Self::run) accepts connections forever.
pub struct Server<A = NoAuth> {
    transport: WebSocketTransport,
    auth: Arc<A>,
    room_types: Arc<HashMap<String, AttachFn>>,
}

impl<A: Authenticator> Server<A> {
    /// The address the listener actually bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Accepts and serves connections until the listener fails.
    ///
    /// Each accepted connection runs in its own task; a failed handshake or
    /// a connection-level error never affects the accept loop.
    pub async fn run(mut self) -> Result<(), RoomcastError> {
        loop {
            let conn = match self.transport.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            let auth = self.auth.clone();
            let room_types = self.room_types.clone();
            tokio::spawn(async move {
                handle_connection(auth, room_types, conn).await;
            });
        }
    }
}

/// Admits one connection and hands it to its room type's driver.
///
/// Any admission failure (bad path, unknown room type, rejected auth) just
/// drops the connection, which closes the socket; nothing above the session
/// layer has been touched yet.
async fn handle_connection<A>(
    auth: Arc<A>,
    room_types: Arc<HashMap<String, AttachFn>>,
    conn: WebSocketConnection,
) where
    A: Authenticator,
{
    let conn_id = conn.id();
    let client = match authenticate_connection(&*auth, conn.request(), |room_type| {
        room_types.contains_key(room_type)
    })
    .await
    {
        Ok(client) => client,
        Err(e) => {
            tracing::info!(%conn_id, error = %e, "connection rejected at admission");
            return;
        }
    };

    // Admission already verified the type is registered.
    let Some(attach) = room_types.get(&client.room_key.room_type).cloned() else {
        tracing::error!(%conn_id, room_key = %client.room_key, "room type vanished after admission");
        return;
    };

    if let Err(e) = attach(conn, client).await {
        tracing::info!(%conn_id, error = %e, "connection closed with error");
    }
}
