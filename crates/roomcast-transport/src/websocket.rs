//! WebSocket listener and connection types over `tokio-tungstenite`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};

use crate::{ConnectionId, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

// ---------------------------------------------------------------------------
// HandshakeRequest
// ---------------------------------------------------------------------------

/// The addressing information captured from the HTTP upgrade request.
///
/// The path carries the room address (`/{room_type}/{room_id}`); the headers
/// are handed to the application's authenticator. Both are copied out of the
/// handshake so no `http` types leak above the transport layer.
#[derive(Debug, Clone)]
pub struct HandshakeRequest {
    /// The request path, including the leading slash.
    pub path: String,
    /// Header name/value pairs. Values that aren't valid UTF-8 are omitted.
    pub headers: Vec<(String, String)>,
}

impl HandshakeRequest {
    /// Returns the first header with the given name (case-insensitive),
    /// if present.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// ---------------------------------------------------------------------------
// WebSocketTransport
// ---------------------------------------------------------------------------

/// A WebSocket listener that accepts incoming connections.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    /// Binds the listener to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self { listener })
    }

    /// Returns the local address the listener is bound to.
    ///
    /// Useful when binding to port 0 in tests.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Waits for and accepts the next incoming connection.
    ///
    /// Performs the WebSocket upgrade, capturing the request path and
    /// headers on the way through.
    pub async fn accept(&mut self) -> Result<WebSocketConnection, TransportError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let mut request: Option<HandshakeRequest> = None;
        let ws = tokio_tungstenite::accept_hdr_async(
            stream,
            |req: &Request, resp: Response| {
                let headers = req
                    .headers()
                    .iter()
                    .filter_map(|(name, value)| {
                        value
                            .to_str()
                            .ok()
                            .map(|v| (name.as_str().to_string(), v.to_string()))
                    })
                    .collect();
                request = Some(HandshakeRequest {
                    path: req.uri().path().to_string(),
                    headers,
                });
                Ok(resp)
            },
        )
        .await
        .map_err(|e| TransportError::HandshakeFailed(e.to_string()))?;

        let request = request.ok_or_else(|| {
            TransportError::HandshakeFailed("upgrade completed without a request".into())
        })?;

        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, %addr, path = %request.path, "accepted WebSocket connection");

        Ok(WebSocketConnection { id, request, ws })
    }
}

// ---------------------------------------------------------------------------
// WebSocketConnection
// ---------------------------------------------------------------------------

/// A single accepted WebSocket connection.
///
/// Dropping it without [`split`](Self::split) closes the underlying stream,
/// which is how pre-admission failures terminate a connection.
pub struct WebSocketConnection {
    id: ConnectionId,
    request: HandshakeRequest,
    ws: WsStream,
}

impl WebSocketConnection {
    /// Returns the unique identifier for this connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the captured upgrade request (path and headers).
    pub fn request(&self) -> &HandshakeRequest {
        &self.request
    }

    /// Splits the connection into independently-owned halves.
    ///
    /// The sender can be driven by a writer task while the receiver sits in
    /// a read loop — neither blocks the other.
    pub fn split(self) -> (ConnectionSender, ConnectionReceiver) {
        let (sink, stream) = self.ws.split();
        (
            ConnectionSender { id: self.id, sink },
            ConnectionReceiver {
                id: self.id,
                stream,
            },
        )
    }
}

/// The write half of a connection.
pub struct ConnectionSender {
    id: ConnectionId,
    sink: SplitSink<WsStream, Message>,
}

impl ConnectionSender {
    /// Sends a text frame to the remote peer.
    pub async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.sink
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| {
                TransportError::SendFailed(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    e,
                ))
            })
    }

    /// Sends a close frame and flushes the stream.
    pub async fn close(&mut self) -> Result<(), TransportError> {
        self.sink.send(Message::Close(None)).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(std::io::ErrorKind::BrokenPipe, e))
        })
    }

    /// Returns the unique identifier for this connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

/// The read half of a connection.
pub struct ConnectionReceiver {
    id: ConnectionId,
    stream: SplitStream<WsStream>,
}

impl ConnectionReceiver {
    /// Receives the next text payload from the remote peer.
    ///
    /// Binary frames carrying valid UTF-8 are accepted as text; ping/pong
    /// frames are skipped. Returns `Ok(None)` when the connection is
    /// cleanly closed.
    pub async fn next_text(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_str().to_owned())),
                Some(Ok(Message::Binary(data))) => match String::from_utf8(data.to_vec()) {
                    Ok(text) => return Ok(Some(text)),
                    Err(_) => {
                        tracing::debug!(id = %self.id, "skipping non-UTF-8 binary frame");
                        continue;
                    }
                },
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // ping/pong/raw frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }

    /// Returns the unique identifier for this connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}
