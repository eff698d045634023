/// Errors surfaced by the listener and the two connection halves.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listener or accepting a TCP connection failed.
    #[error("listener error: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// The HTTP upgrade to WebSocket did not complete.
    #[error("websocket handshake failed: {0}")]
    HandshakeFailed(String),

    /// Writing a frame to the peer failed; the connection is unusable.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Reading the next frame from the peer failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),
}
