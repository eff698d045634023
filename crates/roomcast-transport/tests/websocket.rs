//! Integration tests for the WebSocket transport: handshake capture,
//! text round-trips, and clean close.

use futures_util::{SinkExt, StreamExt};
use roomcast_transport::WebSocketTransport;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;

/// Binds a transport on an ephemeral port and returns it with its address.
async fn bind_transport() -> (WebSocketTransport, String) {
    let transport = WebSocketTransport::bind("127.0.0.1:0")
        .await
        .expect("bind should succeed");
    let addr = transport
        .local_addr()
        .expect("should have local addr")
        .to_string();
    (transport, addr)
}

#[tokio::test]
async fn test_accept_captures_path() {
    let (mut transport, addr) = bind_transport().await;

    let client = tokio::spawn(async move {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/chat/my-chat"))
            .await
            .expect("connect");
        ws
    });

    let conn = transport.accept().await.expect("accept");
    assert_eq!(conn.request().path, "/chat/my-chat");

    drop(client.await.unwrap());
}

#[tokio::test]
async fn test_accept_captures_headers() {
    let (mut transport, addr) = bind_transport().await;

    let client = tokio::spawn(async move {
        let mut req = format!("ws://{addr}/chat/a")
            .into_client_request()
            .expect("request");
        req.headers_mut()
            .insert("x-token", "secret-123".parse().unwrap());
        let (ws, _) = tokio_tungstenite::connect_async(req).await.expect("connect");
        ws
    });

    let conn = transport.accept().await.expect("accept");
    assert_eq!(conn.request().header("x-token"), Some("secret-123"));
    // Header lookup is case-insensitive.
    assert_eq!(conn.request().header("X-Token"), Some("secret-123"));
    assert_eq!(conn.request().header("x-missing"), None);

    drop(client.await.unwrap());
}

#[tokio::test]
async fn test_text_round_trip_through_split_halves() {
    let (mut transport, addr) = bind_transport().await;

    let client = tokio::spawn(async move {
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/t/1"))
            .await
            .expect("connect");
        ws.send(Message::text("hello server")).await.expect("send");
        let reply = ws.next().await.expect("reply").expect("frame");
        assert_eq!(reply, Message::text("hello client"));
        ws
    });

    let conn = transport.accept().await.expect("accept");
    let (mut tx, mut rx) = conn.split();

    let inbound = rx.next_text().await.expect("recv").expect("open");
    assert_eq!(inbound, "hello server");

    tx.send_text("hello client".into()).await.expect("send");

    drop(client.await.unwrap());
}

#[tokio::test]
async fn test_next_text_returns_none_on_close() {
    let (mut transport, addr) = bind_transport().await;

    let client = tokio::spawn(async move {
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/t/1"))
            .await
            .expect("connect");
        ws.close(None).await.expect("close");
    });

    let conn = transport.accept().await.expect("accept");
    let (_tx, mut rx) = conn.split();

    assert!(rx.next_text().await.expect("recv").is_none());
    client.await.unwrap();
}

#[tokio::test]
async fn test_binary_utf8_is_accepted_as_text() {
    let (mut transport, addr) = bind_transport().await;

    let client = tokio::spawn(async move {
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/t/1"))
            .await
            .expect("connect");
        ws.send(Message::Binary(b"{\"ok\":true}".to_vec().into()))
            .await
            .expect("send");
        ws
    });

    let conn = transport.accept().await.expect("accept");
    let (_tx, mut rx) = conn.split();

    let inbound = rx.next_text().await.expect("recv").expect("open");
    assert_eq!(inbound, "{\"ok\":true}");

    drop(client.await.unwrap());
}
