//! Integration tests for the room actor system: state merging, broadcast,
//! single-flight creation, membership, and timers.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use roomcast_protocol::{ClientId, RoomKey};
use roomcast_room::{
    ClientData, ClientSender, HandlerError, RoomContext, RoomLogic, RoomRegistry, RoomState,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// A small message-board room type used by most tests
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize)]
struct BoardState {
    topic: String,
    messages: Vec<String>,
}

#[derive(Debug, Default)]
struct BoardPatch {
    topic: Option<String>,
    messages: Option<Vec<String>>,
}

impl RoomState for BoardState {
    type Patch = BoardPatch;

    fn apply(&mut self, patch: BoardPatch) {
        if let Some(topic) = patch.topic {
            self.topic = topic;
        }
        if let Some(messages) = patch.messages {
            self.messages = messages;
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
enum BoardMessage {
    SetTopic(String),
    Post(String),
    /// Schedules a short timer that posts a reminder.
    Remind(String),
    CancelReminder,
}

struct Board;

impl RoomLogic for Board {
    type State = BoardState;
    type Message = BoardMessage;
    type TimerEvent = String;

    fn on_create(room: &mut RoomContext<'_, Self>) -> Result<(), HandlerError> {
        room.set_state(BoardPatch {
            topic: Some("general".into()),
            ..Default::default()
        });
        Ok(())
    }

    fn on_join(room: &mut RoomContext<'_, Self>, client: &ClientData) -> Result<(), HandlerError> {
        // Announce to the clients already present; the newcomer's snapshot
        // will include the announcement.
        if room.client_count() > 0 || !room.state().messages.is_empty() {
            let mut messages = room.state().messages.clone();
            messages.push(format!("{} joined", client.client_id));
            room.set_state(BoardPatch {
                messages: Some(messages),
                ..Default::default()
            });
        }
        Ok(())
    }

    fn on_message(
        room: &mut RoomContext<'_, Self>,
        _sender: &ClientData,
        msg: BoardMessage,
    ) -> Result<(), HandlerError> {
        match msg {
            BoardMessage::SetTopic(topic) => {
                room.set_state(BoardPatch {
                    topic: Some(topic),
                    ..Default::default()
                });
            }
            BoardMessage::Post(text) => {
                let mut messages = room.state().messages.clone();
                messages.push(text);
                room.set_state(BoardPatch {
                    messages: Some(messages),
                    ..Default::default()
                });
            }
            BoardMessage::Remind(text) => {
                room.set_timer("reminder", Duration::from_millis(30), text);
            }
            BoardMessage::CancelReminder => {
                room.clear_timer("reminder");
            }
        }
        Ok(())
    }

    fn on_timer(
        room: &mut RoomContext<'_, Self>,
        _name: &str,
        event: String,
    ) -> Result<(), HandlerError> {
        let mut messages = room.state().messages.clone();
        messages.push(format!("reminder: {event}"));
        room.set_state(BoardPatch {
            messages: Some(messages),
            ..Default::default()
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn board_key(id: &str) -> RoomKey {
    RoomKey::new("board", id)
}

fn client(key: &RoomKey, id: &str) -> (ClientData, ClientSender, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let data = ClientData {
        client_id: ClientId(id.to_string()),
        user_id: None,
        room_key: key.clone(),
    };
    (data, tx, rx)
}

async fn recv_frame(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for frame")
        .expect("channel closed")
}

// ---------------------------------------------------------------------------
// State and broadcast
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_join_snapshot_reflects_creation_state() {
    let registry = RoomRegistry::<Board>::new();
    let key = board_key("snap");
    let handle = registry.resolve(&key).await.unwrap();

    let (data, tx, mut rx) = client(&key, "c1");
    handle.join(data, tx).await.unwrap();

    let frame = recv_frame(&mut rx).await;
    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(value["type"], "state");
    assert_eq!(value["value"]["topic"], "general");
    assert_eq!(value["value"]["messages"], serde_json::json!([]));
}

#[tokio::test]
async fn test_patch_overwrites_only_named_fields() {
    let registry = RoomRegistry::<Board>::new();
    let key = board_key("merge");
    let handle = registry.resolve(&key).await.unwrap();

    let (data, tx, mut rx) = client(&key, "c1");
    handle.join(data, tx).await.unwrap();
    recv_frame(&mut rx).await; // snapshot

    handle
        .message(ClientId("c1".into()), BoardMessage::Post("hi".into()))
        .await
        .unwrap();
    let frame = recv_frame(&mut rx).await;
    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
    // topic survives a patch that only carried messages
    assert_eq!(value["value"]["topic"], "general");
    assert_eq!(value["value"]["messages"], serde_json::json!(["hi"]));

    handle
        .message(
            ClientId("c1".into()),
            BoardMessage::SetTopic("offtopic".into()),
        )
        .await
        .unwrap();
    let frame = recv_frame(&mut rx).await;
    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
    // messages survive a patch that only carried topic
    assert_eq!(value["value"]["topic"], "offtopic");
    assert_eq!(value["value"]["messages"], serde_json::json!(["hi"]));
}

#[tokio::test]
async fn test_broadcast_is_byte_identical_across_clients() {
    let registry = RoomRegistry::<Board>::new();
    let key = board_key("bytes");
    let handle = registry.resolve(&key).await.unwrap();

    let (d1, t1, mut r1) = client(&key, "c1");
    handle.join(d1, t1).await.unwrap();
    recv_frame(&mut r1).await;

    let (d2, t2, mut r2) = client(&key, "c2");
    handle.join(d2, t2).await.unwrap();
    recv_frame(&mut r1).await; // join announcement broadcast
    recv_frame(&mut r2).await; // newcomer snapshot

    handle
        .message(ClientId("c1".into()), BoardMessage::Post("same".into()))
        .await
        .unwrap();

    let f1 = recv_frame(&mut r1).await;
    let f2 = recv_frame(&mut r2).await;
    assert_eq!(f1, f2);
}

#[tokio::test]
async fn test_join_announcement_reaches_prior_clients_and_newcomer_snapshot() {
    let registry = RoomRegistry::<Board>::new();
    let key = board_key("announce");
    let handle = registry.resolve(&key).await.unwrap();

    let (d1, t1, mut r1) = client(&key, "c1");
    handle.join(d1, t1).await.unwrap();
    let first = recv_frame(&mut r1).await;
    let first: serde_json::Value = serde_json::from_str(&first).unwrap();
    // first joiner saw an empty room, no announcement for itself
    assert_eq!(first["value"]["messages"], serde_json::json!([]));

    let (d2, t2, mut r2) = client(&key, "c2");
    handle.join(d2, t2).await.unwrap();

    let broadcast = recv_frame(&mut r1).await;
    let snapshot = recv_frame(&mut r2).await;
    let broadcast: serde_json::Value = serde_json::from_str(&broadcast).unwrap();
    let snapshot: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
    assert_eq!(
        broadcast["value"]["messages"],
        serde_json::json!(["c2 joined"])
    );
    // the directed snapshot already reflects the join handler's mutation
    assert_eq!(
        snapshot["value"]["messages"],
        serde_json::json!(["c2 joined"])
    );
}

// ---------------------------------------------------------------------------
// Membership
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_leave_is_idempotent_and_stops_delivery() {
    let registry = RoomRegistry::<Board>::new();
    let key = board_key("leave");
    let handle = registry.resolve(&key).await.unwrap();

    let (d1, t1, mut r1) = client(&key, "c1");
    let (d2, t2, mut r2) = client(&key, "c2");
    handle.join(d1, t1).await.unwrap();
    recv_frame(&mut r1).await;
    handle.join(d2, t2).await.unwrap();
    recv_frame(&mut r1).await;
    recv_frame(&mut r2).await;

    handle.leave(ClientId("c2".into())).await.unwrap();
    // a second leave for the same client is silently ignored
    handle.leave(ClientId("c2".into())).await.unwrap();

    handle
        .message(ClientId("c1".into()), BoardMessage::Post("after".into()))
        .await
        .unwrap();
    let frame = recv_frame(&mut r1).await;
    assert!(frame.contains("after"));
    assert!(
        tokio::time::timeout(Duration::from_millis(100), r2.recv())
            .await
            .is_err(),
        "departed client must not receive broadcasts"
    );
}

#[tokio::test]
async fn test_message_from_non_member_is_discarded() {
    let registry = RoomRegistry::<Board>::new();
    let key = board_key("stranger");
    let handle = registry.resolve(&key).await.unwrap();

    let (d1, t1, mut r1) = client(&key, "c1");
    handle.join(d1, t1).await.unwrap();
    recv_frame(&mut r1).await;

    handle
        .message(
            ClientId("ghost".into()),
            BoardMessage::Post("should vanish".into()),
        )
        .await
        .unwrap();
    handle
        .message(ClientId("c1".into()), BoardMessage::Post("real".into()))
        .await
        .unwrap();

    let frame = recv_frame(&mut r1).await;
    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(value["value"]["messages"], serde_json::json!(["real"]));
}

// ---------------------------------------------------------------------------
// Timers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_timer_fires_once_after_delay() {
    let registry = RoomRegistry::<Board>::new();
    let key = board_key("timer-fire");
    let handle = registry.resolve(&key).await.unwrap();

    let (d1, t1, mut r1) = client(&key, "c1");
    handle.join(d1, t1).await.unwrap();
    recv_frame(&mut r1).await;

    handle
        .message(ClientId("c1".into()), BoardMessage::Remind("tea".into()))
        .await
        .unwrap();

    let frame = recv_frame(&mut r1).await;
    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(
        value["value"]["messages"],
        serde_json::json!(["reminder: tea"])
    );
    // one-shot: nothing further arrives
    assert!(
        tokio::time::timeout(Duration::from_millis(150), r1.recv())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_cleared_timer_never_fires() {
    let registry = RoomRegistry::<Board>::new();
    let key = board_key("timer-clear");
    let handle = registry.resolve(&key).await.unwrap();

    let (d1, t1, mut r1) = client(&key, "c1");
    handle.join(d1, t1).await.unwrap();
    recv_frame(&mut r1).await;

    handle
        .message(ClientId("c1".into()), BoardMessage::Remind("tea".into()))
        .await
        .unwrap();
    handle
        .message(ClientId("c1".into()), BoardMessage::CancelReminder)
        .await
        .unwrap();

    assert!(
        tokio::time::timeout(Duration::from_millis(200), r1.recv())
            .await
            .is_err(),
        "cleared timer must not fire"
    );
}

#[tokio::test]
async fn test_replaced_timer_fires_only_with_latest_payload() {
    let registry = RoomRegistry::<Board>::new();
    let key = board_key("timer-replace");
    let handle = registry.resolve(&key).await.unwrap();

    let (d1, t1, mut r1) = client(&key, "c1");
    handle.join(d1, t1).await.unwrap();
    recv_frame(&mut r1).await;

    handle
        .message(ClientId("c1".into()), BoardMessage::Remind("old".into()))
        .await
        .unwrap();
    handle
        .message(ClientId("c1".into()), BoardMessage::Remind("new".into()))
        .await
        .unwrap();

    let frame = recv_frame(&mut r1).await;
    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(
        value["value"]["messages"],
        serde_json::json!(["reminder: new"])
    );
    assert!(
        tokio::time::timeout(Duration::from_millis(150), r1.recv())
            .await
            .is_err(),
        "replaced timer must fire exactly once"
    );
}

// ---------------------------------------------------------------------------
// Registry: single-flight creation and failure handling
// ---------------------------------------------------------------------------

static COUNTED_CREATIONS: AtomicU32 = AtomicU32::new(0);

#[derive(Debug, Default, Serialize)]
struct CountedState {
    n: u32,
}

#[derive(Debug)]
struct CountedPatch(u32);

impl RoomState for CountedState {
    type Patch = CountedPatch;
    fn apply(&mut self, patch: CountedPatch) {
        self.n = patch.0;
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "value")]
enum NoMessage {}

struct Counted;

impl RoomLogic for Counted {
    type State = CountedState;
    type Message = NoMessage;
    type TimerEvent = ();

    fn on_create(room: &mut RoomContext<'_, Self>) -> Result<(), HandlerError> {
        let n = COUNTED_CREATIONS.fetch_add(1, Ordering::SeqCst) + 1;
        room.set_state(CountedPatch(n));
        Ok(())
    }

    fn on_message(
        _room: &mut RoomContext<'_, Self>,
        _sender: &ClientData,
        msg: NoMessage,
    ) -> Result<(), HandlerError> {
        match msg {}
    }
}

#[tokio::test]
async fn test_concurrent_resolves_create_exactly_once() {
    let registry = std::sync::Arc::new(RoomRegistry::<Counted>::new());
    let key = RoomKey::new("counted", "race");

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let registry = registry.clone();
        let key = key.clone();
        tasks.push(tokio::spawn(async move { registry.resolve(&key).await }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(COUNTED_CREATIONS.load(Ordering::SeqCst), 1);
}

static FLAKY_ATTEMPTS: AtomicU32 = AtomicU32::new(0);

struct Flaky;

impl RoomLogic for Flaky {
    type State = CountedState;
    type Message = NoMessage;
    type TimerEvent = ();

    fn on_create(_room: &mut RoomContext<'_, Self>) -> Result<(), HandlerError> {
        if FLAKY_ATTEMPTS.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err("not today".into());
        }
        Ok(())
    }

    fn on_message(
        _room: &mut RoomContext<'_, Self>,
        _sender: &ClientData,
        msg: NoMessage,
    ) -> Result<(), HandlerError> {
        match msg {}
    }
}

#[tokio::test]
async fn test_failed_creation_leaves_no_residue_and_is_retried() {
    let registry = RoomRegistry::<Flaky>::new();
    let key = RoomKey::new("flaky", "room");

    let err = registry.resolve(&key).await.unwrap_err();
    assert!(matches!(
        err,
        roomcast_room::RoomError::CreationFailed(_, _)
    ));

    // the failed room was never registered; the next resolve re-creates
    registry.resolve(&key).await.unwrap();
    assert_eq!(FLAKY_ATTEMPTS.load(Ordering::SeqCst), 2);
}

static REJECTED_JOINS: AtomicU32 = AtomicU32::new(0);

struct Bouncer;

impl RoomLogic for Bouncer {
    type State = CountedState;
    type Message = NoMessage;
    type TimerEvent = ();

    fn on_create(_room: &mut RoomContext<'_, Self>) -> Result<(), HandlerError> {
        Ok(())
    }

    fn on_join(
        _room: &mut RoomContext<'_, Self>,
        client: &ClientData,
    ) -> Result<(), HandlerError> {
        if client.client_id.0 == "banned" {
            REJECTED_JOINS.fetch_add(1, Ordering::SeqCst);
            return Err("no entry".into());
        }
        Ok(())
    }

    fn on_message(
        _room: &mut RoomContext<'_, Self>,
        _sender: &ClientData,
        msg: NoMessage,
    ) -> Result<(), HandlerError> {
        match msg {}
    }
}

#[tokio::test]
async fn test_rejected_join_leaves_room_usable() {
    let registry = RoomRegistry::<Bouncer>::new();
    let key = RoomKey::new("bouncer", "door");
    let handle = registry.resolve(&key).await.unwrap();

    let (banned, tx, mut rx) = client(&key, "banned");
    let err = handle.join(banned, tx).await.unwrap_err();
    assert!(matches!(err, roomcast_room::RoomError::JoinRejected(_, _)));
    // the rejected client was never registered, so its channel is dead
    assert!(
        tokio::time::timeout(Duration::from_millis(50), rx.recv())
            .await
            .map(|f| f.is_none())
            .unwrap_or(true)
    );

    let (ok, tx2, mut rx2) = client(&key, "fine");
    handle.join(ok, tx2).await.unwrap();
    recv_frame(&mut rx2).await;
    assert_eq!(REJECTED_JOINS.load(Ordering::SeqCst), 1);
}
