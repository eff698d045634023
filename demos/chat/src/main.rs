//! A chat server with a single permitted room, `/chat/my-chat`.
//!
//! Every connection gets a random user id; joins, leaves, and user messages
//! all land in the shared message log, which every client receives in full
//! after each change.

use rand::Rng;
use roomcast::prelude::*;
use roomcast::{SessionError, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
struct ChatEntry {
    #[serde(rename = "type")]
    kind: EntryKind,
    message: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
enum EntryKind {
    Server,
    User,
}

#[derive(Debug, Default, Serialize)]
struct ChatState {
    messages: Vec<ChatEntry>,
}

#[derive(Debug, Default)]
struct ChatPatch {
    messages: Option<Vec<ChatEntry>>,
}

impl RoomState for ChatState {
    type Patch = ChatPatch;

    fn apply(&mut self, patch: ChatPatch) {
        if let Some(messages) = patch.messages {
            self.messages = messages;
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
enum ChatMessage {
    Message(String),
}

struct Chat;

impl Chat {
    fn announce(room: &mut RoomContext<'_, Self>, kind: EntryKind, message: String) {
        let mut messages = room.state().messages.clone();
        messages.push(ChatEntry { kind, message });
        room.set_state(ChatPatch {
            messages: Some(messages),
        });
    }

    fn display_name(client: &ClientData) -> String {
        match &client.user_id {
            Some(user_id) => user_id.to_string(),
            None => "anonymous".to_string(),
        }
    }
}

impl RoomLogic for Chat {
    type State = ChatState;
    type Message = ChatMessage;
    type TimerEvent = ();

    fn on_create(room: &mut RoomContext<'_, Self>) -> Result<(), HandlerError> {
        if room.room_id() != "my-chat" {
            return Err("Invalid Room ID!".into());
        }
        room.set_state(ChatPatch {
            messages: Some(Vec::new()),
        });
        Ok(())
    }

    fn on_join(room: &mut RoomContext<'_, Self>, client: &ClientData) -> Result<(), HandlerError> {
        Self::announce(
            room,
            EntryKind::Server,
            format!(
                "{} has joined the chat (id: {}).",
                Self::display_name(client),
                client.client_id
            ),
        );
        Ok(())
    }

    fn on_leave(room: &mut RoomContext<'_, Self>, client: &ClientData) -> Result<(), HandlerError> {
        Self::announce(
            room,
            EntryKind::Server,
            format!(
                "{} has left the chat (id: {}).",
                Self::display_name(client),
                client.client_id
            ),
        );
        Ok(())
    }

    fn on_message(
        room: &mut RoomContext<'_, Self>,
        sender: &ClientData,
        msg: ChatMessage,
    ) -> Result<(), HandlerError> {
        let ChatMessage::Message(text) = msg;
        Self::announce(
            room,
            EntryKind::User,
            format!(
                "{} (id: {}): {text}",
                Self::display_name(sender),
                sender.client_id
            ),
        );
        Ok(())
    }
}

/// Hands every connection a fresh random identity.
struct RandomIdentity;

impl Authenticator for RandomIdentity {
    async fn authenticate(
        &self,
        _request: &HandshakeRequest,
    ) -> Result<Option<UserId>, SessionError> {
        let mut rng = rand::rng();
        let bytes: [u8; 8] = rng.random();
        Ok(Some(UserId(
            bytes.iter().map(|b| format!("{b:02x}")).collect(),
        )))
    }
}

#[tokio::main]
async fn main() -> Result<(), RoomcastError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let server = ServerBuilder::new()
        .bind("127.0.0.1:1333")
        .authenticator(RandomIdentity)
        .room_type::<Chat>("chat")
        .build()
        .await?;

    tracing::info!("chat demo listening on ws://127.0.0.1:1333/chat/my-chat");
    server.run().await
}
