//! JSON frames exchanged between server and client.
//!
//! Two shapes exist on the wire:
//!
//! - Server → client: `{"type": "state", "value": <full room state>}`,
//!   sent on every state change and once directly after a join.
//! - Client → server: `{"type": <message kind>, "value": <payload>}`,
//!   decoded against the room type's message enum.
//!
//! The server-side encoder serializes a state exactly once per broadcast,
//! so every recipient of a given `set_state` call receives a byte-identical
//! frame.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A frame sent from the server to clients.
///
/// `#[serde(tag = "type", content = "value")]` produces adjacently tagged
/// JSON — `ServerFrame::State(s)` becomes `{"type":"state","value":...}`.
/// The client library decodes incoming text against this enum; an unknown
/// `type` tag fails decoding and surfaces as a protocol error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ServerFrame<S> {
    /// The full current room state.
    State(S),
}

/// Borrowed twin of [`ServerFrame`] so the room layer can encode a state
/// snapshot without cloning it.
#[derive(Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
enum ServerFrameRef<'a, S> {
    State(&'a S),
}

/// Serializes a full state snapshot into a state frame.
///
/// # Errors
/// Returns [`ProtocolError::Encode`] if the state cannot be represented as
/// JSON (e.g., a map with non-string keys).
pub fn encode_state<S: Serialize>(state: &S) -> Result<String, ProtocolError> {
    serde_json::to_string(&ServerFrameRef::State(state)).map_err(ProtocolError::Encode)
}

/// Decodes an inbound client frame into a room type's message enum.
///
/// The message enum is expected to carry serde's
/// `#[serde(tag = "type", content = "value")]` attributes so the wire shape
/// `{"type": <kind>, "value": <payload>}` maps onto its variants. A frame
/// whose kind has no variant fails here, which is how unknown message kinds
/// get discarded.
///
/// # Errors
/// Returns [`ProtocolError::Decode`] for malformed JSON or unknown kinds.
pub fn decode_message<M: DeserializeOwned>(raw: &str) -> Result<M, ProtocolError> {
    serde_json::from_str(raw).map_err(ProtocolError::Decode)
}

#[cfg(test)]
mod tests {
    //! The wire format is fixed by the client contract, so these tests
    //! assert exact JSON shapes, not just round-trips.

    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestState {
        messages: Vec<String>,
        topic: String,
    }

    #[derive(Debug, PartialEq, Deserialize)]
    #[serde(tag = "type", content = "value", rename_all = "snake_case")]
    enum TestMessage {
        Message(String),
        SetTopic(String),
    }

    #[test]
    fn test_encode_state_exact_shape() {
        let state = TestState {
            messages: vec!["hi".into()],
            topic: "general".into(),
        };
        let frame = encode_state(&state).unwrap();
        assert_eq!(
            frame,
            r#"{"type":"state","value":{"messages":["hi"],"topic":"general"}}"#
        );
    }

    #[test]
    fn test_encode_state_is_deterministic() {
        // Broadcast relies on one encode per call; two encodes of the same
        // state must still agree byte-for-byte.
        let state = TestState {
            messages: vec!["a".into(), "b".into()],
            topic: "t".into(),
        };
        assert_eq!(encode_state(&state).unwrap(), encode_state(&state).unwrap());
    }

    #[test]
    fn test_server_frame_decodes_state() {
        let raw = r#"{"type":"state","value":{"messages":[],"topic":"x"}}"#;
        let frame: ServerFrame<TestState> = serde_json::from_str(raw).unwrap();
        assert_eq!(
            frame,
            ServerFrame::State(TestState {
                messages: vec![],
                topic: "x".into(),
            })
        );
    }

    #[test]
    fn test_server_frame_rejects_unknown_type_tag() {
        let raw = r#"{"type":"diff","value":{}}"#;
        let result: Result<ServerFrame<TestState>, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_message_by_kind() {
        let msg: TestMessage = decode_message(r#"{"type":"message","value":"hi"}"#).unwrap();
        assert_eq!(msg, TestMessage::Message("hi".into()));

        let msg: TestMessage = decode_message(r#"{"type":"set_topic","value":"rust"}"#).unwrap();
        assert_eq!(msg, TestMessage::SetTopic("rust".into()));
    }

    #[test]
    fn test_decode_message_unknown_kind_is_error() {
        let result: Result<TestMessage, _> = decode_message(r#"{"type":"dance","value":1}"#);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_message_garbage_is_error() {
        let result: Result<TestMessage, _> = decode_message("not json at all");
        assert!(result.is_err());
    }
}
