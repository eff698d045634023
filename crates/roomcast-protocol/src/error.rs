/// Errors from encoding or decoding wire frames.
///
/// Serialization problems stay in this crate's vocabulary so callers above
/// the protocol layer never handle `serde_json::Error` directly.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A state snapshot could not be serialized to JSON. With `derive`d
    /// state types this is nearly unreachable; non-string map keys are the
    /// usual culprit when it does happen.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// An inbound frame did not decode into the expected message type:
    /// malformed JSON, a missing field, a wrong payload shape, or a message
    /// kind with no matching variant.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
