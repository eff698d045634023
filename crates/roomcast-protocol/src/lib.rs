//! Wire protocol for Roomcast.
//!
//! This crate defines the "language" that clients and servers speak:
//!
//! - **Types** ([`ClientId`], [`UserId`], [`RoomKey`]) — the identifiers
//!   that name connections and room instances.
//! - **Frames** ([`ServerFrame`], [`encode_state`], [`decode_message`]) —
//!   the JSON shapes that travel on the wire.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw frames) and session
//! (connection identity). It doesn't know about connections or rooms —
//! it only knows how messages are shaped and serialized.
//!
//! ```text
//! Transport (text frames) → Protocol (typed frames) → Session (identity)
//! ```

mod error;
mod frame;
mod types;

pub use error::ProtocolError;
pub use frame::{ServerFrame, decode_message, encode_state};
pub use types::{ClientId, RoomKey, UserId};
