//! Shared vocabulary for Gameroom.
//!
//! Every other crate in the workspace talks in terms of the types defined
//! here:
//!
//! - **Keys** ([`IdentityKey`], [`RoomKey`], [`ConnectionId`]) — who and
//!   where. Identities and rooms are addressed by key, never by reference.
//! - **Payloads** ([`Payload`]) — what gets delivered to an identity.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while building keys.
//!
//! # Architecture
//!
//! ```text
//! Room (events) → Game (roster) → Session (identities) → Protocol (keys)
//! ```

mod error;
mod types;

pub use error::ProtocolError;
pub use types::{ConnectionId, IdentityKey, Payload, RoomKey};
