//! Keys and payloads.
//!
//! An identity can disconnect, reconnect, rename itself, or merge several
//! connections into one account. Anything that outlives a single event
//! therefore holds a *key* and resolves it again when it needs the live
//! object. These newtypes make that policy visible in signatures.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// IdentityKey
// ---------------------------------------------------------------------------

/// The unique key of a user identity.
///
/// Keys are derived from display names: `"Bob Smith"` and `"bob-smith"`
/// both normalize to `bobsmith`, so two names that differ only in case or
/// punctuation refer to the same identity.
///
/// `#[serde(transparent)]` serializes this as the bare string.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Wraps an already-normalized key verbatim.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Normalizes a display name into a key: ASCII letters are lowercased,
    /// digits kept, everything else dropped.
    ///
    /// # Errors
    /// [`ProtocolError::EmptyKey`] if nothing is left after normalization.
    pub fn from_name(name: &str) -> Result<Self, ProtocolError> {
        let key: String = name
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if key.is_empty() {
            return Err(ProtocolError::EmptyKey(name.to_owned()));
        }
        Ok(Self(key))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// RoomKey
// ---------------------------------------------------------------------------

/// Identifies a room.
///
/// A room hosts at most one game, so the game is addressed by its room's
/// key as well. This is the value stored in an identity's active-game set.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomKey(String);

impl RoomKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// ConnectionId
// ---------------------------------------------------------------------------

/// One live transport session. An identity may own several at once.
///
/// Opaque to the game layer: it is passed through to event hooks and never
/// inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Something delivered to an identity, either privately or in the context
/// of a room.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
/// `{ "type": "Text", "text": "your turn" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Payload {
    /// Human-readable text.
    Text { text: String },

    /// Structured data for a client-side renderer.
    Data { data: serde_json::Value },
}

impl Payload {
    /// Shorthand for [`Payload::Text`].
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_key_from_name_normalizes() {
        let key = IdentityKey::from_name("Bob Smith!").unwrap();
        assert_eq!(key.as_str(), "bobsmith");
    }

    #[test]
    fn test_identity_key_from_name_keeps_digits() {
        let key = IdentityKey::from_name("Player_42").unwrap();
        assert_eq!(key.as_str(), "player42");
    }

    #[test]
    fn test_identity_key_from_name_rejects_empty_result() {
        let result = IdentityKey::from_name("?? --");
        assert!(matches!(result, Err(ProtocolError::EmptyKey(name)) if name == "?? --"));
    }

    #[test]
    fn test_same_key_for_case_and_punctuation_variants() {
        assert_eq!(
            IdentityKey::from_name("Rob").unwrap(),
            IdentityKey::from_name("r.o.b").unwrap()
        );
    }

    #[test]
    fn test_identity_key_serializes_as_plain_string() {
        let json = serde_json::to_string(&IdentityKey::new("alice")).unwrap();
        assert_eq!(json, r#""alice""#);
    }

    #[test]
    fn test_room_key_display() {
        assert_eq!(RoomKey::new("lobby").to_string(), "lobby");
    }

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId(7).to_string(), "C-7");
    }

    #[test]
    fn test_payload_text_json_format() {
        let json = serde_json::to_value(Payload::text("hi")).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "Text", "text": "hi" }));
    }

    #[test]
    fn test_payload_data_deserializes() {
        let payload: Payload = serde_json::from_str(
            r#"{ "type": "Data", "data": { "turn": 3 } }"#,
        )
        .unwrap();
        assert_eq!(
            payload,
            Payload::Data {
                data: serde_json::json!({ "turn": 3 })
            }
        );
    }
}
