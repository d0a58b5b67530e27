//! Identity types: the records the directory hands out.

use std::collections::BTreeSet;

use gameroom_protocol::{ConnectionId, IdentityKey, Payload, RoomKey};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DirectoryConfig
// ---------------------------------------------------------------------------

/// Configuration for an [`IdentityDirectory`](crate::IdentityDirectory).
///
/// Missing fields fall back to their defaults when deserialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Prefix for generated guest names. A guest is shown as
    /// `"<prefix> <digits>"` and keyed by the normalized form.
    ///
    /// Default: `"Guest"`.
    pub guest_prefix: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            guest_prefix: "Guest".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A snapshot of a live user identity.
///
/// This is a *copy*, taken at resolution time. Don't hold on to it across
/// events: the identity may rename, merge, or disconnect in between.
/// Keep the [`key`](Self::key) instead and resolve it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Unique key, derived from the display name.
    pub key: IdentityKey,

    /// The name as the user typed it.
    pub display_name: String,

    /// Rooms whose games this identity is currently playing in.
    pub active_game_keys: BTreeSet<RoomKey>,

    /// `false` for auto-generated guests, `true` once the user picked a name.
    pub is_named: bool,
}

impl Identity {
    /// Returns `true` if the identity is playing in the given room's game.
    pub fn is_playing_in(&self, room: &RoomKey) -> bool {
        self.active_game_keys.contains(room)
    }
}

// ---------------------------------------------------------------------------
// Outcome records
// ---------------------------------------------------------------------------

/// What happened during a rename.
///
/// The room layer needs `old_key` to re-key its tables and to tell the game
/// which roster entry the identity used to own.
#[derive(Debug, Clone)]
pub struct Rename {
    /// The identity after the rename.
    pub identity: Identity,

    /// The key the connection (or identity) had before.
    pub old_key: IdentityKey,

    /// `true` if the connection moved into an identity that already existed,
    /// rather than the identity being re-keyed in place.
    pub merged: bool,
}

/// What happened when a connection closed.
#[derive(Debug, Clone)]
pub struct Departure {
    /// The identity the connection belonged to (as it was at that moment).
    pub identity: Identity,

    /// `true` if that was the identity's last connection. The identity is
    /// no longer resolvable afterwards.
    pub was_last: bool,
}

/// A payload the directory accepted for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub to: IdentityKey,
    /// `Some` when the payload was sent in the context of a room.
    pub room: Option<RoomKey>,
    pub payload: Payload,
}

/// A connection's record inside the directory. Not exported.
#[derive(Debug)]
pub(crate) struct Entry {
    pub(crate) identity: Identity,
    pub(crate) connections: Vec<ConnectionId>,
}
