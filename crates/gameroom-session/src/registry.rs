//! The resolver capability the game layer is handed.
//!
//! Players never store an identity object. They store its key, and every
//! time they need the live identity they go through this trait. A
//! disconnected identity simply doesn't resolve, and callers treat that as
//! "nobody to talk to", not as a failure.

use std::sync::Arc;

use gameroom_protocol::{IdentityKey, Payload, RoomKey};

use crate::Identity;

/// Looks identities up by key and applies the small set of mutations the
/// game layer is allowed to make.
///
/// Every method takes `&self`: implementations use interior mutability so
/// a single registry can be shared (via `Arc`) by every game on the server.
/// Mutations are expected to come from inside one event turn at a time.
pub trait IdentityRegistry: Send + Sync + 'static {
    /// Returns a snapshot of the live identity, or `None` if nobody with
    /// that key is connected.
    fn resolve(&self, key: &IdentityKey) -> Option<Identity>;

    /// Adds `room` to the identity's active-game set.
    /// Returns `false` if the identity didn't resolve.
    fn register_game(&self, key: &IdentityKey, room: &RoomKey) -> bool;

    /// Removes `room` from the identity's active-game set.
    /// Returns `false` if the identity didn't resolve.
    fn deregister_game(&self, key: &IdentityKey, room: &RoomKey) -> bool;

    /// Rebuilds whatever search index the host keeps for user lookups
    /// ("which games is this user in?"). No-op for unknown keys.
    fn refresh_search_index(&self, key: &IdentityKey);

    /// Delivers a payload privately. Returns `false` if the identity
    /// didn't resolve; the payload is dropped in that case.
    fn send_direct(&self, key: &IdentityKey, payload: Payload) -> bool;

    /// Delivers a payload in the context of a room. Same miss semantics
    /// as [`send_direct`](Self::send_direct).
    fn send_to_room(
        &self,
        key: &IdentityKey,
        room: &RoomKey,
        payload: Payload,
    ) -> bool;
}

impl<T: IdentityRegistry + ?Sized> IdentityRegistry for Arc<T> {
    fn resolve(&self, key: &IdentityKey) -> Option<Identity> {
        (**self).resolve(key)
    }

    fn register_game(&self, key: &IdentityKey, room: &RoomKey) -> bool {
        (**self).register_game(key, room)
    }

    fn deregister_game(&self, key: &IdentityKey, room: &RoomKey) -> bool {
        (**self).deregister_game(key, room)
    }

    fn refresh_search_index(&self, key: &IdentityKey) {
        (**self).refresh_search_index(key)
    }

    fn send_direct(&self, key: &IdentityKey, payload: Payload) -> bool {
        (**self).send_direct(key, payload)
    }

    fn send_to_room(
        &self,
        key: &IdentityKey,
        room: &RoomKey,
        payload: Payload,
    ) -> bool {
        (**self).send_to_room(key, room, payload)
    }
}
