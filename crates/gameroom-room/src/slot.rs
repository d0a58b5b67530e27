//! The room side of the game/room boundary.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use gameroom_game::RoomLink;
use gameroom_protocol::{IdentityKey, RoomKey};
use serde::Serialize;

/// A role marker in the room's role table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    /// Seated in the room's game.
    Player,
}

impl Role {
    /// The symbol shown next to the user's name.
    pub fn symbol(self) -> char {
        match self {
            Self::Player => '\u{2606}',
        }
    }
}

/// Shared between a room actor and the game it hosts.
///
/// The game gets this as an `Arc<dyn RoomLink>` and can only grant player
/// roles and clear the slot. The room reads both.
#[derive(Debug)]
pub struct RoomSlot {
    room: RoomKey,
    inner: Mutex<SlotInner>,
}

#[derive(Debug, Default)]
struct SlotInner {
    roles: HashMap<IdentityKey, Role>,
    attached: bool,
}

impl RoomSlot {
    pub fn new(room: RoomKey) -> Self {
        Self {
            room,
            inner: Mutex::new(SlotInner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn room(&self) -> &RoomKey {
        &self.room
    }

    /// Returns `true` while a game occupies the slot.
    pub fn has_game(&self) -> bool {
        self.lock().attached
    }

    pub fn role_of(&self, identity: &IdentityKey) -> Option<Role> {
        self.lock().roles.get(identity).copied()
    }

    pub(crate) fn mark_attached(&self) {
        self.lock().attached = true;
    }

    /// Moves a role marker along with a rename.
    pub(crate) fn rekey_role(&self, old: &IdentityKey, new: &IdentityKey) {
        let mut inner = self.lock();
        if let Some(role) = inner.roles.remove(old) {
            inner.roles.insert(new.clone(), role);
        }
    }

    pub(crate) fn revoke(&self, identity: &IdentityKey) {
        self.lock().roles.remove(identity);
    }
}

impl RoomLink for RoomSlot {
    fn grant_player_role(&self, room: &RoomKey, identity: &IdentityKey) {
        if room != &self.room {
            tracing::warn!(slot = %self.room, %room, "role grant for another room ignored");
            return;
        }
        self.lock().roles.insert(identity.clone(), Role::Player);
    }

    fn detach_game(&self, room: &RoomKey) {
        if room != &self.room {
            tracing::warn!(slot = %self.room, %room, "detach for another room ignored");
            return;
        }
        let mut inner = self.lock();
        inner.attached = false;
        inner.roles.retain(|_, role| *role != Role::Player);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> IdentityKey {
        IdentityKey::new(s)
    }

    #[test]
    fn test_grant_and_rekey_role() {
        let slot = RoomSlot::new(RoomKey::new("r"));
        slot.grant_player_role(&RoomKey::new("r"), &key("bob"));

        slot.rekey_role(&key("bob"), &key("rob"));

        assert_eq!(slot.role_of(&key("bob")), None);
        assert_eq!(slot.role_of(&key("rob")), Some(Role::Player));
    }

    #[test]
    fn test_grant_for_other_room_ignored() {
        let slot = RoomSlot::new(RoomKey::new("r"));

        slot.grant_player_role(&RoomKey::new("elsewhere"), &key("bob"));

        assert_eq!(slot.role_of(&key("bob")), None);
    }

    #[test]
    fn test_detach_clears_slot_and_player_roles() {
        let slot = RoomSlot::new(RoomKey::new("r"));
        slot.mark_attached();
        slot.grant_player_role(&RoomKey::new("r"), &key("bob"));

        slot.detach_game(&RoomKey::new("r"));

        assert!(!slot.has_game());
        assert_eq!(slot.role_of(&key("bob")), None);
    }

    #[test]
    fn test_player_symbol() {
        assert_eq!(Role::Player.symbol(), '☆');
    }
}
