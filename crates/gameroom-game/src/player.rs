//! Roster slots.
//!
//! A [`Player`] is a seat in a game. It may be bound to a live identity or
//! sit empty, and it outlives any particular binding: when the identity
//! leaves, the seat keeps its number and the last name it was shown under.

use std::sync::Arc;

use gameroom_protocol::{IdentityKey, Payload, RoomKey};
use gameroom_session::{Identity, IdentityRegistry};

/// What a new seat is created from.
#[derive(Debug, Clone)]
pub enum PlayerSeed<'a> {
    /// Bind the seat to a live identity.
    Identity(&'a Identity),

    /// An unbound seat shown under the given name.
    Name(String),

    /// An unbound seat shown as `Player <n>`.
    Anonymous,
}

impl PlayerSeed<'_> {
    /// The identity this seed binds to, if any.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Identity(identity) => Some(identity),
            Self::Name(_) | Self::Anonymous => None,
        }
    }
}

/// One seat in a game's roster.
///
/// `S` is the per-player state a concrete game attaches through
/// [`GameRules::make_player`](crate::GameRules::make_player): a hand of
/// cards, a score, a side. Games that need nothing use `()`.
///
/// The player never stores the identity object itself, only keys. The
/// seat is keyed by the identity it was bound to; after a rename in a
/// game that doesn't allow renaming, that key stays while the identity
/// itself goes by a new one. Sends and unbinding use the identity's
/// current key, resolved at call time, so a player whose identity has
/// disconnected simply receives nothing.
pub struct Player<S = ()> {
    number: u32,
    name: String,
    identity: Option<IdentityKey>,
    /// The bound identity's current key. Set exactly when `identity` is.
    live: Option<IdentityKey>,
    /// Key of the owning game's room. A back-reference, not ownership.
    room: RoomKey,
    registry: Arc<dyn IdentityRegistry>,
    state: S,
}

impl<S> Player<S> {
    /// Creates a seat.
    ///
    /// Binding to an identity registers this game in the identity's
    /// active-game set and refreshes its search index.
    pub fn new(
        seed: PlayerSeed<'_>,
        room: RoomKey,
        number: u32,
        registry: Arc<dyn IdentityRegistry>,
        state: S,
    ) -> Self {
        let (name, identity) = match seed {
            PlayerSeed::Identity(identity) => {
                registry.register_game(&identity.key, &room);
                registry.refresh_search_index(&identity.key);
                (identity.display_name.clone(), Some(identity.key.clone()))
            }
            PlayerSeed::Name(name) => (name, None),
            PlayerSeed::Anonymous => (format!("Player {number}"), None),
        };

        Self {
            number,
            name,
            live: identity.clone(),
            identity,
            room,
            registry,
            state,
        }
    }

    /// The seat number. Stable for the player's lifetime.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// The name the seat is shown under. Survives unbinding.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bound identity's key, or `None` for an empty seat.
    pub fn identity_key(&self) -> Option<&IdentityKey> {
        self.identity.as_ref()
    }

    /// The key the bound identity goes by now. Equal to
    /// [`identity_key`](Self::identity_key) unless the identity renamed
    /// while the seat kept its original key.
    pub fn live_key(&self) -> Option<&IdentityKey> {
        self.live.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.identity.is_some()
    }

    /// Key of the room whose game owns this seat.
    pub fn room(&self) -> &RoomKey {
        &self.room
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Detaches the seat from its identity. Idempotent.
    ///
    /// The display name is kept: an empty seat is still shown as whoever
    /// last sat in it. Outside this crate, go through
    /// [`Game::unbind_player`](crate::Game::unbind_player) so the roster
    /// index stays in step.
    pub(crate) fn unbind(&mut self) {
        self.identity = None;
        let Some(key) = self.live.take() else {
            return;
        };
        self.registry.deregister_game(&key, &self.room);
        self.registry.refresh_search_index(&key);
        tracing::debug!(room = %self.room, player = self.number, identity = %key, "player unbound");
    }

    /// Tears the seat down. Any live binding is released first.
    pub fn destroy(mut self) {
        self.unbind();
    }

    /// Sends a private payload to the bound identity.
    ///
    /// Returns `false` if the seat is empty or the identity is offline.
    pub fn send(&self, payload: Payload) -> bool {
        match &self.live {
            Some(key) => self.registry.send_direct(key, payload),
            None => false,
        }
    }

    /// Sends a payload to the bound identity in the context of the room.
    ///
    /// Same miss semantics as [`send`](Self::send).
    pub fn send_room(&self, payload: Payload) -> bool {
        match &self.live {
            Some(key) => self.registry.send_to_room(key, &self.room, payload),
            None => false,
        }
    }

    /// Binds an empty seat to `identity`, registering the game with it.
    pub(crate) fn bind(&mut self, identity: &Identity) {
        self.registry.register_game(&identity.key, &self.room);
        self.registry.refresh_search_index(&identity.key);
        self.identity = Some(identity.key.clone());
        self.live = Some(identity.key.clone());
        self.name = identity.display_name.clone();
    }

    /// Follows a rename: the seat takes the identity's new key and name.
    pub(crate) fn rekey(&mut self, identity: &Identity) {
        self.identity = Some(identity.key.clone());
        self.follow(identity);
    }

    /// Follows a rename but stays keyed by the original identity.
    pub(crate) fn follow(&mut self, identity: &Identity) {
        self.live = Some(identity.key.clone());
        self.name = identity.display_name.clone();
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for Player<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("number", &self.number)
            .field("name", &self.name)
            .field("identity", &self.identity)
            .field("live", &self.live)
            .field("room", &self.room)
            .field("state", &self.state)
            .finish()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use gameroom_session::IdentityDirectory;

    use super::*;

    fn setup() -> (Arc<IdentityDirectory>, Identity) {
        let dir = Arc::new(IdentityDirectory::default());
        let (_, identity) = dir.connect_named("Alice").unwrap();
        (dir, identity)
    }

    fn room() -> RoomKey {
        RoomKey::new("lobby")
    }

    #[test]
    fn test_new_with_identity_binds_and_registers_game() {
        let (dir, alice) = setup();

        let player = Player::new(PlayerSeed::Identity(&alice), room(), 1, dir.clone(), ());

        assert_eq!(player.name(), "Alice");
        assert_eq!(player.identity_key(), Some(&alice.key));
        assert!(dir.resolve(&alice.key).unwrap().is_playing_in(&room()));
        assert_eq!(dir.search_index_refreshes(&alice.key), 1);
    }

    #[test]
    fn test_new_with_name_is_unbound() {
        let (dir, _) = setup();

        let player = Player::new(PlayerSeed::Name("Robot".into()), room(), 4, dir, ());

        assert_eq!(player.name(), "Robot");
        assert!(!player.is_bound());
    }

    #[test]
    fn test_new_anonymous_uses_numbered_name() {
        let (dir, _) = setup();

        let player = Player::new(PlayerSeed::Anonymous, room(), 3, dir, ());

        assert_eq!(player.name(), "Player 3");
    }

    #[test]
    fn test_unbind_keeps_name_and_deregisters() {
        let (dir, alice) = setup();
        let mut player = Player::new(PlayerSeed::Identity(&alice), room(), 1, dir.clone(), ());

        player.unbind();

        assert!(!player.is_bound());
        assert_eq!(player.name(), "Alice");
        assert!(!dir.resolve(&alice.key).unwrap().is_playing_in(&room()));
        assert_eq!(dir.search_index_refreshes(&alice.key), 2);
    }

    #[test]
    fn test_unbind_twice_is_noop() {
        let (dir, alice) = setup();
        let mut player = Player::new(PlayerSeed::Identity(&alice), room(), 1, dir.clone(), ());

        player.unbind();
        player.unbind();

        assert_eq!(dir.search_index_refreshes(&alice.key), 2);
    }

    #[test]
    fn test_destroy_releases_binding() {
        let (dir, alice) = setup();
        let player = Player::new(PlayerSeed::Identity(&alice), room(), 1, dir.clone(), ());

        player.destroy();

        assert!(dir.resolve(&alice.key).unwrap().active_game_keys.is_empty());
    }

    #[test]
    fn test_send_resolves_identity_at_call_time() {
        let dir = Arc::new(IdentityDirectory::default());
        let (conn, alice) = dir.connect_named("Alice").unwrap();
        let player = Player::new(PlayerSeed::Identity(&alice), room(), 1, dir.clone(), ());

        assert!(player.send(Payload::text("your move")));
        dir.disconnect(conn).unwrap();
        assert!(!player.send(Payload::text("still there?")));

        // Same key comes back online: delivery works again.
        dir.connect_named("Alice").unwrap();
        assert!(player.send_room(Payload::text("welcome back")));

        let deliveries = dir.take_deliveries();
        assert_eq!(deliveries.len(), 2);
        assert_eq!(deliveries[1].room, Some(room()));
    }

    #[test]
    fn test_follow_sends_and_unbinds_under_new_key() {
        let dir = Arc::new(IdentityDirectory::default());
        let (conn, bob) = dir.connect_named("Bob").unwrap();
        let mut player = Player::new(PlayerSeed::Identity(&bob), room(), 1, dir.clone(), ());

        let rename = dir.rename(conn, "Rob").unwrap();
        player.follow(&rename.identity);

        assert_eq!(player.identity_key(), Some(&bob.key));
        assert_eq!(player.live_key(), Some(&rename.identity.key));
        assert!(player.send(Payload::text("still yours")));

        player.unbind();
        assert!(player.live_key().is_none());
        assert!(dir.resolve(&rename.identity.key).unwrap().active_game_keys.is_empty());
    }

    #[test]
    fn test_send_from_unbound_seat_is_noop() {
        let (dir, _) = setup();
        let player = Player::new(PlayerSeed::Anonymous, room(), 1, dir.clone(), ());

        assert!(!player.send(Payload::text("hello?")));
        assert!(dir.take_deliveries().is_empty());
    }
}
