//! The game: a room's single activity and its player roster.
//!
//! Three things change independently underneath a game: who is in the
//! room, who holds a seat, and which identity a connection belongs to.
//! `Game` keeps the roster consistent while all three move:
//!
//! - `players` is every seat ever created and not removed, in creation
//!   order, bound or not.
//! - `by_identity` maps a live binding to its seat number. Empty seats are
//!   never in it, and every entry points at a seat whose identity key is
//!   that entry's key.
//! - `by_live` maps the same seats by the key their identity goes by now.
//!   The two only differ after a rename in a game that doesn't allow
//!   renaming. A key found in either map is seated.
//! - The bound-player count is `by_identity.len()`, so it can't drift.
//! - Seat numbers come from a high-water mark, never from the count, so a
//!   removed seat's number is never handed out again.

use std::collections::HashMap;
use std::sync::Arc;

use gameroom_protocol::{IdentityKey, RoomKey};
use gameroom_session::{Identity, IdentityRegistry};

use crate::{GameConfig, GameError, GameRules, GameState, Player, PlayerSeed, RoomLink};

/// Which seat to remove.
///
/// Callers either hold a seat number, or only know the identity and
/// expect it to be seated.
#[derive(Debug, Clone, Copy)]
pub enum PlayerRef<'a> {
    Number(u32),
    Identity(&'a IdentityKey),
}

/// A room's active game.
///
/// `R` supplies per-seat state and the event hooks; see [`GameRules`].
pub struct Game<R: GameRules> {
    room: RoomKey,
    config: GameConfig,
    state: GameState,
    players: Vec<Player<R::PlayerState>>,
    by_identity: HashMap<IdentityKey, u32>,
    by_live: HashMap<IdentityKey, u32>,
    /// Highest seat number issued so far.
    last_number: u32,
    rules: R,
    registry: Arc<dyn IdentityRegistry>,
    link: Arc<dyn RoomLink>,
}

impl<R: GameRules> Game<R> {
    /// Creates a game for `room`. The room key never changes afterwards.
    pub fn new(
        room: RoomKey,
        config: GameConfig,
        rules: R,
        registry: Arc<dyn IdentityRegistry>,
        link: Arc<dyn RoomLink>,
    ) -> Self {
        tracing::info!(%room, kind = %config.kind, "game created");
        Self {
            room,
            config,
            state: GameState::Active,
            players: Vec::new(),
            by_identity: HashMap::new(),
            by_live: HashMap::new(),
            last_number: 0,
            rules,
            registry,
            link,
        }
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn room(&self) -> &RoomKey {
        &self.room
    }

    pub fn kind(&self) -> &str {
        &self.config.kind
    }

    pub fn title(&self) -> &str {
        &self.config.title
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn allows_renaming(&self) -> bool {
        self.config.allows_renaming
    }

    pub fn player_capacity(&self) -> usize {
        self.config.player_capacity
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_ended(&self) -> bool {
        self.state.is_ended()
    }

    /// Marks the game as over. One-way; ending twice is harmless.
    pub fn end(&mut self) {
        if !self.state.is_ended() {
            self.state = GameState::Ended;
            tracing::info!(room = %self.room, "game ended");
        }
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut R {
        &mut self.rules
    }

    /// The resolver this game was built with. Hooks use it to look up
    /// identities by key.
    pub fn registry(&self) -> &Arc<dyn IdentityRegistry> {
        &self.registry
    }

    /// Every seat, in creation order, including empty ones.
    pub fn players(&self) -> &[Player<R::PlayerState>] {
        &self.players
    }

    /// Number of seats currently bound to an identity.
    pub fn bound_player_count(&self) -> usize {
        self.by_identity.len()
    }

    pub fn player(&self, number: u32) -> Option<&Player<R::PlayerState>> {
        self.players.iter().find(|p| p.number() == number)
    }

    pub fn player_mut(
        &mut self,
        number: u32,
    ) -> Option<&mut Player<R::PlayerState>> {
        self.players.iter_mut().find(|p| p.number() == number)
    }

    /// The seat bound to `key`, if any. Matches both the seat's original
    /// key and the key its identity goes by now.
    pub fn player_by_identity(
        &self,
        key: &IdentityKey,
    ) -> Option<&Player<R::PlayerState>> {
        let number = self.seat_of(key)?;
        self.player(number)
    }

    pub fn player_by_identity_mut(
        &mut self,
        key: &IdentityKey,
    ) -> Option<&mut Player<R::PlayerState>> {
        let number = self.seat_of(key)?;
        self.player_mut(number)
    }

    /// Returns `true` if `key` is bound to a seat.
    pub fn is_player(&self, key: &IdentityKey) -> bool {
        self.seat_of(key).is_some()
    }

    fn seat_of(&self, key: &IdentityKey) -> Option<u32> {
        self.by_identity
            .get(key)
            .or_else(|| self.by_live.get(key))
            .copied()
    }

    /// Drops both index entries of a seat that is about to lose its binding.
    fn forget(&mut self, index: usize) {
        let player = &self.players[index];
        if let Some(key) = player.identity_key() {
            self.by_identity.remove(key);
        }
        if let Some(key) = player.live_key() {
            self.by_live.remove(key);
        }
    }

    fn index(&mut self, key: &IdentityKey, number: u32) {
        self.by_identity.insert(key.clone(), number);
        self.by_live.insert(key.clone(), number);
    }

    fn position(&self, number: u32) -> Option<usize> {
        self.players.iter().position(|p| p.number() == number)
    }

    // -----------------------------------------------------------------
    // Roster operations
    // -----------------------------------------------------------------

    /// Adds a seat.
    ///
    /// Returns `None` if the identity already holds a seat, or if the game
    /// has a capacity and that many seats are already bound.
    ///
    /// The new seat's number is one past the highest number issued, so
    /// numbers keep climbing even after removals.
    pub fn add_player(
        &mut self,
        seed: PlayerSeed<'_>,
        args: R::JoinArgs,
    ) -> Option<&mut Player<R::PlayerState>> {
        if let Some(identity) = seed.identity() {
            if self.is_player(&identity.key) {
                tracing::warn!(
                    room = %self.room,
                    identity = %identity.key,
                    "already a player"
                );
                return None;
            }
        }
        let capacity = self.config.player_capacity;
        if capacity > 0 && self.bound_player_count() >= capacity {
            tracing::warn!(room = %self.room, capacity, "game is full");
            return None;
        }

        let number = self.last_number + 1;
        let state = self.rules.make_player(number, &seed, args);
        let player = Player::new(
            seed,
            self.room.clone(),
            number,
            Arc::clone(&self.registry),
            state,
        );

        if let Some(key) = player.identity_key() {
            self.index(key, number);
        }
        self.last_number = number;
        tracing::debug!(
            room = %self.room,
            player = number,
            name = player.name(),
            bound = self.by_identity.len(),
            "player added"
        );
        self.players.push(player);
        self.players.last_mut()
    }

    /// Re-seats `number` with a different identity, or empties it.
    ///
    /// Only games that allow renaming can do this. The previous binding is
    /// released; a new binding is registered with the identity and the
    /// identity gets the room's player role.
    ///
    /// Returns `false` if the game forbids it, the seat doesn't exist, or
    /// the new identity already holds another seat.
    pub fn update_player(
        &mut self,
        number: u32,
        identity: Option<&Identity>,
    ) -> bool {
        if !self.config.allows_renaming {
            return false;
        }
        if let Some(identity) = identity {
            if self.seat_of(&identity.key).is_some_and(|seat| seat != number) {
                return false;
            }
        }
        let Some(index) = self.position(number) else {
            return false;
        };

        self.forget(index);
        self.players[index].unbind();

        match identity {
            Some(identity) => {
                self.players[index].bind(identity);
                self.index(&identity.key, number);
                self.link.grant_player_role(&self.room, &identity.key);
                tracing::debug!(
                    room = %self.room,
                    player = number,
                    identity = %identity.key,
                    "player rebound"
                );
            }
            None => {
                tracing::debug!(room = %self.room, player = number, "player seat emptied");
            }
        }
        true
    }

    /// Releases a seat's identity but keeps the seat, its number and its
    /// name. Allowed on fixed rosters too.
    ///
    /// Returns `false` if the seat doesn't exist or is already empty.
    pub fn unbind_player(&mut self, number: u32) -> bool {
        let Some(index) = self.position(number) else {
            return false;
        };
        if !self.players[index].is_bound() {
            return false;
        }
        self.forget(index);
        self.players[index].unbind();
        true
    }

    /// Removes a seat from the roster and destroys it.
    ///
    /// Returns `Ok(false)` if the game doesn't allow structural removal
    /// (fixed rosters can only unbind) or the seat number is unknown.
    ///
    /// # Errors
    /// [`GameError::NotAPlayer`] when called with an identity that holds no
    /// seat. That check happens before the policy check: the caller
    /// asserted the identity was seated, and it wasn't.
    pub fn remove_player(
        &mut self,
        target: PlayerRef<'_>,
    ) -> Result<bool, GameError> {
        let number = match target {
            PlayerRef::Number(number) => number,
            PlayerRef::Identity(key) => self
                .seat_of(key)
                .ok_or_else(|| GameError::NotAPlayer(key.clone()))?,
        };
        if !self.config.allows_renaming {
            return Ok(false);
        }
        let Some(index) = self.position(number) else {
            return Ok(false);
        };

        self.forget(index);
        let player = self.players.remove(index);
        tracing::debug!(room = %self.room, player = number, "player removed");
        player.destroy();
        Ok(true)
    }

    /// Moves the seat held under `old_key` to the identity's current key
    /// and name.
    ///
    /// If the key didn't change, only the name is updated. In games that
    /// don't allow renaming the seat stays keyed by the original identity
    /// and only the displayed name follows.
    ///
    /// Returns `false` if `old_key` holds no seat, or if the new key is
    /// already seated elsewhere.
    pub fn rename_player(
        &mut self,
        identity: &Identity,
        old_key: &IdentityKey,
    ) -> bool {
        let Some(number) = self.seat_of(old_key) else {
            return false;
        };
        if self.seat_of(&identity.key).is_some_and(|seat| seat != number) {
            tracing::warn!(
                room = %self.room,
                identity = %identity.key,
                "rename target already seated"
            );
            return false;
        }
        let Some(index) = self.position(number) else {
            return false;
        };

        if self.config.allows_renaming {
            self.forget(index);
            self.players[index].rekey(identity);
            self.index(&identity.key, number);
        } else {
            if let Some(live) = self.players[index].live_key() {
                self.by_live.remove(live);
            }
            self.players[index].follow(identity);
            self.by_live.insert(identity.key.clone(), number);
        }
        tracing::debug!(
            room = %self.room,
            player = number,
            from = %old_key,
            to = %identity.key,
            "player renamed"
        );
        true
    }

    /// The stock rename handling, for [`GameRules::on_rename`] overrides
    /// that want to extend rather than replace it.
    ///
    /// The order of the checks matters:
    ///
    /// 1. Fixed-roster game, rename not forced, and the identity isn't a
    ///    named, seated player: the game lets go of the identity (drops
    ///    itself from the active-game set) and stops.
    /// 2. `old_key` isn't seated: nothing to do.
    /// 3. Otherwise the seat follows the rename.
    pub fn default_on_rename(
        &mut self,
        identity: &Identity,
        old_key: &IdentityKey,
        _is_joining: bool,
        is_force_renamed: bool,
    ) {
        let seated = self.is_player(&identity.key) || self.is_player(old_key);
        if !self.config.allows_renaming
            && !is_force_renamed
            && !(identity.is_named && seated)
        {
            self.registry.deregister_game(&identity.key, &self.room);
            self.registry.refresh_search_index(&identity.key);
            return;
        }
        if !self.is_player(old_key) {
            return;
        }
        self.rename_player(identity, old_key);
    }

    /// Tears the game down: every seat is destroyed (releasing its
    /// binding) and the room's game slot is cleared.
    ///
    /// Independent of [`end`](Self::end); an active game can be destroyed.
    pub fn destroy(mut self) {
        self.by_identity.clear();
        self.by_live.clear();
        for player in self.players.drain(..) {
            player.destroy();
        }
        self.link.detach_game(&self.room);
        tracing::info!(room = %self.room, kind = %self.config.kind, "game destroyed");
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Roster invariants, exercised with a trivial rule set.

    use std::sync::Mutex;

    use gameroom_session::IdentityDirectory;

    use super::*;

    /// Records what the game asked of its room.
    #[derive(Default)]
    struct RecordingLink {
        roles: Mutex<Vec<IdentityKey>>,
        detached: Mutex<bool>,
    }

    impl RoomLink for RecordingLink {
        fn grant_player_role(&self, _room: &RoomKey, identity: &IdentityKey) {
            self.roles.lock().unwrap().push(identity.clone());
        }

        fn detach_game(&self, _room: &RoomKey) {
            *self.detached.lock().unwrap() = true;
        }
    }

    /// Seats carry a score; join args set the starting value.
    struct Scored;

    impl GameRules for Scored {
        type PlayerState = u32;
        type JoinArgs = u32;

        fn make_player(&mut self, _number: u32, _seed: &PlayerSeed<'_>, start: u32) -> u32 {
            start
        }
    }

    struct Fixture {
        dir: Arc<IdentityDirectory>,
        link: Arc<RecordingLink>,
        game: Game<Scored>,
    }

    fn fixture(config: GameConfig) -> Fixture {
        let dir = Arc::new(IdentityDirectory::default());
        let link = Arc::new(RecordingLink::default());
        let game = Game::new(RoomKey::new("lobby"), config, Scored, dir.clone(), link.clone());
        Fixture { dir, link, game }
    }

    fn online(dir: &IdentityDirectory, name: &str) -> Identity {
        dir.connect_named(name).unwrap().1
    }

    fn assert_consistent(game: &Game<Scored>) {
        for (key, number) in &game.by_identity {
            let player = game.player(*number).expect("indexed seat exists");
            assert_eq!(player.identity_key(), Some(key));
        }
        for (key, number) in &game.by_live {
            let player = game.player(*number).expect("indexed seat exists");
            assert_eq!(player.live_key(), Some(key));
        }
        assert_eq!(game.by_live.len(), game.by_identity.len());
        let bound = game.players().iter().filter(|p| p.is_bound()).count();
        assert_eq!(bound, game.bound_player_count());
    }

    // =====================================================================
    // add_player()
    // =====================================================================

    #[test]
    fn test_add_player_numbers_from_one() {
        let mut f = fixture(GameConfig::default());
        let alice = online(&f.dir, "Alice");

        let player = f.game.add_player(PlayerSeed::Identity(&alice), 10).unwrap();

        assert_eq!(player.number(), 1);
        assert_eq!(*player.state(), 10);
        assert_eq!(f.game.bound_player_count(), 1);
        assert_consistent(&f.game);
    }

    #[test]
    fn test_add_player_duplicate_identity_returns_none() {
        let mut f = fixture(GameConfig::default());
        let alice = online(&f.dir, "Alice");
        f.game.add_player(PlayerSeed::Identity(&alice), 0).unwrap();

        assert!(f.game.add_player(PlayerSeed::Identity(&alice), 0).is_none());
        assert_eq!(f.game.players().len(), 1);
    }

    #[test]
    fn test_add_player_unbound_seat_not_indexed() {
        let mut f = fixture(GameConfig::default());

        let seat = f.game.add_player(PlayerSeed::Anonymous, 0).unwrap();

        assert_eq!(seat.name(), "Player 1");
        assert_eq!(f.game.bound_player_count(), 0);
        assert_eq!(f.game.players().len(), 1);
    }

    #[test]
    fn test_add_player_capacity_counts_bound_players() {
        let mut f = fixture(GameConfig {
            player_capacity: 1,
            ..GameConfig::default()
        });
        let alice = online(&f.dir, "Alice");
        let bob = online(&f.dir, "Bob");

        f.game.add_player(PlayerSeed::Identity(&alice), 0).unwrap();
        assert!(f.game.add_player(PlayerSeed::Identity(&bob), 0).is_none());

        // Emptying the seat frees capacity.
        assert!(f.game.update_player(1, None));
        assert!(f.game.add_player(PlayerSeed::Identity(&bob), 0).is_some());
        assert_consistent(&f.game);
    }

    // =====================================================================
    // update_player()
    // =====================================================================

    #[test]
    fn test_update_player_rebinds_and_grants_role() {
        let mut f = fixture(GameConfig::default());
        let alice = online(&f.dir, "Alice");
        let carol = online(&f.dir, "Carol");
        f.game.add_player(PlayerSeed::Identity(&alice), 0).unwrap();

        assert!(f.game.update_player(1, Some(&carol)));

        let seat = f.game.player(1).unwrap();
        assert_eq!(seat.identity_key(), Some(&carol.key));
        assert_eq!(seat.name(), "Carol");
        assert!(!f.game.is_player(&alice.key));
        assert_eq!(*f.link.roles.lock().unwrap(), vec![carol.key.clone()]);
        assert!(!f.dir.resolve(&alice.key).unwrap().is_playing_in(f.game.room()));
        assert!(f.dir.resolve(&carol.key).unwrap().is_playing_in(f.game.room()));
        assert_consistent(&f.game);
    }

    #[test]
    fn test_update_player_to_none_keeps_name() {
        let mut f = fixture(GameConfig::default());
        let alice = online(&f.dir, "Alice");
        f.game.add_player(PlayerSeed::Identity(&alice), 0).unwrap();

        assert!(f.game.update_player(1, None));

        let seat = f.game.player(1).unwrap();
        assert!(!seat.is_bound());
        assert_eq!(seat.name(), "Alice");
        assert_eq!(f.game.bound_player_count(), 0);
    }

    #[test]
    fn test_unbind_player_works_on_fixed_roster() {
        let mut f = fixture(GameConfig {
            allows_renaming: false,
            ..GameConfig::default()
        });
        let alice = online(&f.dir, "Alice");
        f.game.add_player(PlayerSeed::Identity(&alice), 0).unwrap();

        assert!(f.game.unbind_player(1));
        assert!(!f.game.unbind_player(1), "already empty");

        assert_eq!(f.game.players().len(), 1);
        assert_eq!(f.game.player(1).unwrap().name(), "Alice");
        assert!(!f.game.is_player(&alice.key));
        assert_consistent(&f.game);
    }

    #[test]
    fn test_update_player_fixed_roster_is_noop() {
        let mut f = fixture(GameConfig {
            allows_renaming: false,
            ..GameConfig::default()
        });
        let alice = online(&f.dir, "Alice");
        f.game.add_player(PlayerSeed::Identity(&alice), 0).unwrap();

        assert!(!f.game.update_player(1, None));
        assert!(f.game.is_player(&alice.key));
    }

    #[test]
    fn test_update_player_identity_seated_elsewhere_is_rejected() {
        let mut f = fixture(GameConfig::default());
        let alice = online(&f.dir, "Alice");
        let bob = online(&f.dir, "Bob");
        f.game.add_player(PlayerSeed::Identity(&alice), 0).unwrap();
        f.game.add_player(PlayerSeed::Identity(&bob), 0).unwrap();

        assert!(!f.game.update_player(1, Some(&bob)));
        assert_consistent(&f.game);
    }

    // =====================================================================
    // remove_player()
    // =====================================================================

    #[test]
    fn test_remove_player_by_number() {
        let mut f = fixture(GameConfig::default());
        let alice = online(&f.dir, "Alice");
        f.game.add_player(PlayerSeed::Identity(&alice), 0).unwrap();

        assert!(f.game.remove_player(PlayerRef::Number(1)).unwrap());

        assert!(f.game.players().is_empty());
        assert_eq!(f.game.bound_player_count(), 0);
        assert!(f.dir.resolve(&alice.key).unwrap().active_game_keys.is_empty());
    }

    #[test]
    fn test_remove_player_unknown_identity_is_error() {
        let mut f = fixture(GameConfig::default());
        let ghost = IdentityKey::new("ghost");

        let result = f.game.remove_player(PlayerRef::Identity(&ghost));

        assert!(matches!(result, Err(GameError::NotAPlayer(k)) if k == ghost));
    }

    #[test]
    fn test_remove_player_unknown_identity_is_error_even_on_fixed_roster() {
        let mut f = fixture(GameConfig {
            allows_renaming: false,
            ..GameConfig::default()
        });
        let ghost = IdentityKey::new("ghost");

        assert!(f.game.remove_player(PlayerRef::Identity(&ghost)).is_err());
    }

    #[test]
    fn test_remove_player_fixed_roster_returns_false() {
        let mut f = fixture(GameConfig {
            allows_renaming: false,
            ..GameConfig::default()
        });
        let alice = online(&f.dir, "Alice");
        f.game.add_player(PlayerSeed::Identity(&alice), 0).unwrap();

        let removed = f.game.remove_player(PlayerRef::Identity(&alice.key)).unwrap();

        assert!(!removed);
        assert_eq!(f.game.players().len(), 1);
    }

    #[test]
    fn test_numbers_not_reused_after_removing_last_seat() {
        let mut f = fixture(GameConfig::default());
        f.game.add_player(PlayerSeed::Anonymous, 0).unwrap();
        f.game.add_player(PlayerSeed::Anonymous, 0).unwrap();
        f.game.remove_player(PlayerRef::Number(2)).unwrap();

        let seat = f.game.add_player(PlayerSeed::Anonymous, 0).unwrap();

        assert_eq!(seat.number(), 3);
        assert_eq!(seat.name(), "Player 3");
    }

    #[test]
    fn test_numbers_keep_climbing_after_removal() {
        let mut f = fixture(GameConfig::default());
        f.game.add_player(PlayerSeed::Anonymous, 0).unwrap();
        f.game.add_player(PlayerSeed::Anonymous, 0).unwrap();
        f.game.remove_player(PlayerRef::Number(1)).unwrap();

        let seat = f.game.add_player(PlayerSeed::Anonymous, 0).unwrap();

        assert_eq!(seat.number(), 3);
    }

    // =====================================================================
    // rename_player() / default_on_rename()
    // =====================================================================

    #[test]
    fn test_rename_player_rekeys_seat() {
        let mut f = fixture(GameConfig::default());
        let (conn, bob) = f.dir.connect_named("Bob").unwrap();
        f.game.add_player(PlayerSeed::Identity(&bob), 0).unwrap();

        let rename = f.dir.rename(conn, "Rob").unwrap();
        assert!(f.game.rename_player(&rename.identity, &rename.old_key));

        assert!(f.game.is_player(&rename.identity.key));
        assert!(!f.game.is_player(&bob.key));
        assert_eq!(f.game.player(1).unwrap().name(), "Rob");
        assert_consistent(&f.game);
    }

    #[test]
    fn test_rename_player_same_key_updates_name() {
        let mut f = fixture(GameConfig::default());
        let (conn, bob) = f.dir.connect_named("bob").unwrap();
        f.game.add_player(PlayerSeed::Identity(&bob), 0).unwrap();

        let rename = f.dir.rename(conn, "BOB").unwrap();
        f.game.rename_player(&rename.identity, &rename.old_key);

        assert_eq!(f.game.player_by_identity(&bob.key).unwrap().name(), "BOB");
    }

    #[test]
    fn test_fixed_roster_rename_keeps_seat_reachable_and_unique() {
        let mut f = fixture(GameConfig {
            allows_renaming: false,
            ..GameConfig::default()
        });
        let (conn, bob) = f.dir.connect_named("Bob").unwrap();
        f.game.add_player(PlayerSeed::Identity(&bob), 0).unwrap();

        let rename = f.dir.rename(conn, "Rob").unwrap();
        f.game.default_on_rename(&rename.identity, &rename.old_key, false, false);
        let rob = rename.identity;

        let seat = f.game.player(1).unwrap();
        assert_eq!(seat.identity_key(), Some(&bob.key));
        assert_eq!(seat.name(), "Rob");
        assert!(seat.send(gameroom_protocol::Payload::text("your move")));
        assert!(f.game.is_player(&rob.key));
        assert!(f.game.add_player(PlayerSeed::Identity(&rob), 0).is_none());
        assert_eq!(f.game.bound_player_count(), 1);
        assert_consistent(&f.game);

        f.game.destroy();

        assert!(f.dir.resolve(&rob.key).unwrap().active_game_keys.is_empty());
    }

    #[test]
    fn test_fixed_roster_second_rename_follows_from_current_key() {
        let mut f = fixture(GameConfig {
            allows_renaming: false,
            ..GameConfig::default()
        });
        let (conn, bob) = f.dir.connect_named("Bob").unwrap();
        f.game.add_player(PlayerSeed::Identity(&bob), 0).unwrap();

        let first = f.dir.rename(conn, "Rob").unwrap();
        f.game.default_on_rename(&first.identity, &first.old_key, false, false);
        let second = f.dir.rename(conn, "Robert").unwrap();
        f.game.default_on_rename(&second.identity, &second.old_key, false, false);

        let seat = f.game.player_by_identity(&second.identity.key).unwrap();
        assert_eq!(seat.name(), "Robert");
        assert_eq!(seat.identity_key(), Some(&bob.key));
        assert!(!f.game.is_player(&first.identity.key));
        assert_consistent(&f.game);

        assert!(f.game.unbind_player(1));
        assert!(f.dir.resolve(&second.identity.key).unwrap().active_game_keys.is_empty());
        assert_consistent(&f.game);
    }

    #[test]
    fn test_merged_away_seat_does_not_leak_game_to_merge_target() {
        let mut f = fixture(GameConfig::default());
        let (conn, alice) = f.dir.connect_named("Alice").unwrap();
        let bob = online(&f.dir, "Bob");
        f.game.add_player(PlayerSeed::Identity(&alice), 0).unwrap();

        let merge = f.dir.rename(conn, "Bob").unwrap();
        assert!(merge.merged);
        Scored::on_update_connection(&mut f.game, &merge.identity, conn);
        f.game.destroy();

        assert!(!f.dir.resolve(&bob.key).unwrap().is_playing_in(&RoomKey::new("lobby")));
    }

    #[test]
    fn test_default_on_rename_forced_non_player_is_noop() {
        let mut f = fixture(GameConfig {
            allows_renaming: false,
            ..GameConfig::default()
        });
        let zed = online(&f.dir, "Zed");
        f.dir.register_game(&zed.key, f.game.room());
        let refreshes = f.dir.search_index_refreshes(&zed.key);

        f.game.default_on_rename(&zed, &zed.key, false, true);

        assert!(f.dir.resolve(&zed.key).unwrap().is_playing_in(f.game.room()));
        assert_eq!(f.dir.search_index_refreshes(&zed.key), refreshes);
    }

    // =====================================================================
    // end() / destroy()
    // =====================================================================

    #[test]
    fn test_end_is_one_way() {
        let mut f = fixture(GameConfig::default());

        f.game.end();
        f.game.end();

        assert_eq!(f.game.state(), GameState::Ended);
    }

    #[test]
    fn test_destroy_unbinds_everyone_and_detaches() {
        let mut f = fixture(GameConfig::default());
        let alice = online(&f.dir, "Alice");
        let bob = online(&f.dir, "Bob");
        f.game.add_player(PlayerSeed::Identity(&alice), 0).unwrap();
        f.game.add_player(PlayerSeed::Identity(&bob), 0).unwrap();
        f.game.add_player(PlayerSeed::Anonymous, 0).unwrap();

        f.game.destroy();

        assert!(f.dir.resolve(&alice.key).unwrap().active_game_keys.is_empty());
        assert!(f.dir.resolve(&bob.key).unwrap().active_game_keys.is_empty());
        assert!(*f.link.detached.lock().unwrap());
    }
}
