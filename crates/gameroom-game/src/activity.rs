//! Type-erased games.
//!
//! A room can host a battle today and hangman tomorrow, so it can't be
//! generic over the rules. `Activity` is the object-safe slice of
//! [`Game`] a room needs: metadata, event delivery, and teardown.

use gameroom_protocol::{ConnectionId, IdentityKey, RoomKey};
use gameroom_session::Identity;

use crate::{Game, GameCommand, GameError, GameRules, GameState};

/// Anything a room can host as `Box<dyn Activity>`.
///
/// Implemented for every `Game<R>`; each event forwards to the matching
/// [`GameRules`] hook.
pub trait Activity: Send {
    fn room(&self) -> &RoomKey;
    fn kind(&self) -> &str;
    fn title(&self) -> &str;
    fn state(&self) -> GameState;
    fn bound_player_count(&self) -> usize;

    /// Seat names in roster order, bound or not.
    fn player_names(&self) -> Vec<String>;

    fn on_join(&mut self, identity: &Identity, connection: ConnectionId);
    fn on_leave(&mut self, identity: &Identity);
    fn on_connect(&mut self, identity: &Identity, connection: ConnectionId);
    fn on_update_connection(
        &mut self,
        identity: &Identity,
        connection: ConnectionId,
    );
    fn remove_banned_user(&mut self, identity: &Identity);
    fn on_rename(
        &mut self,
        identity: &Identity,
        old_key: &IdentityKey,
        is_joining: bool,
        is_force_renamed: bool,
    );
    fn on_chat_message(
        &mut self,
        message: &str,
        identity: &Identity,
    ) -> Option<String>;
    fn on_log_message(&mut self, message: &str, identity: &Identity);
    fn handle_command(
        &mut self,
        identity: &Identity,
        command: GameCommand,
    ) -> Result<(), GameError>;

    /// Tears the game down. See [`Game::destroy`].
    fn destroy(self: Box<Self>);
}

impl<R: GameRules> Activity for Game<R> {
    fn room(&self) -> &RoomKey {
        Game::room(self)
    }

    fn kind(&self) -> &str {
        Game::kind(self)
    }

    fn title(&self) -> &str {
        Game::title(self)
    }

    fn state(&self) -> GameState {
        Game::state(self)
    }

    fn bound_player_count(&self) -> usize {
        Game::bound_player_count(self)
    }

    fn player_names(&self) -> Vec<String> {
        self.players().iter().map(|p| p.name().to_owned()).collect()
    }

    fn on_join(&mut self, identity: &Identity, connection: ConnectionId) {
        R::on_join(self, identity, connection);
    }

    fn on_leave(&mut self, identity: &Identity) {
        R::on_leave(self, identity);
    }

    fn on_connect(&mut self, identity: &Identity, connection: ConnectionId) {
        R::on_connect(self, identity, connection);
    }

    fn on_update_connection(
        &mut self,
        identity: &Identity,
        connection: ConnectionId,
    ) {
        R::on_update_connection(self, identity, connection);
    }

    fn remove_banned_user(&mut self, identity: &Identity) {
        R::remove_banned_user(self, identity);
    }

    fn on_rename(
        &mut self,
        identity: &Identity,
        old_key: &IdentityKey,
        is_joining: bool,
        is_force_renamed: bool,
    ) {
        R::on_rename(self, identity, old_key, is_joining, is_force_renamed);
    }

    fn on_chat_message(
        &mut self,
        message: &str,
        identity: &Identity,
    ) -> Option<String> {
        R::on_chat_message(self, message, identity)
    }

    fn on_log_message(&mut self, message: &str, identity: &Identity) {
        R::on_log_message(self, message, identity);
    }

    fn handle_command(
        &mut self,
        identity: &Identity,
        command: GameCommand,
    ) -> Result<(), GameError> {
        R::handle_command(self, identity, command)
    }

    fn destroy(self: Box<Self>) {
        Game::destroy(*self);
    }
}
