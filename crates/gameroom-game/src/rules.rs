//! The `GameRules` trait: the extension point for concrete games.
//!
//! A concrete game (a battle, hangman, a tournament bracket) implements
//! this trait. The base [`Game`] keeps the roster consistent; the rules
//! decide what each seat carries and how the game reacts to room events.
//! Every hook has a default, so a game only overrides what it cares about.

use gameroom_protocol::{ConnectionId, IdentityKey};
use gameroom_session::Identity;

use crate::{Game, GameError, PlayerSeed};

/// Commands an external command router may forward to a game.
///
/// The core never issues these itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameCommand {
    Forfeit,
    Choose(String),
    Undo(String),
    RequestTie,
    JoinGame(String),
    LeaveGame(String),
}

impl GameCommand {
    /// The command's name as a user would type it.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Forfeit => "forfeit",
            Self::Choose(_) => "choose",
            Self::Undo(_) => "undo",
            Self::RequestTie => "offertie",
            Self::JoinGame(_) => "joingame",
            Self::LeaveGame(_) => "leavegame",
        }
    }
}

/// The trait concrete games implement.
///
/// Hooks are associated functions that receive the whole [`Game`], the
/// same way the roster operations do, so an override can add or drop
/// players, end the game, or message seats.
///
/// # Associated types
///
/// - `PlayerState` — what each seat carries beyond the base fields
/// - `JoinArgs` — extra arguments [`Game::add_player`] forwards to
///   [`make_player`](Self::make_player)
pub trait GameRules: Sized + Send + 'static {
    type PlayerState: Send + 'static;
    type JoinArgs;

    /// Builds the per-seat state for a new player.
    ///
    /// Numbering and binding stay with the base game; this only decides
    /// what the seat carries.
    fn make_player(
        &mut self,
        number: u32,
        seed: &PlayerSeed<'_>,
        args: Self::JoinArgs,
    ) -> Self::PlayerState;

    /// The identity's first connection entered the room.
    fn on_join(
        _game: &mut Game<Self>,
        _identity: &Identity,
        _connection: ConnectionId,
    ) {
    }

    /// The identity's last connection left the room.
    fn on_leave(_game: &mut Game<Self>, _identity: &Identity) {}

    /// Any connection of the identity joined or was refreshed.
    fn on_connect(
        _game: &mut Game<Self>,
        _identity: &Identity,
        _connection: ConnectionId,
    ) {
    }

    /// A connection moved over to a different identity.
    fn on_update_connection(
        game: &mut Game<Self>,
        identity: &Identity,
        connection: ConnectionId,
    ) {
        Self::on_connect(game, identity, connection);
    }

    /// The identity gave up. Returns `true` if the game handled it.
    fn forfeit(_game: &mut Game<Self>, _identity: &Identity) -> bool {
        false
    }

    /// The identity was banned from the room.
    fn remove_banned_user(game: &mut Game<Self>, identity: &Identity) {
        Self::forfeit(game, identity);
    }

    /// The identity changed its name. `old_key` is the key it had before.
    fn on_rename(
        game: &mut Game<Self>,
        identity: &Identity,
        old_key: &IdentityKey,
        is_joining: bool,
        is_force_renamed: bool,
    ) {
        game.default_on_rename(identity, old_key, is_joining, is_force_renamed);
    }

    /// Called before a chat message is committed to the room log.
    ///
    /// Return `Some(reason)` to block the message; the reason is shown to
    /// the sender.
    fn on_chat_message(
        _game: &mut Game<Self>,
        _message: &str,
        _identity: &Identity,
    ) -> Option<String> {
        None
    }

    /// Called after a chat message was committed.
    fn on_log_message(
        _game: &mut Game<Self>,
        _message: &str,
        _identity: &Identity,
    ) {
    }

    /// Entry point for the command router.
    ///
    /// Default: `Forfeit` goes to [`forfeit`](Self::forfeit), everything
    /// else is unsupported.
    fn handle_command(
        game: &mut Game<Self>,
        identity: &Identity,
        command: GameCommand,
    ) -> Result<(), GameError> {
        match command {
            GameCommand::Forfeit if Self::forfeit(game, identity) => Ok(()),
            other => Err(GameError::UnsupportedCommand(other.name())),
        }
    }
}
