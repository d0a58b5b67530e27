//! The game's view of its room.

use gameroom_protocol::{IdentityKey, RoomKey};

/// What a game is allowed to ask of the room hosting it.
///
/// The room owns the game; the game only holds this capability, so it can
/// never reach into the room's other state.
pub trait RoomLink: Send + Sync + 'static {
    /// Marks `identity` as a player in the room's role table.
    fn grant_player_role(&self, room: &RoomKey, identity: &IdentityKey);

    /// Clears the room's game slot. Called once, from `Game::destroy`.
    fn detach_game(&self, room: &RoomKey);
}
