//! Unified error type for Gameroom.

use gameroom_game::GameError;
use gameroom_protocol::ProtocolError;
use gameroom_room::RoomError;
use gameroom_session::SessionError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `gameroom` crate, you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GameroomError {
    /// A key could not be built (empty name).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An identity-level error (unknown connection, name taken).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A roster-level error (not a player, unsupported command).
    #[error(transparent)]
    Game(#[from] GameError),

    /// A room-level error (not found, game in progress, blocked chat).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The host configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
