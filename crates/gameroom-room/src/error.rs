//! Error types for the room layer.

use gameroom_game::GameError;
use gameroom_protocol::{ConnectionId, IdentityKey, RoomKey};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomKey),

    /// A room with this key is already running.
    #[error("room {0} already exists")]
    AlreadyExists(RoomKey),

    /// The room already hosts a game. Destroy it first.
    #[error("room {0} already has a game in progress")]
    GameInProgress(RoomKey),

    /// The room has no game to act on.
    #[error("room {0} has no game")]
    NoGame(RoomKey),

    /// The game was built for a different room.
    #[error("game belongs to room {actual}, not {expected}")]
    WrongRoom { expected: RoomKey, actual: RoomKey },

    /// The identity is not in this room.
    #[error("{0} is not in room {1}")]
    NotInRoom(IdentityKey, RoomKey),

    /// The connection is already in this room.
    #[error("connection {0} already joined")]
    DuplicateConnection(ConnectionId),

    /// The game refused a chat message. The reason is meant for the sender.
    #[error("message blocked: {0}")]
    MessageBlocked(String),

    /// The game rejected a command.
    #[error(transparent)]
    Game(#[from] GameError),

    /// The room's command channel is full or closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomKey),
}
