//! Error types for the game layer.
//!
//! Almost every roster operation reports rejection through `Option` or
//! `bool`: a full game or a duplicate join is routine. The variants here
//! are for callers that broke their side of the contract.

use gameroom_protocol::IdentityKey;

/// Errors raised by game operations.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The caller asked to remove an identity's player, but the identity
    /// has no roster entry.
    #[error("{0} is not a player in this game")]
    NotAPlayer(IdentityKey),

    /// The game doesn't implement this command.
    #[error("this game does not support /{0}")]
    UnsupportedCommand(&'static str),
}
