//! Error types for the session layer.

use gameroom_protocol::{ConnectionId, IdentityKey};

/// Errors that can occur while managing identities and connections.
///
/// Resolution misses inside [`IdentityRegistry`](crate::IdentityRegistry)
/// are *not* errors: a disconnected user is routine. These variants cover
/// explicit requests that name something which doesn't exist.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The connection was never opened, or has already been closed.
    #[error("connection {0} not found")]
    UnknownConnection(ConnectionId),

    /// No live identity has this key.
    #[error("identity {0} not found")]
    NotFound(IdentityKey),

    /// The requested name can't be turned into a key.
    #[error("invalid name: {0}")]
    InvalidName(#[from] gameroom_protocol::ProtocolError),

    /// A forced rename targeted a key that another live identity owns.
    #[error("name {0} is already in use")]
    NameTaken(IdentityKey),
}
