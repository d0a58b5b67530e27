//! Identity management for Gameroom.
//!
//! This crate is the game layer's view of "who is who":
//!
//! 1. **Identities** — persistent accounts with a key, a display name and
//!    the set of games they are playing ([`Identity`])
//! 2. **Resolution** — looking an identity up by key at the moment it is
//!    needed ([`IdentityRegistry`])
//! 3. **Connections** — several transport sessions per identity, renames
//!    and merges ([`IdentityDirectory`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Game Layer (above)  ← binds players to identities, resolves them by key
//!     ↕
//! Session Layer (this crate)  ← owns identities and their connections
//!     ↕
//! Protocol Layer (below)  ← provides IdentityKey, RoomKey, Payload
//! ```

mod directory;
mod error;
mod identity;
mod registry;

pub use directory::IdentityDirectory;
pub use error::SessionError;
pub use identity::{Delivery, Departure, DirectoryConfig, Identity, Rename};
pub use registry::IdentityRegistry;
