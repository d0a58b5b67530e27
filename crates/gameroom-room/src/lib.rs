//! Rooms for Gameroom.
//!
//! Each room runs as an isolated Tokio task (actor model). The task owns
//! the room's occupants, its chat log, and the single game slot, and it
//! handles one command at a time, so a game never sees two events
//! interleave.
//!
//! # Key types
//!
//! - [`RoomManager`] — creates/destroys rooms
//! - [`RoomHandle`] — send events and commands to a running room
//! - [`RoomSlot`] — the part of a room a game may touch (roles, game slot)
//! - [`RoomInfo`] / [`GameSummary`] — snapshots for listings
//! - [`RoomConfig`] — chat log and channel sizing

mod config;
mod error;
mod manager;
mod room;
mod slot;

pub use config::{GameSummary, RoomConfig, RoomInfo};
pub use error::RoomError;
pub use manager::RoomManager;
pub use room::RoomHandle;
pub use slot::{Role, RoomSlot};
