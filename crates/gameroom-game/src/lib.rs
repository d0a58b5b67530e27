//! Game lifecycle management for Gameroom.
//!
//! A room hosts at most one game at a time. The game owns a roster of
//! players, each optionally bound to a live identity, and turns room events
//! (join, leave, rename, chat) into roster updates.
//!
//! # Key types
//!
//! - [`Game`] — the roster and the room-event mediator
//! - [`Player`] — one roster slot
//! - [`GameRules`] — the trait concrete games implement
//! - [`Activity`] — object-safe view of any `Game<R>`, for rooms
//! - [`RoomLink`] — what a game may ask of its room
//! - [`GameConfig`] / [`GameState`] — settings and lifecycle

mod activity;
mod config;
mod error;
mod game;
mod link;
mod player;
mod rules;

pub use activity::Activity;
pub use config::{GameConfig, GameState};
pub use error::GameError;
pub use game::{Game, PlayerRef};
pub use link::RoomLink;
pub use player::{Player, PlayerSeed};
pub use rules::{GameCommand, GameRules};
