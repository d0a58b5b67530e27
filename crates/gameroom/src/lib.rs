//! # Gameroom
//!
//! Game lifecycle management for chat rooms.
//!
//! A chat server hosts rooms; each room may host one game. Gameroom keeps
//! the game's roster in step with the people in the room: players are
//! seated, unbound when they leave, re-keyed when they rename, and
//! released when the game is destroyed. Game developers implement a
//! single [`GameRules`] trait and the [`Host`] routes room events to it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gameroom::prelude::*;
//!
//! # async fn run<G: GameRules>(rules: G) -> Result<(), GameroomError> {
//! let host = Host::new(HostConfig::default());
//! let lobby = RoomKey::new("lobby");
//! host.create_room(lobby.clone()).await?;
//! host.start_game(&lobby, GameConfig::default(), rules).await?;
//!
//! let (connection, _alice) = host.connect_named("Alice")?;
//! host.join_room(connection, &lobby).await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod host;

pub use config::HostConfig;
pub use error::GameroomError;
pub use host::Host;

pub use gameroom_game as game;
pub use gameroom_protocol as protocol;
pub use gameroom_room as room;
pub use gameroom_session as session;

/// Everything a game implementation usually needs, in one import.
pub mod prelude {
    pub use crate::{GameroomError, Host, HostConfig};
    pub use gameroom_game::{
        Game, GameCommand, GameConfig, GameError, GameRules, GameState, Player, PlayerRef,
        PlayerSeed,
    };
    pub use gameroom_protocol::{ConnectionId, IdentityKey, Payload, RoomKey};
    pub use gameroom_room::{RoomConfig, RoomError, RoomInfo};
    pub use gameroom_session::{Identity, IdentityDirectory, IdentityRegistry, SessionError};
}
