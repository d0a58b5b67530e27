//! Room configuration and snapshots.

use gameroom_game::GameState;
use gameroom_protocol::RoomKey;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration for a room instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// How many committed chat lines the room keeps. Older lines are
    /// dropped first.
    pub chat_log_limit: usize,

    /// Capacity of the room's command channel. When it's full, callers
    /// wait (backpressure).
    pub channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            chat_log_limit: 100,
            channel_size: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// What a room reports about its game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    pub kind: String,
    pub title: String,
    pub state: GameState,
    pub bound_players: usize,
    /// Seat names in roster order.
    pub players: Vec<String>,
}

/// A snapshot of room metadata.
#[derive(Debug, Clone, Serialize)]
pub struct RoomInfo {
    pub room: RoomKey,
    /// Number of distinct identities present.
    pub occupants: usize,
    /// `None` when the game slot is empty.
    pub game: Option<GameSummary>,
    /// The most recent committed chat lines, oldest first.
    pub chat_log: Vec<String>,
}
