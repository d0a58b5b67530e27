//! Game configuration and lifecycle state.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Descriptive metadata and roster policy for a game.
///
/// Missing fields fall back to [`GameConfig::default`] when deserializing,
/// so a host can keep only the interesting bits in its config files:
///
/// ```rust
/// use gameroom_game::GameConfig;
///
/// let config = GameConfig {
///     kind: "hangman".into(),
///     player_capacity: 1,
///     ..GameConfig::default()
/// };
/// assert!(config.allows_renaming);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Machine-readable activity type, e.g. `"battle"` or `"hangman"`.
    pub kind: String,

    /// Human-readable title shown in the room.
    pub title: String,

    /// Whether identity renames follow into player records, and whether
    /// players may be structurally removed.
    ///
    /// When `false` the roster is fixed: slots keep the key they were
    /// created with and can only be unbound, never removed.
    pub allows_renaming: bool,

    /// Maximum number of bound players. 0 means unlimited.
    pub player_capacity: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            kind: "game".to_owned(),
            title: "Game".to_owned(),
            allows_renaming: true,
            player_capacity: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// Whether the game is still being played.
///
/// ```text
/// Active ──(end)──→ Ended
/// ```
///
/// The transition is one-way and decided by the concrete game. Tearing a
/// game down (`Game::destroy`) is separate: a game can be destroyed while
/// still `Active`, e.g. when its room is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameState {
    #[default]
    Active,
    Ended,
}

impl GameState {
    pub fn is_ended(self) -> bool {
        matches!(self, Self::Ended)
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Ended => write!(f, "Ended"),
        }
    }
}
