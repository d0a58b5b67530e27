//! Room manager: creates, tracks, and tears down rooms.

use std::collections::HashMap;

use gameroom_protocol::RoomKey;

use crate::room::spawn_room;
use crate::{RoomConfig, RoomError, RoomHandle, RoomInfo};

/// Manages all running rooms.
///
/// This is the entry point for room operations from the host (the chat
/// server's connection layer and command router).
pub struct RoomManager {
    /// Running rooms, keyed by room key.
    rooms: HashMap<RoomKey, RoomHandle>,

    /// Applied to every room this manager creates.
    config: RoomConfig,
}

impl RoomManager {
    /// Creates a new, empty room manager.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            config,
        }
    }

    /// Starts a room actor for `room`.
    ///
    /// Must be called from inside a Tokio runtime.
    ///
    /// # Errors
    /// [`RoomError::AlreadyExists`] if the key is taken.
    pub fn create_room(&mut self, room: RoomKey) -> Result<RoomHandle, RoomError> {
        if self.rooms.contains_key(&room) {
            return Err(RoomError::AlreadyExists(room));
        }
        let handle = spawn_room(room.clone(), self.config.clone());
        self.rooms.insert(room.clone(), handle.clone());
        tracing::info!(%room, "room created");
        Ok(handle)
    }

    /// Returns a handle to a running room.
    pub fn room(&self, room: &RoomKey) -> Result<&RoomHandle, RoomError> {
        self.rooms
            .get(room)
            .ok_or_else(|| RoomError::NotFound(room.clone()))
    }

    /// Returns info about a specific room.
    pub async fn get_room_info(
        &self,
        room: &RoomKey,
    ) -> Result<RoomInfo, RoomError> {
        self.room(room)?.get_info().await
    }

    /// Shuts a room down. Its game, if any, is destroyed first.
    pub async fn destroy_room(&mut self, room: &RoomKey) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(room)
            .ok_or_else(|| RoomError::NotFound(room.clone()))?;

        let _ = handle.shutdown().await;

        tracing::info!(%room, "room destroyed");
        Ok(())
    }

    /// Lists the rooms that currently host a game.
    ///
    /// Rooms that fail to respond (e.g., shutting down) are silently
    /// skipped.
    pub async fn list_games(&self) -> Vec<RoomInfo> {
        let mut infos = Vec::new();
        for handle in self.rooms.values() {
            if let Ok(info) = handle.get_info().await {
                if info.game.is_some() {
                    infos.push(info);
                }
            }
        }
        infos
    }

    /// Returns the number of running rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Lists all running room keys.
    pub fn room_keys(&self) -> Vec<RoomKey> {
        self.rooms.keys().cloned().collect()
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
