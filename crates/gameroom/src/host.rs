//! The host: one identity directory, one room manager, and the routing
//! between them.
//!
//! A chat server's connection layer reports what it sees (a connection
//! opened, joined a room, renamed itself, closed) and the host turns each
//! report into the right room events, in the right order:
//!
//!   1. Resolve the connection to its current identity
//!   2. Find the rooms the event concerns
//!   3. Forward the event to each of those rooms' actors

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use gameroom_game::{Game, GameCommand, GameConfig, GameRules};
use gameroom_protocol::{ConnectionId, IdentityKey, RoomKey};
use gameroom_room::{RoomHandle, RoomInfo, RoomManager};
use gameroom_session::{
    Departure, Identity, IdentityDirectory, IdentityRegistry, Rename, SessionError,
};
use tokio::sync::Mutex;

use crate::{GameroomError, HostConfig};

/// Shared host state.
///
/// Wrap it in an `Arc` to hand it to per-connection tasks. Interior
/// mutability via `Mutex` where needed; no lock is held while a room
/// actor is being awaited except the room manager's own.
pub struct Host {
    directory: Arc<IdentityDirectory>,
    rooms: Mutex<RoomManager>,
    /// Rooms each open connection has joined.
    presence: Mutex<HashMap<ConnectionId, BTreeSet<RoomKey>>>,
}

impl Host {
    pub fn new(config: HostConfig) -> Self {
        Self {
            directory: Arc::new(IdentityDirectory::new(config.directory)),
            rooms: Mutex::new(RoomManager::new(config.room)),
            presence: Mutex::new(HashMap::new()),
        }
    }

    /// The identity directory games resolve players through.
    pub fn directory(&self) -> &Arc<IdentityDirectory> {
        &self.directory
    }

    // -----------------------------------------------------------------
    // Connections
    // -----------------------------------------------------------------

    /// Opens a connection under a fresh guest identity.
    pub fn connect_guest(&self) -> (ConnectionId, Identity) {
        self.directory.connect_guest()
    }

    /// Opens a connection under `name`, joining the live identity with that
    /// key if there is one.
    pub fn connect_named(&self, name: &str) -> Result<(ConnectionId, Identity), GameroomError> {
        Ok(self.directory.connect_named(name)?)
    }

    /// Closes a connection. It leaves every room it was in first, so the
    /// games see the departure while the identity can still be resolved.
    pub async fn disconnect(&self, connection: ConnectionId) -> Result<Departure, GameroomError> {
        let identity = self.identity(connection)?;
        let rooms = self
            .presence
            .lock()
            .await
            .remove(&connection)
            .unwrap_or_default();

        for room in rooms {
            let result = match self.handle(&room).await {
                Ok(handle) => handle
                    .leave(identity.clone(), connection)
                    .await
                    .map_err(GameroomError::from),
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                tracing::debug!(%connection, %room, error = %e, "leave on disconnect failed");
            }
        }

        Ok(self.directory.disconnect(connection)?)
    }

    /// Renames the identity behind `connection`.
    ///
    /// A plain rename re-keys the whole identity, so every room any of its
    /// connections is in hears about it. A merge only moves this one
    /// connection, so only this connection's rooms are told.
    pub async fn rename(
        &self,
        connection: ConnectionId,
        name: &str,
    ) -> Result<Rename, GameroomError> {
        let rename = self.directory.rename(connection, name)?;

        if rename.merged {
            let rooms = self.rooms_of_connection(connection).await;
            for room in rooms {
                self.handle(&room)
                    .await?
                    .update_connection(rename.identity.clone(), rename.old_key.clone(), connection)
                    .await?;
            }
        } else {
            self.announce_rename(&rename, false).await?;
        }
        Ok(rename)
    }

    /// Renames an identity on an administrator's behalf.
    pub async fn force_rename(
        &self,
        key: &IdentityKey,
        name: &str,
    ) -> Result<Rename, GameroomError> {
        let rename = self.directory.force_rename(key, name)?;
        self.announce_rename(&rename, true).await?;
        Ok(rename)
    }

    async fn announce_rename(&self, rename: &Rename, forced: bool) -> Result<(), GameroomError> {
        for room in self.rooms_of(&rename.identity.key).await {
            self.handle(&room)
                .await?
                .rename(rename.identity.clone(), rename.old_key.clone(), forced)
                .await?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Rooms
    // -----------------------------------------------------------------

    pub async fn create_room(&self, room: RoomKey) -> Result<(), GameroomError> {
        self.rooms.lock().await.create_room(room)?;
        Ok(())
    }

    /// Shuts a room down, destroying its game.
    pub async fn destroy_room(&self, room: &RoomKey) -> Result<(), GameroomError> {
        self.rooms.lock().await.destroy_room(room).await?;
        for rooms in self.presence.lock().await.values_mut() {
            rooms.remove(room);
        }
        Ok(())
    }

    /// Puts the connection in the room.
    pub async fn join_room(
        &self,
        connection: ConnectionId,
        room: &RoomKey,
    ) -> Result<(), GameroomError> {
        let identity = self.identity(connection)?;
        self.handle(room).await?.join(identity, connection).await?;
        self.presence
            .lock()
            .await
            .entry(connection)
            .or_default()
            .insert(room.clone());
        Ok(())
    }

    /// Takes the connection out of the room.
    pub async fn leave_room(
        &self,
        connection: ConnectionId,
        room: &RoomKey,
    ) -> Result<(), GameroomError> {
        let identity = self.identity(connection)?;
        self.handle(room).await?.leave(identity, connection).await?;
        if let Some(rooms) = self.presence.lock().await.get_mut(&connection) {
            rooms.remove(room);
        }
        Ok(())
    }

    /// Bans an identity from a room. All of its connections are removed.
    pub async fn ban(&self, room: &RoomKey, key: &IdentityKey) -> Result<(), GameroomError> {
        let identity = self
            .directory
            .resolve(key)
            .ok_or_else(|| SessionError::NotFound(key.clone()))?;
        self.handle(room).await?.ban(identity).await?;

        let connections = self.directory.connections_of(key);
        let mut presence = self.presence.lock().await;
        for connection in connections {
            if let Some(rooms) = presence.get_mut(&connection) {
                rooms.remove(room);
            }
        }
        Ok(())
    }

    pub async fn chat(
        &self,
        connection: ConnectionId,
        room: &RoomKey,
        message: &str,
    ) -> Result<(), GameroomError> {
        let identity = self.identity(connection)?;
        self.handle(room).await?.chat(identity, message).await?;
        Ok(())
    }

    /// Routes a parsed game command to the room's game.
    pub async fn command(
        &self,
        connection: ConnectionId,
        room: &RoomKey,
        command: GameCommand,
    ) -> Result<(), GameroomError> {
        let identity = self.identity(connection)?;
        self.handle(room).await?.command(identity, command).await?;
        Ok(())
    }

    pub async fn room_info(&self, room: &RoomKey) -> Result<RoomInfo, GameroomError> {
        Ok(self.handle(room).await?.get_info().await?)
    }

    /// Rooms that currently host a game.
    pub async fn list_games(&self) -> Vec<RoomInfo> {
        self.rooms.lock().await.list_games().await
    }

    // -----------------------------------------------------------------
    // Games
    // -----------------------------------------------------------------

    /// Creates a game in the room's slot.
    ///
    /// The game resolves its players through this host's directory.
    /// Occupants already in the room are not seated automatically.
    pub async fn start_game<R: GameRules>(
        &self,
        room: &RoomKey,
        config: GameConfig,
        rules: R,
    ) -> Result<(), GameroomError> {
        let handle = self.handle(room).await?;
        let game = Game::new(
            room.clone(),
            config,
            rules,
            self.directory.clone(),
            handle.slot(),
        );
        handle.attach_game(Box::new(game)).await?;
        Ok(())
    }

    /// Destroys the room's game. The room stays open.
    pub async fn end_game(&self, room: &RoomKey) -> Result<(), GameroomError> {
        self.handle(room).await?.destroy_game().await?;
        Ok(())
    }

    // -----------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------

    /// Rooms any connection of the identity is in.
    pub async fn rooms_of(&self, key: &IdentityKey) -> BTreeSet<RoomKey> {
        let connections = self.directory.connections_of(key);
        let presence = self.presence.lock().await;
        connections
            .iter()
            .filter_map(|connection| presence.get(connection))
            .flatten()
            .cloned()
            .collect()
    }

    async fn rooms_of_connection(&self, connection: ConnectionId) -> BTreeSet<RoomKey> {
        self.presence
            .lock()
            .await
            .get(&connection)
            .cloned()
            .unwrap_or_default()
    }

    fn identity(&self, connection: ConnectionId) -> Result<Identity, GameroomError> {
        self.directory
            .identity_of(connection)
            .and_then(|key| self.directory.resolve(&key))
            .ok_or_else(|| SessionError::UnknownConnection(connection).into())
    }

    async fn handle(&self, room: &RoomKey) -> Result<RoomHandle, GameroomError> {
        Ok(self.rooms.lock().await.room(room)?.clone())
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new(HostConfig::default())
    }
}
