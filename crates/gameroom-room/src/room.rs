//! Room actor: an isolated Tokio task that hosts at most one game.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. Commands are processed strictly in arrival
//! order and each one runs to completion before the next, which is the
//! only ordering guarantee the hosted game relies on.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use gameroom_game::{Activity, GameCommand};
use gameroom_protocol::{ConnectionId, IdentityKey, RoomKey};
use gameroom_session::Identity;
use tokio::sync::{mpsc, oneshot};

use crate::{GameSummary, RoomConfig, RoomError, RoomInfo, RoomSlot};

type Reply = oneshot::Sender<Result<(), RoomError>>;

/// Commands sent to a room actor through its channel.
///
/// Every variant carries a reply channel so callers can await the
/// outcome; events are still applied in the order they were sent.
pub(crate) enum RoomCommand {
    Join {
        identity: Identity,
        connection: ConnectionId,
        reply: Reply,
    },
    Leave {
        identity: Identity,
        connection: ConnectionId,
        reply: Reply,
    },
    /// A connection moved from `old_key` to `identity` (a merge).
    UpdateConnection {
        identity: Identity,
        old_key: IdentityKey,
        connection: ConnectionId,
        reply: Reply,
    },
    Rename {
        identity: Identity,
        old_key: IdentityKey,
        is_force_renamed: bool,
        reply: Reply,
    },
    Ban {
        identity: Identity,
        reply: Reply,
    },
    Chat {
        identity: Identity,
        message: String,
        reply: Reply,
    },
    Command {
        identity: Identity,
        command: GameCommand,
        reply: Reply,
    },
    AttachGame {
        game: Box<dyn Activity>,
        reply: Reply,
    },
    DestroyGame {
        reply: Reply,
    },
    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },
    Shutdown,
}

/// Handle to a running room actor. Used to send commands to it.
///
/// Cheap to clone: an `mpsc::Sender` plus the shared slot.
#[derive(Clone)]
pub struct RoomHandle {
    room: RoomKey,
    slot: Arc<RoomSlot>,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's key.
    pub fn room(&self) -> &RoomKey {
        &self.room
    }

    /// The room's slot. Pass it to `Game::new` as the game's `RoomLink`.
    pub fn slot(&self) -> Arc<RoomSlot> {
        Arc::clone(&self.slot)
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.room.clone())
    }

    /// Sends a command built around a fresh reply channel and waits for
    /// the answer.
    async fn request(
        &self,
        build: impl FnOnce(Reply) -> RoomCommand,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(build(reply_tx))
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// A connection of `identity` entered the room.
    pub async fn join(
        &self,
        identity: Identity,
        connection: ConnectionId,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Join {
            identity,
            connection,
            reply,
        })
        .await
    }

    /// A connection of `identity` left the room.
    pub async fn leave(
        &self,
        identity: Identity,
        connection: ConnectionId,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Leave {
            identity,
            connection,
            reply,
        })
        .await
    }

    /// `connection` now belongs to `identity`; it used to belong to
    /// `old_key`.
    pub async fn update_connection(
        &self,
        identity: Identity,
        old_key: IdentityKey,
        connection: ConnectionId,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::UpdateConnection {
            identity,
            old_key,
            connection,
            reply,
        })
        .await
    }

    /// `identity` was called `old_key` until now.
    pub async fn rename(
        &self,
        identity: Identity,
        old_key: IdentityKey,
        is_force_renamed: bool,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Rename {
            identity,
            old_key,
            is_force_renamed,
            reply,
        })
        .await
    }

    /// Bans `identity`: every connection is removed and the game is told.
    pub async fn ban(&self, identity: Identity) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Ban { identity, reply }).await
    }

    /// Submits a chat message.
    ///
    /// # Errors
    /// [`RoomError::MessageBlocked`] if the game refused it.
    pub async fn chat(
        &self,
        identity: Identity,
        message: impl Into<String>,
    ) -> Result<(), RoomError> {
        let message = message.into();
        self.request(|reply| RoomCommand::Chat {
            identity,
            message,
            reply,
        })
        .await
    }

    /// Forwards a game command from the command router.
    pub async fn command(
        &self,
        identity: Identity,
        command: GameCommand,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Command {
            identity,
            command,
            reply,
        })
        .await
    }

    /// Puts a game in the room's slot.
    ///
    /// # Errors
    /// [`RoomError::GameInProgress`] if a game is already attached.
    pub async fn attach_game(
        &self,
        game: Box<dyn Activity>,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::AttachGame { game, reply })
            .await
    }

    /// Destroys the attached game and clears the slot.
    pub async fn destroy_game(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::DestroyGame { reply }).await
    }

    /// Requests the current room info.
    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Tells the room to shut down. An attached game is destroyed.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| self.unavailable())
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room: RoomKey,
    config: RoomConfig,
    slot: Arc<RoomSlot>,
    /// Connections present per identity. An identity is "in the room"
    /// while its list is non-empty.
    occupants: HashMap<IdentityKey, Vec<ConnectionId>>,
    game: Option<Box<dyn Activity>>,
    chat_log: VecDeque<String>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        tracing::info!(room = %self.room, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    identity,
                    connection,
                    reply,
                } => {
                    let _ = reply.send(self.handle_join(&identity, connection));
                }
                RoomCommand::Leave {
                    identity,
                    connection,
                    reply,
                } => {
                    let _ = reply.send(self.handle_leave(&identity, connection));
                }
                RoomCommand::UpdateConnection {
                    identity,
                    old_key,
                    connection,
                    reply,
                } => {
                    self.handle_update_connection(&identity, &old_key, connection);
                    let _ = reply.send(Ok(()));
                }
                RoomCommand::Rename {
                    identity,
                    old_key,
                    is_force_renamed,
                    reply,
                } => {
                    self.handle_rename(&identity, &old_key, is_force_renamed);
                    let _ = reply.send(Ok(()));
                }
                RoomCommand::Ban { identity, reply } => {
                    self.handle_ban(&identity);
                    let _ = reply.send(Ok(()));
                }
                RoomCommand::Chat {
                    identity,
                    message,
                    reply,
                } => {
                    let _ = reply.send(self.handle_chat(&identity, &message));
                }
                RoomCommand::Command {
                    identity,
                    command,
                    reply,
                } => {
                    let result = match &mut self.game {
                        Some(game) => game
                            .handle_command(&identity, command)
                            .map_err(RoomError::from),
                        None => Err(RoomError::NoGame(self.room.clone())),
                    };
                    let _ = reply.send(result);
                }
                RoomCommand::AttachGame { game, reply } => {
                    let _ = reply.send(self.handle_attach(game));
                }
                RoomCommand::DestroyGame { reply } => {
                    let result = if self.destroy_game() {
                        Ok(())
                    } else {
                        Err(RoomError::NoGame(self.room.clone()))
                    };
                    let _ = reply.send(result);
                }
                RoomCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(room = %self.room, "room shutting down");
                    self.destroy_game();
                    break;
                }
            }
        }

        tracing::info!(room = %self.room, "room actor stopped");
    }

    fn handle_join(
        &mut self,
        identity: &Identity,
        connection: ConnectionId,
    ) -> Result<(), RoomError> {
        let connections = self.occupants.entry(identity.key.clone()).or_default();
        if connections.contains(&connection) {
            return Err(RoomError::DuplicateConnection(connection));
        }
        let first = connections.is_empty();
        connections.push(connection);

        tracing::info!(
            room = %self.room,
            identity = %identity.key,
            %connection,
            occupants = self.occupants.len(),
            "connection joined"
        );

        if let Some(game) = &mut self.game {
            if first {
                game.on_join(identity, connection);
            }
            game.on_connect(identity, connection);
        }
        Ok(())
    }

    fn handle_leave(
        &mut self,
        identity: &Identity,
        connection: ConnectionId,
    ) -> Result<(), RoomError> {
        let connections = self.occupants.get_mut(&identity.key).ok_or_else(|| {
            RoomError::NotInRoom(identity.key.clone(), self.room.clone())
        })?;
        connections.retain(|c| *c != connection);
        if !connections.is_empty() {
            return Ok(());
        }

        self.occupants.remove(&identity.key);
        tracing::info!(room = %self.room, identity = %identity.key, "identity left");
        if let Some(game) = &mut self.game {
            game.on_leave(identity);
        }
        Ok(())
    }

    fn handle_update_connection(
        &mut self,
        identity: &Identity,
        old_key: &IdentityKey,
        connection: ConnectionId,
    ) {
        if let Some(connections) = self.occupants.get_mut(old_key) {
            connections.retain(|c| *c != connection);
            if connections.is_empty() {
                self.occupants.remove(old_key);
            }
        }
        let connections = self.occupants.entry(identity.key.clone()).or_default();
        if !connections.contains(&connection) {
            connections.push(connection);
        }

        tracing::debug!(
            room = %self.room,
            from = %old_key,
            to = %identity.key,
            %connection,
            "connection updated"
        );
        if let Some(game) = &mut self.game {
            game.on_update_connection(identity, connection);
        }
    }

    fn handle_rename(
        &mut self,
        identity: &Identity,
        old_key: &IdentityKey,
        is_force_renamed: bool,
    ) {
        if identity.key != *old_key {
            if let Some(connections) = self.occupants.remove(old_key) {
                self.occupants
                    .entry(identity.key.clone())
                    .or_default()
                    .extend(connections);
            }
            self.slot.rekey_role(old_key, &identity.key);
        }

        tracing::debug!(room = %self.room, from = %old_key, to = %identity.key, "identity renamed");
        if let Some(game) = &mut self.game {
            game.on_rename(identity, old_key, false, is_force_renamed);
        }
    }

    fn handle_ban(&mut self, identity: &Identity) {
        self.occupants.remove(&identity.key);
        self.slot.revoke(&identity.key);
        tracing::info!(room = %self.room, identity = %identity.key, "identity banned");
        if let Some(game) = &mut self.game {
            game.remove_banned_user(identity);
        }
    }

    fn handle_chat(
        &mut self,
        identity: &Identity,
        message: &str,
    ) -> Result<(), RoomError> {
        if !self.occupants.contains_key(&identity.key) {
            return Err(RoomError::NotInRoom(
                identity.key.clone(),
                self.room.clone(),
            ));
        }
        if let Some(game) = &mut self.game {
            if let Some(reason) = game.on_chat_message(message, identity) {
                tracing::debug!(
                    room = %self.room,
                    identity = %identity.key,
                    %reason,
                    "chat blocked"
                );
                return Err(RoomError::MessageBlocked(reason));
            }
        }

        self.chat_log
            .push_back(format!("{}: {message}", identity.display_name));
        while self.chat_log.len() > self.config.chat_log_limit {
            self.chat_log.pop_front();
        }

        if let Some(game) = &mut self.game {
            game.on_log_message(message, identity);
        }
        Ok(())
    }

    fn handle_attach(&mut self, game: Box<dyn Activity>) -> Result<(), RoomError> {
        if self.game.is_some() || self.slot.has_game() {
            return Err(RoomError::GameInProgress(self.room.clone()));
        }
        if game.room() != &self.room {
            return Err(RoomError::WrongRoom {
                expected: self.room.clone(),
                actual: game.room().clone(),
            });
        }
        tracing::info!(room = %self.room, kind = game.kind(), "game attached");
        self.slot.mark_attached();
        self.game = Some(game);
        Ok(())
    }

    /// Returns `false` if there was no game.
    fn destroy_game(&mut self) -> bool {
        match self.game.take() {
            Some(game) => {
                game.destroy();
                true
            }
            None => false,
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room: self.room.clone(),
            occupants: self.occupants.len(),
            game: self.game.as_ref().map(|game| GameSummary {
                kind: game.kind().to_owned(),
                title: game.title().to_owned(),
                state: game.state(),
                bound_players: game.bound_player_count(),
                players: game.player_names(),
            }),
            chat_log: self.chat_log.iter().cloned().collect(),
        }
    }
}

/// Spawns a new room actor task and returns a handle to communicate with it.
pub(crate) fn spawn_room(room: RoomKey, config: RoomConfig) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));
    let slot = Arc::new(RoomSlot::new(room.clone()));

    let actor = RoomActor {
        room: room.clone(),
        config,
        slot: Arc::clone(&slot),
        occupants: HashMap::new(),
        game: None,
        chat_log: VecDeque::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room,
        slot,
        sender: tx,
    }
}
