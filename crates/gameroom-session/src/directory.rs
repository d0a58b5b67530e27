//! The identity directory: an in-memory registry of live identities.
//!
//! It's responsible for:
//! - Opening connections for guests and named users
//! - Renaming identities, or merging a connection into an existing one
//! - Dropping identities when their last connection closes
//! - Implementing [`IdentityRegistry`] for the game layer
//!
//! # Concurrency note
//!
//! The directory is shared by every room, so its state sits behind a
//! `Mutex`. The lock is only ever held for the duration of one method
//! call and never across a call into game code, so there is no
//! re-entrancy to worry about.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use gameroom_protocol::{ConnectionId, IdentityKey, Payload, RoomKey};
use rand::Rng;

use crate::identity::Entry;
use crate::{
    Delivery, Departure, DirectoryConfig, Identity, IdentityRegistry, Rename,
    SessionError,
};

/// Tracks every live identity and the connections attached to it.
///
/// ## Lifecycle
///
/// ```text
/// connect_guest() ──→ rename() ──→ [named identity] ──→ disconnect()
///                        │                                   │
///                        ▼ (key already live)                ▼ (last connection)
///                     merge into existing             identity dropped
/// ```
pub struct IdentityDirectory {
    inner: Mutex<Inner>,
    config: DirectoryConfig,
}

#[derive(Default)]
struct Inner {
    identities: HashMap<IdentityKey, Entry>,
    /// Index from connection to owning identity. Kept in sync with
    /// `Entry::connections`.
    connections: HashMap<ConnectionId, IdentityKey>,
    next_connection: u64,
    search_refreshes: HashMap<IdentityKey, u32>,
    deliveries: Vec<Delivery>,
}

impl IdentityDirectory {
    /// Creates an empty directory.
    pub fn new(config: DirectoryConfig) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            config,
        }
    }

    /// A poisoned lock only means another thread panicked mid-call; the
    /// maps themselves are still consistent, so keep going.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens a connection for a brand-new guest identity.
    ///
    /// Guests get a random six-digit suffix (`Guest 482913` →
    /// `guest482913`) and `is_named == false`.
    pub fn connect_guest(&self) -> (ConnectionId, Identity) {
        let mut inner = self.lock();
        let mut rng = rand::rng();

        let (key, display_name) = loop {
            let suffix: u32 = rng.random_range(100_000..1_000_000);
            let name = format!("{} {suffix}", self.config.guest_prefix);
            // The digits always survive normalization, so this can't be empty.
            let key = IdentityKey::from_name(&name)
                .unwrap_or_else(|_| IdentityKey::new(suffix.to_string()));
            if !inner.identities.contains_key(&key) {
                break (key, name);
            }
        };

        let identity = Identity {
            key,
            display_name,
            active_game_keys: BTreeSet::new(),
            is_named: false,
        };
        let connection = inner.open(identity.clone());
        tracing::info!(%connection, identity = %identity.key, "guest connected");
        (connection, identity)
    }

    /// Opens a connection for a named identity.
    ///
    /// If the identity is already live the connection joins it (a merge);
    /// otherwise a new identity is created.
    ///
    /// # Errors
    /// [`SessionError::InvalidName`] if the name has no usable characters.
    pub fn connect_named(
        &self,
        name: &str,
    ) -> Result<(ConnectionId, Identity), SessionError> {
        let key = IdentityKey::from_name(name)?;
        let mut inner = self.lock();

        if inner.identities.contains_key(&key) {
            let connection = inner.allocate_connection();
            inner.attach(connection, &key);
            let identity = inner.snapshot(&key)?;
            tracing::info!(%connection, identity = %key, "connection joined existing identity");
            return Ok((connection, identity));
        }

        let identity = Identity {
            key,
            display_name: name.to_owned(),
            active_game_keys: BTreeSet::new(),
            is_named: true,
        };
        let connection = inner.open(identity.clone());
        tracing::info!(%connection, identity = %identity.key, "named identity connected");
        Ok((connection, identity))
    }

    /// Renames the identity behind `connection`.
    ///
    /// - Same key (only case or punctuation changed): the display name is
    ///   updated in place.
    /// - New, unused key: the whole identity is re-keyed, keeping its
    ///   connections and active games.
    /// - Key owned by another live identity: this one connection merges
    ///   into it. The old identity is dropped once it has no connections
    ///   left. Its active games stay behind: the merge target never held
    ///   those seats, so it doesn't play in those games.
    ///
    /// # Errors
    /// - [`SessionError::UnknownConnection`] — connection not open
    /// - [`SessionError::InvalidName`] — name has no usable characters
    pub fn rename(
        &self,
        connection: ConnectionId,
        new_name: &str,
    ) -> Result<Rename, SessionError> {
        let new_key = IdentityKey::from_name(new_name)?;
        let mut inner = self.lock();
        let old_key = inner
            .connections
            .get(&connection)
            .cloned()
            .ok_or(SessionError::UnknownConnection(connection))?;

        if new_key == old_key || !inner.identities.contains_key(&new_key) {
            let identity = inner.rekey(&old_key, new_key, new_name)?;
            tracing::info!(%connection, from = %old_key, to = %identity.key, "identity renamed");
            return Ok(Rename {
                identity,
                old_key,
                merged: false,
            });
        }

        // Merge: move this connection over to the existing identity.
        inner.detach(connection, &old_key);
        inner.attach(connection, &new_key);
        if inner
            .identities
            .get(&old_key)
            .is_some_and(|entry| entry.connections.is_empty())
        {
            inner.identities.remove(&old_key);
        }
        let identity = inner.snapshot(&new_key)?;
        tracing::info!(%connection, from = %old_key, to = %new_key, "connection merged");
        Ok(Rename {
            identity,
            old_key,
            merged: true,
        })
    }

    /// Renames a whole identity on an administrator's behalf.
    ///
    /// # Errors
    /// - [`SessionError::NotFound`] — no live identity with `key`
    /// - [`SessionError::NameTaken`] — the new key belongs to someone else
    /// - [`SessionError::InvalidName`] — name has no usable characters
    pub fn force_rename(
        &self,
        key: &IdentityKey,
        new_name: &str,
    ) -> Result<Rename, SessionError> {
        let new_key = IdentityKey::from_name(new_name)?;
        let mut inner = self.lock();
        if !inner.identities.contains_key(key) {
            return Err(SessionError::NotFound(key.clone()));
        }
        if &new_key != key && inner.identities.contains_key(&new_key) {
            return Err(SessionError::NameTaken(new_key));
        }
        let identity = inner.rekey(key, new_key, new_name)?;
        tracing::info!(from = %key, to = %identity.key, "identity force-renamed");
        Ok(Rename {
            identity,
            old_key: key.clone(),
            merged: false,
        })
    }

    /// Closes a connection.
    ///
    /// # Errors
    /// [`SessionError::UnknownConnection`] if the connection isn't open.
    pub fn disconnect(
        &self,
        connection: ConnectionId,
    ) -> Result<Departure, SessionError> {
        let mut inner = self.lock();
        let key = inner
            .connections
            .get(&connection)
            .cloned()
            .ok_or(SessionError::UnknownConnection(connection))?;

        inner.detach(connection, &key);
        let identity = inner.snapshot(&key)?;
        let was_last = inner
            .identities
            .get(&key)
            .is_some_and(|entry| entry.connections.is_empty());
        if was_last {
            inner.identities.remove(&key);
            tracing::info!(%connection, identity = %key, "identity went offline");
        } else {
            tracing::debug!(%connection, identity = %key, "connection closed");
        }
        Ok(Departure { identity, was_last })
    }

    /// Returns the key of the identity that owns `connection`.
    pub fn identity_of(&self, connection: ConnectionId) -> Option<IdentityKey> {
        self.lock().connections.get(&connection).cloned()
    }

    /// Returns the open connections of an identity (empty if offline).
    pub fn connections_of(&self, key: &IdentityKey) -> Vec<ConnectionId> {
        self.lock()
            .identities
            .get(key)
            .map(|entry| entry.connections.clone())
            .unwrap_or_default()
    }

    /// How many times the search index was refreshed for `key`.
    pub fn search_index_refreshes(&self, key: &IdentityKey) -> u32 {
        self.lock().search_refreshes.get(key).copied().unwrap_or(0)
    }

    /// Drains every payload accepted for delivery so far.
    pub fn take_deliveries(&self) -> Vec<Delivery> {
        std::mem::take(&mut self.lock().deliveries)
    }

    /// Returns the number of live identities.
    pub fn len(&self) -> usize {
        self.lock().identities.len()
    }

    /// Returns `true` if nobody is online.
    pub fn is_empty(&self) -> bool {
        self.lock().identities.is_empty()
    }
}

impl Default for IdentityDirectory {
    fn default() -> Self {
        Self::new(DirectoryConfig::default())
    }
}

impl Inner {
    fn allocate_connection(&mut self) -> ConnectionId {
        self.next_connection += 1;
        ConnectionId(self.next_connection)
    }

    /// Registers a new identity with a single fresh connection.
    fn open(&mut self, identity: Identity) -> ConnectionId {
        let connection = self.allocate_connection();
        let key = identity.key.clone();
        self.identities.insert(
            key.clone(),
            Entry {
                identity,
                connections: vec![connection],
            },
        );
        self.connections.insert(connection, key);
        connection
    }

    fn attach(&mut self, connection: ConnectionId, key: &IdentityKey) {
        if let Some(entry) = self.identities.get_mut(key) {
            entry.connections.push(connection);
            self.connections.insert(connection, key.clone());
        }
    }

    fn detach(&mut self, connection: ConnectionId, key: &IdentityKey) {
        self.connections.remove(&connection);
        if let Some(entry) = self.identities.get_mut(key) {
            entry.connections.retain(|c| *c != connection);
        }
    }

    fn snapshot(&self, key: &IdentityKey) -> Result<Identity, SessionError> {
        self.identities
            .get(key)
            .map(|entry| entry.identity.clone())
            .ok_or_else(|| SessionError::NotFound(key.clone()))
    }

    /// Moves an identity (with all its connections) to `new_key`.
    /// The caller has already checked that `new_key` is free or equal.
    fn rekey(
        &mut self,
        old_key: &IdentityKey,
        new_key: IdentityKey,
        new_name: &str,
    ) -> Result<Identity, SessionError> {
        let mut entry = self
            .identities
            .remove(old_key)
            .ok_or_else(|| SessionError::NotFound(old_key.clone()))?;
        entry.identity.key = new_key.clone();
        entry.identity.display_name = new_name.to_owned();
        entry.identity.is_named = true;
        for connection in &entry.connections {
            self.connections.insert(*connection, new_key.clone());
        }
        let identity = entry.identity.clone();
        self.identities.insert(new_key, entry);
        Ok(identity)
    }
}

impl IdentityRegistry for IdentityDirectory {
    fn resolve(&self, key: &IdentityKey) -> Option<Identity> {
        self.lock()
            .identities
            .get(key)
            .map(|entry| entry.identity.clone())
    }

    fn register_game(&self, key: &IdentityKey, room: &RoomKey) -> bool {
        match self.lock().identities.get_mut(key) {
            Some(entry) => {
                entry.identity.active_game_keys.insert(room.clone());
                true
            }
            None => false,
        }
    }

    fn deregister_game(&self, key: &IdentityKey, room: &RoomKey) -> bool {
        match self.lock().identities.get_mut(key) {
            Some(entry) => {
                entry.identity.active_game_keys.remove(room);
                true
            }
            None => false,
        }
    }

    fn refresh_search_index(&self, key: &IdentityKey) {
        let mut inner = self.lock();
        if inner.identities.contains_key(key) {
            *inner.search_refreshes.entry(key.clone()).or_insert(0) += 1;
        }
    }

    fn send_direct(&self, key: &IdentityKey, payload: Payload) -> bool {
        let mut inner = self.lock();
        if !inner.identities.contains_key(key) {
            return false;
        }
        inner.deliveries.push(Delivery {
            to: key.clone(),
            room: None,
            payload,
        });
        true
    }

    fn send_to_room(
        &self,
        key: &IdentityKey,
        room: &RoomKey,
        payload: Payload,
    ) -> bool {
        let mut inner = self.lock();
        if !inner.identities.contains_key(key) {
            return false;
        }
        inner.deliveries.push(Delivery {
            to: key.clone(),
            room: Some(room.clone()),
            payload,
        });
        true
    }
}

// =========================================================================
// Tests
// =========================================================================
