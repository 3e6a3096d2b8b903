//! The player registry: who is online right now.
//!
//! This is the one piece of state connections share. It answers two
//! questions at login (is there room, and is this player already here?) and
//! feeds the online count into the server-list status.
//!
//! # Concurrency note
//!
//! `PlayerRegistry` is a plain `HashMap` with no locking of its own. The
//! server wraps it in a [`SharedRegistry`] and holds the lock only for the
//! duration of a single call, never across an `.await` on the network.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{PlayerIdentity, RegistryError};

/// A registry shared between connection tasks.
pub type SharedRegistry = Arc<Mutex<PlayerRegistry>>;

/// Tracks online players by UUID.
#[derive(Debug)]
pub struct PlayerRegistry {
    /// UUID → username of everyone currently in play.
    online: HashMap<Uuid, String>,
    max_players: usize,
}

impl PlayerRegistry {
    pub fn new(max_players: usize) -> Self {
        Self {
            online: HashMap::new(),
            max_players,
        }
    }

    /// Convenience for `Arc::new(Mutex::new(PlayerRegistry::new(max)))`.
    pub fn shared(max_players: usize) -> SharedRegistry {
        Arc::new(Mutex::new(Self::new(max_players)))
    }

    /// Admits a freshly authenticated player.
    ///
    /// # Errors
    /// - [`RegistryError::AlreadyOnline`]: the UUID is already registered
    /// - [`RegistryError::ServerFull`]: `max_players` reached
    pub fn register(&mut self, identity: &PlayerIdentity) -> Result<(), RegistryError> {
        let uuid = identity.uuid();
        if self.online.contains_key(&uuid) {
            return Err(RegistryError::AlreadyOnline(uuid));
        }
        if self.online.len() >= self.max_players {
            return Err(RegistryError::ServerFull {
                max: self.max_players,
            });
        }

        self.online.insert(uuid, identity.username().to_string());
        tracing::info!(
            %uuid,
            username = identity.username(),
            online = self.online.len(),
            "player registered"
        );
        Ok(())
    }

    /// Removes a player. Returns `false` if they were not registered.
    pub fn release(&mut self, uuid: Uuid) -> bool {
        let removed = self.online.remove(&uuid).is_some();
        if removed {
            tracing::info!(%uuid, online = self.online.len(), "player released");
        }
        removed
    }

    pub fn contains(&self, uuid: &Uuid) -> bool {
        self.online.contains_key(uuid)
    }

    /// Username of an online player.
    pub fn username(&self, uuid: &Uuid) -> Option<&str> {
        self.online.get(uuid).map(String::as_str)
    }

    pub fn online_count(&self) -> usize {
        self.online.len()
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }
}

// =========================================================================
// Tests
// =========================================================================
