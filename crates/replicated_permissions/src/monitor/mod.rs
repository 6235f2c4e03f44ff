//! Bookkeeping of inbound queries
//!
//! [`QueryMonitor`] keeps two kinds of records:
//!
//! - **Sessions** - For each connected player, the latest query received per mod.
//!   Created when the player registers the channel, dropped on disconnect. The
//!   cache lets admins see which mods a player runs and lets the server re-send
//!   replies on refresh.
//! - **History** - For each (mod, version) the permission set first seen from any
//!   client, kept in a [`ModInfoStore`] as a quick reference for admins.
//!
//! Monitoring is best-effort. Nothing here can fail the gating or replication
//! path: persistence errors are logged and dropped.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::container::{ModVersion, PermissionsContainer};
use crate::player::{Player, PlayerId};

mod store;

pub use store::{DEFAULT_HISTORY_FILE, ModInfoStore};

/// Per-player query cache plus the mod version history.
///
/// Session state lives in a sharded [`DashMap`], so connect, disconnect and query
/// events for different players do not block each other.
#[derive(Debug)]
pub struct QueryMonitor {
    sessions: DashMap<PlayerId, HashMap<String, PermissionsContainer>>,
    history: ModInfoStore,
}

impl Default for QueryMonitor {
    fn default() -> Self {
        Self::new(ModInfoStore::in_memory())
    }
}

impl QueryMonitor {
    /// Create a monitor recording history into `history`.
    pub fn new(history: ModInfoStore) -> Self {
        Self {
            sessions: DashMap::new(),
            history,
        }
    }

    /// Start a fresh session for `player`, discarding any previous one.
    pub fn add_player(&self, player: &dyn Player) {
        debug!(player = player.name(), "Player registered permissions channel");
        self.sessions.insert(player.id(), HashMap::new());
    }

    /// Drop the session of `player_id`.
    pub fn remove_player(&self, player_id: PlayerId) {
        if self.sessions.remove(&player_id).is_some() {
            debug!(%player_id, "Removed player session");
        }
    }

    /// Record `query` as the latest for its mod and update the history.
    ///
    /// A query from an unregistered player is logged and the player registered on
    /// the spot.
    pub fn on_query(&self, player: &dyn Player, query: &PermissionsContainer) {
        match self.sessions.entry(player.id()) {
            Entry::Occupied(mut session) => {
                session
                    .get_mut()
                    .insert(query.mod_name().to_string(), query.clone());
            }
            Entry::Vacant(slot) => {
                warn!(player = player.name(), "Received query from unregistered player");
                slot.insert(HashMap::from([(
                    query.mod_name().to_string(),
                    query.clone(),
                )]));
            }
        }

        if query.permissions().is_empty() {
            return;
        }

        let version_key = query.mod_version().version_key();
        let permissions: Vec<String> = query.permissions().iter().cloned().collect();
        if self
            .history
            .record_if_absent(query.mod_name(), &version_key, permissions)
        {
            debug!(mod_name = query.mod_name(), version_key = %version_key, "Recorded new mod version");
            if let Err(e) = self.history.persist() {
                debug!(error = %e, "Failed to persist mod history");
            }
        }
    }

    /// Latest query from `player_id` for `mod_name`.
    pub fn latest_query(&self, player_id: PlayerId, mod_name: &str) -> Option<PermissionsContainer> {
        self.sessions
            .get(&player_id)
            .and_then(|session| session.get(mod_name).cloned())
    }

    /// Latest query per mod from `player_id`, sorted by mod name.
    pub fn latest_queries(&self, player_id: PlayerId) -> Vec<PermissionsContainer> {
        let mut queries: Vec<PermissionsContainer> = self
            .sessions
            .get(&player_id)
            .map(|session| session.values().cloned().collect())
            .unwrap_or_default();
        queries.sort_by(|a, b| a.mod_name().cmp(b.mod_name()));
        queries
    }

    /// Whether `player_id` has an open session.
    pub fn is_registered(&self, player_id: PlayerId) -> bool {
        self.sessions.contains_key(&player_id)
    }

    /// Number of open sessions.
    pub fn player_count(&self) -> usize {
        self.sessions.len()
    }

    /// Permissions first recorded for `mod_name` at `version`.
    pub fn history(&self, mod_name: &str, version: ModVersion) -> Option<Vec<String>> {
        self.history.get(mod_name, &version.version_key())
    }

    /// The underlying history store.
    pub fn history_store(&self) -> &ModInfoStore {
        &self.history
    }
}
