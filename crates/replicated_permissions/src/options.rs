//! Configuration options and builder for the permissions manager
//!
//! This module provides [`ReplicationOptions`] for configuring where the manager
//! keeps its data, whether the mod history is persisted, and what a rejected
//! player is told.
//!
//! # Example
//!
//! ```
//! use replicated_permissions::options::ReplicationOptions;
//!
//! let options = ReplicationOptions::builder()
//!     .plugin_name("ClientPermissions")
//!     .data_dir("plugins/ClientPermissions")
//!     .kick_message("Please update your client mods")
//!     .build();
//!
//! assert_eq!(options.plugin_name, "ClientPermissions");
//! ```
//!
//! # Builder Pattern
//!
//! All fields have sensible defaults. Disable history persistence for tests or
//! ephemeral servers:
//!
//! ```
//! use replicated_permissions::options::ReplicationOptions;
//!
//! let options = ReplicationOptions::builder().history_file(None).build();
//! assert!(options.history_path().is_none());
//! ```

use std::path::PathBuf;

use crate::host::HostContext;
use crate::monitor::DEFAULT_HISTORY_FILE;

/// Default plugin name reported to providers.
pub const DEFAULT_PLUGIN_NAME: &str = "ReplicatedPermissions";

/// Default message shown to players rejected by the version gate.
pub const DEFAULT_KICK_MESSAGE: &str =
    "Your client mod is out of date. Please update it to play on this server.";

/// Options for a [`PermissionsManager`](crate::replication::PermissionsManager).
#[derive(Debug, Clone)]
pub struct ReplicationOptions {
    /// Name of the hosting plugin, forwarded to providers
    pub plugin_name: String,
    /// Directory holding provider settings and the mod history
    pub data_dir: PathBuf,
    /// History file name inside `data_dir`; `None` keeps history in memory only
    pub history_file: Option<String>,
    /// Message passed to [`Player::kick`](crate::player::Player::kick) on rejection
    pub kick_message: String,
}

impl Default for ReplicationOptions {
    fn default() -> Self {
        Self {
            plugin_name: DEFAULT_PLUGIN_NAME.to_string(),
            data_dir: PathBuf::from("plugins").join(DEFAULT_PLUGIN_NAME),
            history_file: Some(DEFAULT_HISTORY_FILE.to_string()),
            kick_message: DEFAULT_KICK_MESSAGE.to_string(),
        }
    }
}

impl ReplicationOptions {
    /// Create a new options builder
    pub fn builder() -> ReplicationOptionsBuilder {
        ReplicationOptionsBuilder::default()
    }

    /// Host context handed to mapping providers.
    pub fn host_context(&self) -> HostContext {
        HostContext::new(self.plugin_name.clone(), self.data_dir.clone())
    }

    /// Full path of the history file, if history is persisted.
    pub fn history_path(&self) -> Option<PathBuf> {
        self.history_file
            .as_ref()
            .map(|file| self.data_dir.join(file))
    }
}

/// Builder for [`ReplicationOptions`]
#[derive(Debug, Default)]
pub struct ReplicationOptionsBuilder {
    inner: ReplicationOptions,
}

impl ReplicationOptionsBuilder {
    /// Set the plugin name
    pub fn plugin_name(mut self, name: impl Into<String>) -> Self {
        self.inner.plugin_name = name.into();
        self
    }

    /// Set the data directory
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.inner.data_dir = dir.into();
        self
    }

    /// Set the history file name, or `None` to keep history in memory
    pub fn history_file(mut self, file: Option<String>) -> Self {
        self.inner.history_file = file;
        self
    }

    /// Set the message shown to rejected players
    pub fn kick_message(mut self, message: impl Into<String>) -> Self {
        self.inner.kick_message = message.into();
        self
    }

    /// Build the options
    pub fn build(self) -> ReplicationOptions {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_default() {
        let opts = ReplicationOptions::builder().build();
        assert_eq!(opts.plugin_name, DEFAULT_PLUGIN_NAME);
        assert_eq!(opts.data_dir, PathBuf::from("plugins/ReplicatedPermissions"));
        assert_eq!(opts.history_file.as_deref(), Some(DEFAULT_HISTORY_FILE));
        assert_eq!(opts.kick_message, DEFAULT_KICK_MESSAGE);
    }

    #[test]
    fn test_builder_chaining() {
        let opts = ReplicationOptions::builder()
            .plugin_name("Perms")
            .data_dir("/srv/perms")
            .history_file(Some("history.json".to_string()))
            .kick_message("update please")
            .build();

        assert_eq!(opts.plugin_name, "Perms");
        assert_eq!(opts.history_path(), Some(PathBuf::from("/srv/perms/history.json")));
        assert_eq!(opts.kick_message, "update please");
    }

    #[test]
    fn test_host_context_mirrors_options() {
        let opts = ReplicationOptions::builder()
            .plugin_name("Perms")
            .data_dir("/srv/perms")
            .build();
        let host = opts.host_context();
        assert_eq!(host.plugin_name(), "Perms");
        assert_eq!(host.data_dir(), std::path::Path::new("/srv/perms"));
    }

    #[test]
    fn test_history_disabled() {
        let opts = ReplicationOptions::builder().history_file(None).build();
        assert!(opts.history_path().is_none());
    }
}
