//! Configurable 1-to-1 mapping provider.
//!
//! Server admins list the mods the provider should handle in a JSON settings file
//! under the host's data directory:
//!
//! ```json
//! {
//!   "mods": {
//!     "examplemod": { "min_version": 1.0 },
//!     "minimap": {}
//!   }
//! }
//! ```
//!
//! Each requested permission `node` for mod `m` is granted (`+node`) when the player
//! holds `mod.m.node` or the wildcard `mod.m.*`, and denied (`-node`) otherwise.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info, warn};

use super::{MappingProvider, ModRegistry, ModTable};
use crate::container::{ModVersion, PermissionsContainer, signed, unsigned};
use crate::error::PermissionsError;
use crate::host::HostContext;
use crate::player::Player;

/// Default name of the settings file inside the host's data directory.
pub const DEFAULT_SETTINGS_FILE: &str = "generic_mappings.json";

/// Prefix of the permission nodes the generic provider checks.
pub const PERMISSION_NODE_PREFIX: &str = "mod";

/// On-disk settings of the generic provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenericSettings {
    /// Governed mods keyed by name.
    #[serde(default)]
    pub mods: BTreeMap<String, ModSettings>,
}

/// Settings for one governed mod.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModSettings {
    /// Minimum client version accepted on the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_version: Option<ModVersion>,
}

impl GenericSettings {
    fn from_table(mods: BTreeMap<String, Option<ModVersion>>) -> Self {
        Self {
            mods: mods
                .into_iter()
                .map(|(name, min_version)| (name, ModSettings { min_version }))
                .collect(),
        }
    }

    fn into_table(self) -> BTreeMap<String, Option<ModVersion>> {
        self.mods
            .into_iter()
            .map(|(name, settings)| (name, settings.min_version))
            .collect()
    }
}

/// Generic provider mapping `node` to the host permission `mod.<mod>.<node>`.
///
/// # Example
///
/// ```
/// use replicated_permissions::container::ModVersion;
/// use replicated_permissions::providers::{GenericMappingProvider, ModRegistry};
///
/// let provider = GenericMappingProvider::new();
/// provider.add_mod("examplemod");
/// provider.set_min_mod_version("examplemod", ModVersion::new(1.0));
/// assert_eq!(provider.mods(), vec!["examplemod".to_string()]);
/// ```
#[derive(Debug)]
pub struct GenericMappingProvider {
    mods: ModTable,
    settings_file: String,
    settings_path: RwLock<Option<PathBuf>>,
}

impl Default for GenericMappingProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl GenericMappingProvider {
    /// Create a provider using [`DEFAULT_SETTINGS_FILE`].
    pub fn new() -> Self {
        Self::with_settings_file(DEFAULT_SETTINGS_FILE)
    }

    /// Create a provider reading `file_name` from the host's data directory.
    pub fn with_settings_file(file_name: impl Into<String>) -> Self {
        Self {
            mods: ModTable::new(),
            settings_file: file_name.into(),
            settings_path: RwLock::new(None),
        }
    }

    /// Current settings, as they would be saved.
    pub fn settings(&self) -> GenericSettings {
        GenericSettings::from_table(self.mods.snapshot())
    }

    /// Load settings from `path`. A missing file yields empty settings.
    ///
    /// # Errors
    ///
    /// - [`PermissionsError::Io`] if the file exists but cannot be read
    /// - [`PermissionsError::Config`] if the file is not valid settings JSON
    pub fn load_settings(path: &Path) -> Result<Option<GenericSettings>, PermissionsError> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| PermissionsError::Config {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
    }

    /// Write the current settings to the file resolved during `init`.
    ///
    /// Does nothing if the provider has not been initialized.
    pub fn save(&self) -> Result<(), PermissionsError> {
        let path = self
            .settings_path
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let Some(path) = path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.settings())?;
        std::fs::write(&path, json)?;
        debug!(path = %path.display(), "Saved generic mapping settings");
        Ok(())
    }

    fn save_best_effort(&self) {
        if let Err(e) = self.save() {
            warn!(error = %e, "Failed to save generic mapping settings");
        }
    }

    fn node_for(mod_name: &str, permission: &str) -> String {
        format!("{PERMISSION_NODE_PREFIX}.{mod_name}.{permission}")
    }
}

impl ModRegistry for GenericMappingProvider {
    fn mod_table(&self) -> &ModTable {
        &self.mods
    }

    fn add_mod(&self, mod_name: &str) -> bool {
        let added = self.mods.add(mod_name);
        if added {
            self.save_best_effort();
        }
        added
    }

    fn remove_mod(&self, mod_name: &str) -> bool {
        let removed = self.mods.remove(mod_name);
        if removed {
            self.save_best_effort();
        }
        removed
    }

    fn set_min_mod_version(&self, mod_name: &str, version: ModVersion) -> bool {
        let updated = self.mods.set_min_version(mod_name, version);
        if updated {
            self.save_best_effort();
        }
        updated
    }
}

impl MappingProvider for GenericMappingProvider {
    fn name(&self) -> &str {
        "generic"
    }

    fn init(&self, host: &HostContext) -> Result<(), PermissionsError> {
        let path = host.data_file(&self.settings_file);

        // A file that fails to load is never adopted, so later saves cannot clobber it.
        let loaded = Self::load_settings(&path)?;
        *self
            .settings_path
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(path.clone());

        match loaded {
            Some(settings) => {
                self.mods.replace(settings.into_table());
                info!(
                    path = %path.display(),
                    mods = self.mods.names().len(),
                    "Loaded generic mapping settings"
                );
            }
            None => {
                info!(path = %path.display(), "No generic mapping settings found, writing defaults");
                self.save_best_effort();
            }
        }
        Ok(())
    }

    fn permissions(
        &self,
        _host: &HostContext,
        player: &dyn Player,
        query: &PermissionsContainer,
    ) -> Vec<String> {
        let mod_name = query.mod_name();
        let wildcard = player.has_permission(&Self::node_for(mod_name, "*"));

        query
            .permissions()
            .iter()
            .map(|requested| unsigned(requested))
            .filter(|permission| !permission.is_empty())
            .map(|permission| {
                let granted = wildcard || player.has_permission(&Self::node_for(mod_name, permission));
                signed(permission, granted)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockPlayer;

    fn query(version: f32, perms: &[&str]) -> PermissionsContainer {
        PermissionsContainer::new("examplemod", ModVersion::new(version), perms.iter().copied())
            .unwrap()
    }

    fn host(dir: &Path) -> HostContext {
        HostContext::new("test", dir)
    }

    #[test]
    fn test_grants_and_denies_per_node() {
        let provider = GenericMappingProvider::new();
        provider.add_mod("examplemod");
        let player = MockPlayer::new("alice").with_permission("mod.examplemod.fly");

        let mut perms = provider.permissions(
            &HostContext::new("test", "/tmp"),
            &player,
            &query(1.0, &["fly", "build"]),
        );
        perms.sort();
        assert_eq!(perms, vec!["+fly".to_string(), "-build".to_string()]);
    }

    #[test]
    fn test_wildcard_grants_everything() {
        let provider = GenericMappingProvider::new();
        provider.add_mod("examplemod");
        let player = MockPlayer::new("alice").with_permission("mod.examplemod.*");

        let mut perms = provider.permissions(
            &HostContext::new("test", "/tmp"),
            &player,
            &query(1.0, &["fly", "build"]),
        );
        perms.sort();
        assert_eq!(perms, vec!["+build".to_string(), "+fly".to_string()]);
    }

    #[test]
    fn test_requested_signs_are_ignored() {
        let provider = GenericMappingProvider::new();
        provider.add_mod("examplemod");
        let player = MockPlayer::new("alice");

        let perms = provider.permissions(
            &HostContext::new("test", "/tmp"),
            &player,
            &query(1.0, &["+fly"]),
        );
        assert_eq!(perms, vec!["-fly".to_string()]);
    }

    #[test]
    fn test_version_gate_uses_minimum() {
        let provider = GenericMappingProvider::new();
        provider.add_mod("examplemod");
        provider.set_min_mod_version("examplemod", ModVersion::new(1.0));
        let player = MockPlayer::new("alice");
        let host = HostContext::new("test", "/tmp");

        assert!(!provider.check_version(&host, &player, &query(0.9, &[])));
        assert!(provider.check_version(&host, &player, &query(1.2, &[])));
    }

    #[test]
    fn test_init_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let provider = GenericMappingProvider::new();
        provider.init(&host(dir.path())).unwrap();

        let path = dir.path().join(DEFAULT_SETTINGS_FILE);
        assert!(path.exists());
        let loaded = GenericMappingProvider::load_settings(&path).unwrap().unwrap();
        assert!(loaded.mods.is_empty());
    }

    #[test]
    fn test_admin_changes_persist_across_init() {
        let dir = tempfile::tempdir().unwrap();
        let first = GenericMappingProvider::new();
        first.init(&host(dir.path())).unwrap();
        first.add_mod("examplemod");
        first.set_min_mod_version("examplemod", ModVersion::new(1.5));
        first.add_mod("minimap");

        let second = GenericMappingProvider::new();
        second.init(&host(dir.path())).unwrap();
        assert_eq!(
            second.mods(),
            vec!["examplemod".to_string(), "minimap".to_string()]
        );
        assert_eq!(
            second.min_mod_version("examplemod"),
            Some(ModVersion::new(1.5))
        );
        assert_eq!(second.min_mod_version("minimap"), None);
    }

    #[test]
    fn test_init_reads_existing_settings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("custom.json"),
            r#"{ "mods": { "examplemod": { "min_version": 2.0 } } }"#,
        )
        .unwrap();

        let provider = GenericMappingProvider::with_settings_file("custom.json");
        provider.init(&host(dir.path())).unwrap();
        assert_eq!(
            provider.min_mod_version("examplemod"),
            Some(ModVersion::new(2.0))
        );
    }

    #[test]
    fn test_init_rejects_malformed_settings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_SETTINGS_FILE), "not json").unwrap();

        let provider = GenericMappingProvider::new();
        let err = provider.init(&host(dir.path())).unwrap_err();
        assert!(matches!(err, PermissionsError::Config { .. }));
    }

    #[test]
    fn test_malformed_settings_survive_admin_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_SETTINGS_FILE);
        std::fs::write(&path, "not json").unwrap();

        let provider = GenericMappingProvider::new();
        assert!(provider.init(&host(dir.path())).is_err());

        assert!(provider.add_mod("x"));
        provider.set_min_mod_version("x", ModVersion::new(1.0));
        provider.remove_mod("x");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "not json");
    }

    #[test]
    fn test_save_before_init_is_noop() {
        let provider = GenericMappingProvider::new();
        provider.add_mod("examplemod");
        assert!(provider.save().is_ok());
    }
}
