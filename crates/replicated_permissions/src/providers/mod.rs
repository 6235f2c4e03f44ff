//! Mapping providers and the ordered provider chain
//!
//! In the replicated permissions model a client mod asks for permissions by name and
//! a *mapping provider* translates that request into authoritative, signed
//! permission strings. A provider also decides whether the client's mod version is
//! recent enough to be allowed on the server.
//!
//! This module defines the traits providers implement:
//!
//! - [`ModRegistry`] - Admin-facing management of which mods a provider governs
//! - [`MappingProvider`] - Version check and permission lookup on the query path
//!
//! plus [`ProviderChain`], the ordered collection the gate and replicator walk,
//! and [`GenericMappingProvider`], a configurable 1-to-1 mapper that covers most
//! mods without custom code.
//!
//! # Example
//!
//! ```
//! use replicated_permissions::container::PermissionsContainer;
//! use replicated_permissions::error::PermissionsError;
//! use replicated_permissions::host::HostContext;
//! use replicated_permissions::player::Player;
//! use replicated_permissions::providers::{MappingProvider, ModRegistry, ModTable, ProviderChain};
//! use std::sync::Arc;
//!
//! /// Grants every requested permission for the mods it governs.
//! #[derive(Default)]
//! struct Permissive {
//!     mods: ModTable,
//! }
//!
//! impl ModRegistry for Permissive {
//!     fn mod_table(&self) -> &ModTable {
//!         &self.mods
//!     }
//! }
//!
//! impl MappingProvider for Permissive {
//!     fn init(&self, _host: &HostContext) -> Result<(), PermissionsError> {
//!         self.add_mod("examplemod");
//!         Ok(())
//!     }
//!
//!     fn permissions(
//!         &self,
//!         _host: &HostContext,
//!         _player: &dyn Player,
//!         query: &PermissionsContainer,
//!     ) -> Vec<String> {
//!         query.permissions().iter().map(|p| format!("+{p}")).collect()
//!     }
//! }
//!
//! let mut chain = ProviderChain::new();
//! chain.register(Arc::new(Permissive::default()));
//! assert_eq!(chain.len(), 1);
//! ```

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::container::{ModVersion, PermissionsContainer};
use crate::error::PermissionsError;
use crate::host::HostContext;
use crate::player::Player;

mod chain;
mod generic;

pub use chain::ProviderChain;
pub use generic::{GenericMappingProvider, GenericSettings, ModSettings};

/// Table of governed mods and their minimum versions.
///
/// Shared building block for [`ModRegistry`] implementations. A mod with no
/// minimum version is governed but never rejected on version grounds.
#[derive(Debug, Default)]
pub struct ModTable {
    mods: RwLock<BTreeMap<String, Option<ModVersion>>>,
}

impl ModTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table pre-populated with `mods`.
    pub fn with_mods<I, S>(mods: I) -> Self
    where
        I: IntoIterator<Item = (S, Option<ModVersion>)>,
        S: Into<String>,
    {
        Self {
            mods: RwLock::new(mods.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    /// Whether `mod_name` is governed.
    pub fn contains(&self, mod_name: &str) -> bool {
        self.read().contains_key(mod_name)
    }

    /// Snapshot of all governed mods and their minimum versions.
    pub fn snapshot(&self) -> BTreeMap<String, Option<ModVersion>> {
        self.read().clone()
    }

    /// Replace the whole table.
    pub fn replace(&self, mods: BTreeMap<String, Option<ModVersion>>) {
        *self.write() = mods;
    }

    /// Start governing `mod_name`. Returns `false` if it was already governed.
    pub fn add(&self, mod_name: &str) -> bool {
        let mut mods = self.write();
        if mods.contains_key(mod_name) {
            return false;
        }
        mods.insert(mod_name.to_string(), None);
        true
    }

    /// Stop governing `mod_name`. Returns `false` if it was not governed.
    pub fn remove(&self, mod_name: &str) -> bool {
        self.write().remove(mod_name).is_some()
    }

    /// Set the minimum accepted version. Returns `false` if the mod is not governed.
    pub fn set_min_version(&self, mod_name: &str, version: ModVersion) -> bool {
        match self.write().get_mut(mod_name) {
            Some(min) => {
                *min = Some(version);
                true
            }
            None => false,
        }
    }

    /// Minimum accepted version, if the mod is governed and has one.
    pub fn min_version(&self, mod_name: &str) -> Option<ModVersion> {
        self.read().get(mod_name).copied().flatten()
    }

    /// Names of all governed mods, sorted.
    pub fn names(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Option<ModVersion>>> {
        self.mods.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Option<ModVersion>>> {
        self.mods.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Admin-facing management surface of a provider.
///
/// Every method defaults to the provider's [`ModTable`]. Providers that persist
/// their configuration override the mutators, update the table, and save.
pub trait ModRegistry: Send + Sync {
    /// Backing table of governed mods.
    fn mod_table(&self) -> &ModTable;

    /// Start governing `mod_name`. Returns `false` if it was already governed.
    fn add_mod(&self, mod_name: &str) -> bool {
        self.mod_table().add(mod_name)
    }

    /// Stop governing `mod_name`. Returns `false` if it was not governed.
    fn remove_mod(&self, mod_name: &str) -> bool {
        self.mod_table().remove(mod_name)
    }

    /// Set the minimum accepted version. Returns `false` if the mod is not governed.
    fn set_min_mod_version(&self, mod_name: &str, version: ModVersion) -> bool {
        self.mod_table().set_min_version(mod_name, version)
    }

    /// Minimum accepted version, if the mod is governed and has one.
    fn min_mod_version(&self, mod_name: &str) -> Option<ModVersion> {
        self.mod_table().min_version(mod_name)
    }

    /// Names of all governed mods, sorted.
    fn mods(&self) -> Vec<String> {
        self.mod_table().names()
    }
}

/// A pluggable unit that maps client mod queries to server permissions.
///
/// The defaults for [`provides_mappings_for`](MappingProvider::provides_mappings_for)
/// and [`check_version`](MappingProvider::check_version) consult the provider's
/// [`ModTable`], which is what almost every provider wants.
///
/// # Thread Safety
///
/// Providers are shared across concurrent queries (`Send + Sync`). Query-path
/// methods take `&self`.
pub trait MappingProvider: ModRegistry {
    /// Name used in log messages.
    fn name(&self) -> &str {
        "provider"
    }

    /// One-time setup, e.g. loading settings from the host's data directory.
    ///
    /// # Errors
    ///
    /// Any error is logged by [`ProviderChain::init_all`], which then continues
    /// with the remaining providers.
    fn init(&self, host: &HostContext) -> Result<(), PermissionsError>;

    /// Whether this provider recognizes `query.mod_name()`.
    fn provides_mappings_for(&self, query: &PermissionsContainer) -> bool {
        self.mod_table().contains(query.mod_name())
    }

    /// `false` only when this provider governs the mod and the client's version is
    /// below the configured minimum. Ungoverned mods always pass.
    fn check_version(
        &self,
        _host: &HostContext,
        _player: &dyn Player,
        query: &PermissionsContainer,
    ) -> bool {
        match self.min_mod_version(query.mod_name()) {
            Some(min) => query.mod_version().meets(min),
            None => true,
        }
    }

    /// Signed permission strings (`+node` granted, `-node` denied) for `query`.
    ///
    /// Only called when [`provides_mappings_for`](MappingProvider::provides_mappings_for)
    /// returned `true`.
    fn permissions(
        &self,
        host: &HostContext,
        player: &dyn Player,
        query: &PermissionsContainer,
    ) -> Vec<String>;
}
