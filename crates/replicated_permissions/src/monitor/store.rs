//! First-write-wins history of permissions seen per mod version.
//!
//! Persisted as JSON shaped like:
//!
//! ```json
//! {
//!   "mods": {
//!     "examplemod": {
//!       "1_200": { "permissions": ["build", "fly"] }
//!     }
//!   }
//! }
//! ```

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

use crate::error::PermissionsError;

/// Default name of the history file inside the data directory.
pub const DEFAULT_HISTORY_FILE: &str = "modinfo.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryFile {
    #[serde(default)]
    mods: BTreeMap<String, BTreeMap<String, VersionRecord>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct VersionRecord {
    #[serde(default)]
    permissions: Vec<String>,
}

/// Append-only store keyed by (mod name, version key).
///
/// Once a record exists for a key it is never overwritten. Inserts go through the
/// map's entry API, so concurrent queries for different keys do not contend on a
/// single lock.
#[derive(Debug, Default)]
pub struct ModInfoStore {
    records: DashMap<(String, String), Vec<String>>,
    path: Option<PathBuf>,
    save_lock: Mutex<()>,
}

impl ModInfoStore {
    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the store backed by `path`, loading existing records.
    ///
    /// Loading is best-effort: an unreadable or malformed file is logged and the
    /// store starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = DashMap::new();

        match Self::read_file(&path) {
            Ok(Some(file)) => {
                for (mod_name, versions) in file.mods {
                    for (version_key, record) in versions {
                        records.insert((mod_name.clone(), version_key), record.permissions);
                    }
                }
                debug!(path = %path.display(), records = records.len(), "Loaded mod history");
            }
            Ok(None) => debug!(path = %path.display(), "No mod history yet"),
            Err(e) => warn!(path = %path.display(), error = %e, "Ignoring unreadable mod history"),
        }

        Self {
            records,
            path: Some(path),
            save_lock: Mutex::new(()),
        }
    }

    fn read_file(path: &Path) -> Result<Option<HistoryFile>, PermissionsError> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Insert `permissions` for (`mod_name`, `version_key`) unless a record exists.
    ///
    /// Returns `true` if a new record was created.
    pub fn record_if_absent(
        &self,
        mod_name: &str,
        version_key: &str,
        permissions: Vec<String>,
    ) -> bool {
        match self
            .records
            .entry((mod_name.to_string(), version_key.to_string()))
        {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(permissions);
                true
            }
        }
    }

    /// Permissions first recorded for (`mod_name`, `version_key`).
    pub fn get(&self, mod_name: &str, version_key: &str) -> Option<Vec<String>> {
        self.records
            .get(&(mod_name.to_string(), version_key.to_string()))
            .map(|entry| entry.value().clone())
    }

    /// Version keys recorded for `mod_name`, sorted.
    pub fn versions(&self, mod_name: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .records
            .iter()
            .filter(|entry| entry.key().0 == mod_name)
            .map(|entry| entry.key().1.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records exist.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write every record to the backing file. No-op for in-memory stores.
    ///
    /// The snapshot is taken under the save lock, so a writer can never replace a
    /// newer file with an older snapshot.
    pub fn persist(&self) -> Result<(), PermissionsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let _guard = self.save_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = HistoryFile::default();
        for entry in self.records.iter() {
            let (mod_name, version_key) = entry.key();
            file.mods.entry(mod_name.clone()).or_default().insert(
                version_key.clone(),
                VersionRecord {
                    permissions: entry.value().clone(),
                },
            );
        }
        let json = serde_json::to_string_pretty(&file)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }
}
