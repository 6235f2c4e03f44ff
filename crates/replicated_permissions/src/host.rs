//! Host services forwarded to mapping providers
//!
//! The core never interprets a [`HostContext`]; it hands the same value to every
//! provider operation so providers can find their settings without reaching for
//! global state.

use std::path::{Path, PathBuf};

/// Services the hosting runtime exposes to mapping providers.
#[derive(Debug, Clone)]
pub struct HostContext {
    plugin_name: String,
    data_dir: PathBuf,
}

impl HostContext {
    /// Create a context for a plugin whose data lives under `data_dir`.
    pub fn new(plugin_name: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            data_dir: data_dir.into(),
        }
    }

    /// Name of the hosting plugin.
    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    /// Directory where providers keep their settings.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Resolve `file_name` inside the data directory.
    pub fn data_file(&self, file_name: &str) -> PathBuf {
        self.data_dir.join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_file_joins_data_dir() {
        let host = HostContext::new("ReplicatedPermissions", "/srv/plugins/perms");
        assert_eq!(host.plugin_name(), "ReplicatedPermissions");
        assert_eq!(
            host.data_file("modinfo.json"),
            PathBuf::from("/srv/plugins/perms/modinfo.json")
        );
    }
}
