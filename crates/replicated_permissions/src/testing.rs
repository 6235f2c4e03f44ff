//! In-crate test doubles for players and mapping providers.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::container::{ModVersion, PermissionsContainer};
use crate::error::PermissionsError;
use crate::host::HostContext;
use crate::player::{Player, PlayerId};
use crate::providers::{MappingProvider, ModRegistry, ModTable};

/// Player with a fixed set of permission nodes that records kicks.
#[derive(Debug)]
pub(crate) struct MockPlayer {
    id: PlayerId,
    name: String,
    nodes: HashSet<String>,
    admin_override: bool,
    kicks: Mutex<Vec<String>>,
}

impl MockPlayer {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            id: PlayerId::random(),
            name: name.to_string(),
            nodes: HashSet::new(),
            admin_override: false,
            kicks: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_permission(mut self, node: &str) -> Self {
        self.nodes.insert(node.to_string());
        self
    }

    pub(crate) fn with_admin_override(mut self) -> Self {
        self.admin_override = true;
        self
    }

    pub(crate) fn kicks(&self) -> Vec<String> {
        self.kicks.lock().unwrap().clone()
    }
}

impl Player for MockPlayer {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn has_admin_override(&self) -> bool {
        self.admin_override
    }

    fn has_permission(&self, node: &str) -> bool {
        self.nodes.contains(node)
    }

    fn kick(&self, reason: &str) {
        self.kicks.lock().unwrap().push(reason.to_string());
    }
}

/// Provider answering every mapped query with the same permissions.
#[derive(Debug)]
pub(crate) struct StaticProvider {
    name: String,
    permissions: Vec<String>,
    mods: ModTable,
    fail_init: bool,
    panic_init: bool,
    reject_all: bool,
    init_calls: AtomicUsize,
    version_checks: AtomicUsize,
    permission_calls: AtomicUsize,
}

impl StaticProvider {
    pub(crate) fn new(name: &str, permissions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            mods: ModTable::new(),
            fail_init: false,
            panic_init: false,
            reject_all: false,
            init_calls: AtomicUsize::new(0),
            version_checks: AtomicUsize::new(0),
            permission_calls: AtomicUsize::new(0),
        }
    }

    /// Govern `mod_name`, optionally with a minimum version.
    pub(crate) fn governing(self, mod_name: &str, min_version: Option<ModVersion>) -> Self {
        self.mods.add(mod_name);
        if let Some(min) = min_version {
            self.mods.set_min_version(mod_name, min);
        }
        self
    }

    pub(crate) fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub(crate) fn panicking_init(mut self) -> Self {
        self.panic_init = true;
        self
    }

    /// Reject every version check.
    pub(crate) fn rejecting_all(mut self) -> Self {
        self.reject_all = true;
        self
    }

    pub(crate) fn init_calls(&self) -> usize {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn version_checks(&self) -> usize {
        self.version_checks.load(Ordering::SeqCst)
    }

    pub(crate) fn permission_calls(&self) -> usize {
        self.permission_calls.load(Ordering::SeqCst)
    }
}

impl ModRegistry for StaticProvider {
    fn mod_table(&self) -> &ModTable {
        &self.mods
    }
}

impl MappingProvider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&self, _host: &HostContext) -> Result<(), PermissionsError> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_init {
            panic!("{} blew up during init", self.name);
        }
        if self.fail_init {
            return Err(PermissionsError::ProviderInit {
                provider: self.name.clone(),
                reason: "configured to fail".to_string(),
            });
        }
        Ok(())
    }

    fn check_version(
        &self,
        _host: &HostContext,
        _player: &dyn Player,
        query: &PermissionsContainer,
    ) -> bool {
        self.version_checks.fetch_add(1, Ordering::SeqCst);
        if self.reject_all {
            return false;
        }
        match self.mods.min_version(query.mod_name()) {
            Some(min) => query.mod_version().meets(min),
            None => true,
        }
    }

    fn permissions(
        &self,
        _host: &HostContext,
        _player: &dyn Player,
        _query: &PermissionsContainer,
    ) -> Vec<String> {
        self.permission_calls.fetch_add(1, Ordering::SeqCst);
        self.permissions.clone()
    }
}
