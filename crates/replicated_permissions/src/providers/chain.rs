//! Ordered collection of mapping providers.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error};

use super::MappingProvider;
use crate::container::PermissionsContainer;
use crate::host::HostContext;

/// Ordered list of mapping providers.
///
/// Providers are inserted at the *front*, so a provider registered later takes
/// precedence over earlier ones. Both the version gate and the replicator walk the
/// chain front to back, and the replicator stops at the first provider that maps
/// the queried mod.
///
/// Build the chain completely before any query is processed: registration takes
/// `&mut self`, traversal only `&self`.
#[derive(Default, Clone)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn MappingProvider>>,
}

impl ProviderChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `provider` at the front of the chain.
    ///
    /// Registering the same instance twice is a no-op. Returns whether the
    /// provider was inserted.
    pub fn register(&mut self, provider: Arc<dyn MappingProvider>) -> bool {
        if self.contains(&provider) {
            debug!(provider = provider.name(), "Mapping provider already registered");
            return false;
        }
        debug!(provider = provider.name(), "Registering mapping provider");
        self.providers.insert(0, provider);
        true
    }

    /// Whether this exact provider instance is registered.
    pub fn contains(&self, provider: &Arc<dyn MappingProvider>) -> bool {
        self.providers.iter().any(|p| Arc::ptr_eq(p, provider))
    }

    /// Initialize every provider in chain order.
    ///
    /// A provider that returns an error or panics is logged and skipped; the
    /// remaining providers are still initialized. Returns the number of providers
    /// that failed.
    pub fn init_all(&self, host: &HostContext) -> usize {
        let mut failures = 0;
        for provider in &self.providers {
            let result = panic::catch_unwind(AssertUnwindSafe(|| provider.init(host)));
            match result {
                Ok(Ok(())) => debug!(provider = provider.name(), "Mapping provider initialized"),
                Ok(Err(e)) => {
                    failures += 1;
                    error!(provider = provider.name(), error = %e, "Mapping provider failed to initialize");
                }
                Err(_) => {
                    failures += 1;
                    error!(provider = provider.name(), "Mapping provider panicked during init");
                }
            }
        }
        failures
    }

    /// Providers in traversal order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn MappingProvider>> {
        self.providers.iter()
    }

    /// Providers that map `query`'s mod, in traversal order.
    pub fn providers_for<'a>(
        &'a self,
        query: &'a PermissionsContainer,
    ) -> impl Iterator<Item = &'a Arc<dyn MappingProvider>> + 'a {
        self.providers
            .iter()
            .filter(move |p| p.provides_mappings_for(query))
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no providers are registered.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.providers.iter().map(|p| p.name()))
            .finish()
    }
}
