//! Minimum-version gate.

use tracing::{debug, info, warn};

use crate::container::PermissionsContainer;
use crate::host::HostContext;
use crate::player::Player;
use crate::providers::ProviderChain;

/// Decides whether a client mod version is acceptable on this server.
///
/// The gate walks the *entire* chain. Providers answer `true` for mods they do not
/// govern, so scanning everything is equivalent to asking only the governing
/// provider without the gate needing to know which one that is.
#[derive(Debug, Clone, Copy)]
pub struct VersionGate<'a> {
    chain: &'a ProviderChain,
    host: &'a HostContext,
}

impl<'a> VersionGate<'a> {
    /// Create a gate over `chain`.
    pub fn new(chain: &'a ProviderChain, host: &'a HostContext) -> Self {
        Self { chain, host }
    }

    /// `true` to accept the player, `false` to reject.
    ///
    /// 1. Queries for the reserved `"all"` mod are always accepted.
    /// 2. The first provider that rejects the version rejects the player, unless
    ///    the player holds the admin override.
    /// 3. Otherwise the player is accepted.
    pub fn check_version(&self, player: &dyn Player, query: &PermissionsContainer) -> bool {
        if query.is_all_mods() {
            debug!(player = player.name(), "Skipping version check for all-mods query");
            return true;
        }

        for provider in self.chain.iter() {
            if provider.check_version(self.host, player, query) {
                continue;
            }
            if player.has_admin_override() {
                info!(
                    player = player.name(),
                    provider = provider.name(),
                    mod_name = query.mod_name(),
                    version = %query.mod_version(),
                    "Outdated client mod allowed by admin override"
                );
                continue;
            }
            warn!(
                player = player.name(),
                provider = provider.name(),
                mod_name = query.mod_name(),
                version = %query.mod_version(),
                "Rejecting outdated client mod"
            );
            return false;
        }

        true
    }
}
