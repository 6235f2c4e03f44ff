//! Permission aggregation and reply dispatch.

use std::collections::BTreeSet;
use tracing::{debug, trace};

use crate::container::PermissionsContainer;
use crate::error::PermissionsError;
use crate::host::HostContext;
use crate::player::Player;
use crate::providers::ProviderChain;
use crate::transport::{REPLY_TAG_PERMISSIONS, ReplyChannel};

/// Computes the authoritative permission set for a query and sends it back.
#[derive(Debug, Clone, Copy)]
pub struct PermissionsReplicator<'a> {
    chain: &'a ProviderChain,
    host: &'a HostContext,
}

impl<'a> PermissionsReplicator<'a> {
    /// Create a replicator over `chain`.
    pub fn new(chain: &'a ProviderChain, host: &'a HostContext) -> Self {
        Self { chain, host }
    }

    /// Build the reply for `query`, or `None` if no provider maps the mod.
    ///
    /// Only the first provider (front to back) that maps the mod is consulted.
    /// Permissions are never merged across providers.
    pub fn compute_reply(
        &self,
        player: &dyn Player,
        query: &PermissionsContainer,
    ) -> Option<PermissionsContainer> {
        let provider = self.chain.providers_for(query).next()?;

        let permissions: BTreeSet<String> = provider
            .permissions(self.host, player, query)
            .into_iter()
            .collect();
        trace!(
            player = player.name(),
            provider = provider.name(),
            mod_name = query.mod_name(),
            count = permissions.len(),
            "Computed replicated permissions"
        );

        Some(PermissionsContainer::reply_to(query, permissions))
    }

    /// Wrap an encoded reply with the permissions tag byte.
    pub fn encode_reply(reply: &PermissionsContainer) -> Result<Vec<u8>, PermissionsError> {
        let body = reply.encode()?;
        let mut out = Vec::with_capacity(body.len() + 1);
        out.push(REPLY_TAG_PERMISSIONS);
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Compute the reply for `query` and send it to `player` only.
    ///
    /// Returns the reply that was sent, or `None` when no provider maps the mod,
    /// in which case nothing is sent.
    ///
    /// # Errors
    ///
    /// - [`PermissionsError::Encode`] if the reply cannot be encoded
    /// - [`PermissionsError::Channel`] if the channel refuses the message
    pub async fn replicate(
        &self,
        player: &dyn Player,
        query: &PermissionsContainer,
        channel: &dyn ReplyChannel,
    ) -> Result<Option<PermissionsContainer>, PermissionsError> {
        let Some(reply) = self.compute_reply(player, query) else {
            debug!(
                player = player.name(),
                mod_name = query.mod_name(),
                "No mapping provider for mod, not replying"
            );
            return Ok(None);
        };

        let payload = Self::encode_reply(&reply)?;
        channel.send(player.id(), payload).await?;
        debug!(player = player.name(), reply = %reply, "Replicated permissions");
        Ok(Some(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ModVersion;
    use crate::testing::{MockPlayer, StaticProvider};
    use crate::transport::QueuedReplyChannel;
    use std::sync::Arc;

    fn query(name: &str, version: f32) -> PermissionsContainer {
        PermissionsContainer::new(name, ModVersion::new(version), ["+fly", "+build"]).unwrap()
    }

    fn host() -> HostContext {
        HostContext::new("test", "/tmp")
    }

    #[test]
    fn test_later_registration_takes_precedence() {
        let host = host();
        let p1 = Arc::new(StaticProvider::new("p1", &["+fly"]).governing("examplemod", None));
        let p2 = Arc::new(StaticProvider::new("p2", &["-fly"]).governing("examplemod", None));
        let mut chain = ProviderChain::new();
        chain.register(p1.clone());
        chain.register(p2.clone());

        let reply = PermissionsReplicator::new(&chain, &host)
            .compute_reply(&MockPlayer::new("alice"), &query("examplemod", 1.0))
            .unwrap();
        assert_eq!(reply.permissions().iter().collect::<Vec<_>>(), vec!["-fly"]);
        assert_eq!(p1.permission_calls(), 0);
        assert_eq!(p2.permission_calls(), 1);
    }

    #[test]
    fn test_never_merges_across_providers() {
        let host = host();
        let mut chain = ProviderChain::new();
        chain.register(Arc::new(
            StaticProvider::new("a", &["+chat"]).governing("examplemod", None),
        ));
        chain.register(Arc::new(
            StaticProvider::new("b", &["+fly", "+fly", "-build"]).governing("examplemod", None),
        ));

        let reply = PermissionsReplicator::new(&chain, &host)
            .compute_reply(&MockPlayer::new("alice"), &query("examplemod", 1.0))
            .unwrap();
        assert_eq!(reply.permissions().len(), 2);
        assert!(reply.permissions().contains("+fly"));
        assert!(reply.permissions().contains("-build"));
        assert!(!reply.permissions().contains("+chat"));
    }

    #[test]
    fn test_skips_providers_that_do_not_map_the_mod() {
        let host = host();
        let mut chain = ProviderChain::new();
        chain.register(Arc::new(
            StaticProvider::new("maps", &["+fly"]).governing("examplemod", None),
        ));
        chain.register(Arc::new(
            StaticProvider::new("other", &["+all"]).governing("othermod", None),
        ));

        let reply = PermissionsReplicator::new(&chain, &host)
            .compute_reply(&MockPlayer::new("alice"), &query("examplemod", 1.0))
            .unwrap();
        assert!(reply.permissions().contains("+fly"));
    }

    #[test]
    fn test_no_match_yields_no_reply() {
        let host = host();
        let mut chain = ProviderChain::new();
        chain.register(Arc::new(
            StaticProvider::new("other", &["+fly"]).governing("othermod", None),
        ));
        let reply = PermissionsReplicator::new(&chain, &host)
            .compute_reply(&MockPlayer::new("alice"), &query("examplemod", 1.0));
        assert!(reply.is_none());
    }

    #[test]
    fn test_reply_keeps_mod_identity() {
        let host = host();
        let mut chain = ProviderChain::new();
        chain.register(Arc::new(
            StaticProvider::new("p", &["+fly"]).governing("examplemod", None),
        ));
        let reply = PermissionsReplicator::new(&chain, &host)
            .compute_reply(&MockPlayer::new("alice"), &query("examplemod", 1.2))
            .unwrap();
        assert_eq!(reply.mod_name(), "examplemod");
        assert_eq!(reply.mod_version(), ModVersion::new(1.2));
    }

    #[test]
    fn test_encode_reply_prefixes_tag() {
        let reply = PermissionsContainer::reply_to(&query("examplemod", 1.2), ["+fly"]);
        let bytes = PermissionsReplicator::encode_reply(&reply).unwrap();
        assert_eq!(bytes[0], REPLY_TAG_PERMISSIONS);
        assert_eq!(PermissionsContainer::decode(&bytes[1..]).unwrap(), reply);
    }

    #[tokio::test]
    async fn test_replicate_sends_to_requesting_player_only() {
        let host = host();
        let mut chain = ProviderChain::new();
        chain.register(Arc::new(
            StaticProvider::new("generic", &["+fly"])
                .governing("examplemod", Some(ModVersion::new(1.0))),
        ));
        let (channel, mut rx) = QueuedReplyChannel::new();
        let player = MockPlayer::new("alice");

        let sent = PermissionsReplicator::new(&chain, &host)
            .replicate(&player, &query("examplemod", 1.2), &channel)
            .await
            .unwrap()
            .unwrap();

        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.player, player.id());
        assert_eq!(msg.payload[0], 0);
        let decoded = PermissionsContainer::decode(&msg.payload[1..]).unwrap();
        assert_eq!(decoded, sent);
        assert_eq!(decoded.permissions().iter().collect::<Vec<_>>(), vec!["+fly"]);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_replicate_without_match_sends_nothing() {
        let host = host();
        let chain = ProviderChain::new();
        let (channel, mut rx) = QueuedReplyChannel::new();

        let sent = PermissionsReplicator::new(&chain, &host)
            .replicate(&MockPlayer::new("alice"), &query("examplemod", 1.2), &channel)
            .await
            .unwrap();
        assert!(sent.is_none());
        assert!(rx.try_recv().is_err());
    }
}
