//! Query handling: version gating, permission replication, and the event loop
//!
//! [`PermissionsManager`] ties the pieces together for a host:
//!
//! ```text
//! raw bytes ─► PermissionsContainer::decode ─► QueryMonitor::on_query
//!                                                   │
//!                                                   ▼
//!                                  VersionGate::check_version ──► reject (kick)
//!                                                   │ accept
//!                                                   ▼
//!                    PermissionsReplicator::replicate ─► [0x00][container] ─► player
//! ```
//!
//! # Example
//!
//! ```
//! use replicated_permissions::prelude::*;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), PermissionsError> {
//! let dir = std::env::temp_dir().join("replicated_permissions_doc");
//! let options = ReplicationOptions::builder()
//!     .data_dir(&dir)
//!     .history_file(None)
//!     .build();
//! let (channel, _outbound) = QueuedReplyChannel::new();
//!
//! let mut manager = PermissionsManager::new(options, Arc::new(channel));
//! manager.register_provider(Arc::new(GenericMappingProvider::new()));
//! manager.init_providers();
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, error, info, warn};

use crate::container::PermissionsContainer;
use crate::error::PermissionsError;
use crate::host::HostContext;
use crate::monitor::{ModInfoStore, QueryMonitor};
use crate::options::ReplicationOptions;
use crate::player::{Player, PlayerId};
use crate::providers::{MappingProvider, ProviderChain};
use crate::transport::ReplyChannel;

mod gate;
mod replicator;

pub use gate::VersionGate;
pub use replicator::PermissionsReplicator;

/// Result of handling one query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The client mod is too old; the host should disconnect the player.
    Rejected,
    /// The query was accepted and this reply was sent.
    Replied(PermissionsContainer),
    /// The query was accepted but no provider maps the mod, so nothing was sent.
    NoMapping,
}

/// Events the host feeds into [`PermissionsManager::run`].
pub enum HostEvent {
    /// The player registered the permissions channel.
    ChannelRegistered(Arc<dyn Player>),
    /// The player sent a query.
    Query {
        /// Sender.
        player: Arc<dyn Player>,
        /// Raw message bytes.
        payload: Vec<u8>,
    },
    /// Re-send replies for every cached query of the player.
    Refresh(Arc<dyn Player>),
    /// The player disconnected.
    Disconnected(PlayerId),
}

impl std::fmt::Debug for HostEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ChannelRegistered(player) => {
                f.debug_tuple("ChannelRegistered").field(&player.id()).finish()
            }
            Self::Query { player, payload } => f
                .debug_struct("Query")
                .field("player", &player.id())
                .field("bytes", &payload.len())
                .finish(),
            Self::Refresh(player) => f.debug_tuple("Refresh").field(&player.id()).finish(),
            Self::Disconnected(player_id) => f.debug_tuple("Disconnected").field(player_id).finish(),
        }
    }
}

/// Owns the provider chain, the monitor, and the reply channel.
///
/// # Lifecycle
///
/// 1. **Create** - [`new`](Self::new) with options and a reply channel
/// 2. **Register** - [`register_provider`](Self::register_provider) for every provider
/// 3. **Initialize** - [`init_providers`](Self::init_providers)
/// 4. **Serve** - [`handle_query`](Self::handle_query) per message, or feed
///    [`HostEvent`]s to [`run`](Self::run)
///
/// Registration takes `&mut self`, so the chain cannot change while queries are
/// being served from a shared reference.
pub struct PermissionsManager {
    options: ReplicationOptions,
    host: HostContext,
    chain: ProviderChain,
    monitor: QueryMonitor,
    channel: Arc<dyn ReplyChannel>,
}

impl PermissionsManager {
    /// Create a manager. The mod history is opened from the configured file.
    pub fn new(options: ReplicationOptions, channel: Arc<dyn ReplyChannel>) -> Self {
        let history = match options.history_path() {
            Some(path) => ModInfoStore::open(path),
            None => ModInfoStore::in_memory(),
        };
        Self {
            host: options.host_context(),
            options,
            chain: ProviderChain::new(),
            monitor: QueryMonitor::new(history),
            channel,
        }
    }

    /// Add a provider to the front of the chain. See [`ProviderChain::register`].
    pub fn register_provider(&mut self, provider: Arc<dyn MappingProvider>) -> bool {
        self.chain.register(provider)
    }

    /// Initialize all providers, returning how many failed.
    pub fn init_providers(&self) -> usize {
        let failures = self.chain.init_all(&self.host);
        info!(
            providers = self.chain.len(),
            failures, "Initialized mapping providers"
        );
        failures
    }

    /// The provider chain.
    pub fn chain(&self) -> &ProviderChain {
        &self.chain
    }

    /// The query monitor.
    pub fn monitor(&self) -> &QueryMonitor {
        &self.monitor
    }

    /// The host context forwarded to providers.
    pub fn host(&self) -> &HostContext {
        &self.host
    }

    /// The options this manager was built with.
    pub fn options(&self) -> &ReplicationOptions {
        &self.options
    }

    /// The player registered the permissions channel.
    pub fn on_channel_registered(&self, player: &dyn Player) {
        self.monitor.add_player(player);
    }

    /// The player disconnected.
    pub fn on_disconnect(&self, player_id: PlayerId) {
        self.monitor.remove_player(player_id);
    }

    /// Decode and process one inbound message.
    ///
    /// The query is recorded by the monitor regardless of the gate's decision.
    ///
    /// # Errors
    ///
    /// - [`PermissionsError::ProtocolDecode`] if `payload` is malformed; nothing is
    ///   recorded and no reply is sent
    /// - [`PermissionsError::Encode`] / [`PermissionsError::Channel`] if the reply
    ///   could not be sent
    pub async fn handle_query(
        &self,
        player: &dyn Player,
        payload: &[u8],
    ) -> Result<QueryOutcome, PermissionsError> {
        let query = PermissionsContainer::decode(payload).inspect_err(|e| {
            warn!(player = player.name(), error = %e, "Dropping malformed permissions query");
        })?;
        debug!(player = player.name(), query = %query, "Received permissions query");

        self.monitor.on_query(player, &query);
        self.process_query(player, &query).await
    }

    /// Gate and replicate an already decoded query.
    pub async fn process_query(
        &self,
        player: &dyn Player,
        query: &PermissionsContainer,
    ) -> Result<QueryOutcome, PermissionsError> {
        if !VersionGate::new(&self.chain, &self.host).check_version(player, query) {
            return Ok(QueryOutcome::Rejected);
        }

        let sent = PermissionsReplicator::new(&self.chain, &self.host)
            .replicate(player, query, self.channel.as_ref())
            .await?;
        Ok(match sent {
            Some(reply) => QueryOutcome::Replied(reply),
            None => QueryOutcome::NoMapping,
        })
    }

    /// Re-run every cached query of `player`, e.g. after permissions changed.
    ///
    /// Stops at the first rejection, since the player is about to be removed.
    pub async fn refresh(&self, player: &dyn Player) -> Result<Vec<QueryOutcome>, PermissionsError> {
        let queries = self.monitor.latest_queries(player.id());
        debug!(player = player.name(), queries = queries.len(), "Refreshing permissions");

        let mut outcomes = Vec::with_capacity(queries.len());
        for query in &queries {
            let outcome = self.process_query(player, query).await?;
            let rejected = outcome == QueryOutcome::Rejected;
            outcomes.push(outcome);
            if rejected {
                break;
            }
        }
        Ok(outcomes)
    }

    /// Consume host events until the sender side is dropped.
    ///
    /// A bad message never stops the loop. Players rejected by the version gate
    /// are kicked with the configured message.
    pub async fn run(&self, rx: mpsc::UnboundedReceiver<HostEvent>) {
        let mut events = UnboundedReceiverStream::new(rx);
        while let Some(event) = events.next().await {
            match event {
                HostEvent::ChannelRegistered(player) => self.on_channel_registered(player.as_ref()),
                HostEvent::Disconnected(player_id) => self.on_disconnect(player_id),
                HostEvent::Query { player, payload } => {
                    match self.handle_query(player.as_ref(), &payload).await {
                        Ok(QueryOutcome::Rejected) => player.kick(&self.options.kick_message),
                        Ok(_) => {}
                        // Already logged at decode time
                        Err(PermissionsError::ProtocolDecode { .. }) => {}
                        Err(e) => {
                            error!(player = player.name(), error = %e, "Failed to replicate permissions")
                        }
                    }
                }
                HostEvent::Refresh(player) => match self.refresh(player.as_ref()).await {
                    Ok(outcomes) if outcomes.contains(&QueryOutcome::Rejected) => {
                        player.kick(&self.options.kick_message)
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!(player = player.name(), error = %e, "Failed to refresh permissions")
                    }
                },
            }
        }
        debug!("Host event channel closed, permissions manager stopping");
    }
}
