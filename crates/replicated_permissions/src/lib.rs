//! Replicated Permissions - server-side permission replication for client mods
//!
//! Client-side mods often need to know what the player is allowed to do before
//! asking the server to do it. This crate implements the server half of that
//! exchange: a client sends a [`PermissionsContainer`](container::PermissionsContainer)
//! naming its mod, its version, and the permissions it cares about; the server
//! checks the version, asks the responsible mapping provider for the player's
//! authoritative permissions, and sends them back on the same channel.
//!
//! # Overview
//!
//! - Compact binary container codec with a leading format version byte
//! - Ordered chain of mapping providers, most recently registered first
//! - Whole-chain minimum-version gate with an admin override
//! - First-match permission replication, never merged across providers
//! - Per-player query cache and a persisted first-seen history per mod version
//!
//! # Architecture
//!
//! - `container`: The wire container and its codec
//! - `player`: The host's view of a connected player
//! - `providers`: Mapping provider traits, the chain, and the generic provider
//! - `replication`: Version gate, replicator, and the [`PermissionsManager`](replication::PermissionsManager)
//! - `monitor`: Query cache and mod version history
//! - `transport`: Outbound reply channel abstraction
//! - `error`: Error types and handling
//!
//! # Example
//!
//! ```rust
//! use replicated_permissions::prelude::*;
//! use std::sync::Arc;
//!
//! struct Steve(PlayerId);
//!
//! impl Player for Steve {
//!     fn id(&self) -> PlayerId {
//!         self.0
//!     }
//!     fn name(&self) -> &str {
//!         "Steve"
//!     }
//!     fn has_admin_override(&self) -> bool {
//!         false
//!     }
//!     fn has_permission(&self, node: &str) -> bool {
//!         node == "mod.examplemod.fly"
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), PermissionsError> {
//!     let options = ReplicationOptions::builder().history_file(None).build();
//!     let (channel, mut outbound) = QueuedReplyChannel::new();
//!
//!     let generic = Arc::new(GenericMappingProvider::new());
//!     generic.add_mod("examplemod");
//!
//!     let mut manager = PermissionsManager::new(options, Arc::new(channel));
//!     manager.register_provider(generic);
//!
//!     let player = Steve(PlayerId::random());
//!     let query = PermissionsContainer::new("examplemod", ModVersion::new(1.2), ["fly", "build"])?;
//!     let outcome = manager.handle_query(&player, &query.encode()?).await?;
//!     assert!(matches!(outcome, QueryOutcome::Replied(_)));
//!
//!     let reply = outbound.recv().await.expect("reply sent");
//!     let decoded = PermissionsContainer::decode(&reply.payload[1..])?;
//!     assert!(decoded.permissions().contains("+fly"));
//!     assert!(decoded.permissions().contains("-build"));
//!     Ok(())
//! }
//! ```
//!
//! # License
//!
//! Licensed under MIT. See LICENSE file for details.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// The permissions container exchanged with clients
///
/// Defines `PermissionsContainer`, `ModVersion`, and the binary codec used on the
/// replication channel.
pub mod container;

/// Error types and utilities
///
/// This module defines the `PermissionsError` enum:
///
/// - `ProtocolDecode` - Malformed inbound message
/// - `InvalidContainer` - Container failed validation
/// - `Encode` - Reply could not be serialized
/// - `Config` - Provider settings could not be read
/// - `ProviderInit` - Provider failed to initialize
/// - `Channel` - Reply channel refused a message
/// - `Io` / `Json` - Persistence errors
pub mod error;

/// Host context handed to mapping providers
pub mod host;

/// Bookkeeping of inbound queries
///
/// `QueryMonitor` caches each player's latest query per mod and records the first
/// permission set seen for every mod version in a `ModInfoStore`.
pub mod monitor;

/// Configuration options and builder
///
/// This module provides `ReplicationOptions` for configuring the data directory,
/// history persistence, and the message shown to rejected players.
pub mod options;

/// The host's view of a connected player
pub mod player;

/// Mapping providers and the provider chain
///
/// Providers translate a client query into signed permissions and decide whether a
/// client mod version is acceptable. See `GenericMappingProvider` for the built-in
/// configurable provider.
pub mod providers;

/// Version gating, permission replication, and the manager event loop
pub mod replication;

/// Outbound reply channel
///
/// This module provides the `ReplyChannel` trait, which defines an async interface
/// for sending replies to a single player. `QueuedReplyChannel` is an in-process
/// implementation backed by an unbounded queue.
pub mod transport;

#[cfg(test)]
mod testing;

// Prelude module for common imports
pub mod prelude {
    //! Common imports for replicated_permissions users
    //!
    //! Use `use replicated_permissions::prelude::*;` to import commonly used types.

    pub use crate::container::{ALL_MODS, ModVersion, PermissionsContainer};
    pub use crate::error::PermissionsError;
    pub use crate::host::HostContext;
    pub use crate::monitor::{ModInfoStore, QueryMonitor};
    pub use crate::options::ReplicationOptions;
    pub use crate::player::{Player, PlayerId};
    pub use crate::providers::{
        GenericMappingProvider, MappingProvider, ModRegistry, ModTable, ProviderChain,
    };
    pub use crate::replication::{
        HostEvent, PermissionsManager, PermissionsReplicator, QueryOutcome, VersionGate,
    };
    pub use crate::transport::{OutboundMessage, QueuedReplyChannel, ReplyChannel};
}
