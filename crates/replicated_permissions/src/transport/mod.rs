//! Outbound channel abstraction for permission replies
//!
//! The host owns the real byte transport between client and server. This module
//! defines the [`ReplyChannel`] trait the replicator sends through, plus the
//! channel name and tag-byte constants shared with client mods.
//!
//! # Message Layout
//!
//! ```text
//! inbound  (client → server):  [encoded PermissionsContainer]
//! outbound (server → client):  [tag: u8 = 0x00] [encoded PermissionsContainer]
//! ```
//!
//! # Default Implementation
//!
//! [`QueuedReplyChannel`] pushes replies onto a Tokio mpsc queue. Hosts that
//! deliver messages from their own task (or tests) drain the receiver.
//!
//! # Example
//!
//! ```
//! use replicated_permissions::player::PlayerId;
//! use replicated_permissions::transport::{QueuedReplyChannel, ReplyChannel};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), replicated_permissions::error::PermissionsError> {
//! let (channel, mut outbound) = QueuedReplyChannel::new();
//! let player = PlayerId::random();
//!
//! channel.send(player, vec![0x00, 0x01]).await?;
//!
//! let reply = outbound.recv().await.unwrap();
//! assert_eq!(reply.player, player);
//! assert_eq!(reply.payload, vec![0x00, 0x01]);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::error::PermissionsError;
use crate::player::PlayerId;

mod queue;

pub use queue::{OutboundMessage, QueuedReplyChannel};

/// Name of the plugin channel queries and replies travel on.
pub const CHANNEL_NAME: &str = "PERMISSIONSREPL";

/// Leading tag byte of a permissions reply on [`CHANNEL_NAME`].
pub const REPLY_TAG_PERMISSIONS: u8 = 0x00;

/// Delivers encoded replies to a single player.
///
/// Implementations must never broadcast: a reply goes to exactly the player it
/// is addressed to.
///
/// # Thread Safety
///
/// `send` may be called concurrently for different players (`Send + Sync`).
#[async_trait]
pub trait ReplyChannel: Send + Sync {
    /// Send `payload` (tag byte included) to `player`.
    ///
    /// # Errors
    ///
    /// - [`PermissionsError::Channel`] if the player can no longer be reached
    async fn send(&self, player: PlayerId, payload: Vec<u8>) -> Result<(), PermissionsError>;

    /// Whether replies can currently be delivered.
    fn is_ready(&self) -> bool {
        true
    }
}
