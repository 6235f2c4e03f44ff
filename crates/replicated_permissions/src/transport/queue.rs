//! Queue-backed reply channel
//!
//! This module provides [`QueuedReplyChannel`], which hands replies to the host
//! through an unbounded Tokio mpsc queue.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::PermissionsError;
use crate::player::PlayerId;
use crate::transport::ReplyChannel;

/// A reply addressed to one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Recipient.
    pub player: PlayerId,
    /// Tag byte followed by the encoded container.
    pub payload: Vec<u8>,
}

/// Reply channel that queues messages for the host to deliver.
///
/// Once the receiving half is dropped, [`send`](ReplyChannel::send) fails with
/// [`PermissionsError::Channel`] and [`is_ready`](ReplyChannel::is_ready) returns
/// `false`.
#[derive(Debug, Clone)]
pub struct QueuedReplyChannel {
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl QueuedReplyChannel {
    /// Create a channel and the receiver the host drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ReplyChannel for QueuedReplyChannel {
    async fn send(&self, player: PlayerId, payload: Vec<u8>) -> Result<(), PermissionsError> {
        trace!(%player, bytes = payload.len(), "Queueing reply");
        self.tx
            .send(OutboundMessage { player, payload })
            .map_err(|_| PermissionsError::Channel("reply queue closed".to_string()))
    }

    fn is_ready(&self) -> bool {
        !self.tx.is_closed()
    }
}
