//! Identity of a connected client
//!
//! The host owns the real player object. This crate only needs a stable id for
//! session bookkeeping, a name for log messages, the administrative override
//! capability consulted by the version gate, and a generic permission-node check
//! used by mapping providers.

use std::fmt;
use uuid::Uuid;

/// Stable identifier of a connected player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(Uuid);

impl PlayerId {
    /// Wrap a host-supplied UUID.
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a random id. Mostly useful for tests and demos.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for PlayerId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A connected player as seen by the permission core.
///
/// Implemented by the host. All methods must be cheap; they are called on the
/// query path.
///
/// # Example
///
/// ```
/// use replicated_permissions::player::{Player, PlayerId};
///
/// struct Operator {
///     id: PlayerId,
/// }
///
/// impl Player for Operator {
///     fn id(&self) -> PlayerId {
///         self.id
///     }
///
///     fn name(&self) -> &str {
///         "operator"
///     }
///
///     fn has_admin_override(&self) -> bool {
///         true
///     }
///
///     fn has_permission(&self, _node: &str) -> bool {
///         true
///     }
/// }
/// ```
pub trait Player: Send + Sync {
    /// Stable identifier used to key session state.
    fn id(&self) -> PlayerId;

    /// Display name for log messages.
    fn name(&self) -> &str;

    /// Whether the player may connect with outdated client mods.
    fn has_admin_override(&self) -> bool;

    /// Check a permission node against the host's permission tree.
    fn has_permission(&self, node: &str) -> bool;

    /// Disconnect the player after a failed version check.
    ///
    /// The default does nothing, for hosts that handle rejection themselves.
    fn kick(&self, _reason: &str) {}
}
