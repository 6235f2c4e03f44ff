//! Permissions container and its binary wire format
//!
//! The same [`PermissionsContainer`] type carries both the client's query and the
//! server's authoritative answer. A query lists the permission strings a client mod
//! would like checked; an answer lists signed strings (`+node` granted, `-node`
//! denied) computed by a mapping provider.
//!
//! # Wire Format
//!
//! ```text
//! +----------------------+-------------------------------------------+
//! | format version (u8)  | postcard { mod_name, mod_version, perms } |
//! +----------------------+-------------------------------------------+
//! ```
//!
//! Strings and the permission sequence use postcard's varint length prefixes, and
//! the version is a little-endian IEEE-754 `f32`. Outbound replies are further
//! wrapped with a single tag byte by the replicator (see
//! [`crate::transport::REPLY_TAG_PERMISSIONS`]).
//!
//! # Example
//!
//! ```
//! use replicated_permissions::container::{ModVersion, PermissionsContainer};
//!
//! let query = PermissionsContainer::new("examplemod", ModVersion::new(1.2), ["fly", "fly"])?;
//! assert_eq!(query.permissions().len(), 1);
//!
//! let bytes = query.encode()?;
//! let decoded = PermissionsContainer::decode(&bytes)?;
//! assert_eq!(decoded, query);
//! # Ok::<(), replicated_permissions::error::PermissionsError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::PermissionsError;

/// Current container format version. Prepended to every encoded container.
pub const CONTAINER_FORMAT_VERSION: u8 = 1;

/// Reserved mod name meaning "not tied to a single mod". Skips version gating.
pub const ALL_MODS: &str = "all";

/// Prefix marking a permission as granted in a reply.
pub const GRANT_PREFIX: char = '+';

/// Prefix marking a permission as explicitly denied in a reply.
pub const DENY_PREFIX: char = '-';

/// A client mod version.
///
/// Versions have rational semantics: `1.0` and `1.000` are the same version.
/// The value is stored as an `f32` because that is what clients put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModVersion(f32);

impl ModVersion {
    /// Wrap a raw version number.
    pub const fn new(version: f32) -> Self {
        Self(version)
    }

    /// The raw version number.
    pub fn value(self) -> f32 {
        self.0
    }

    /// Whether this version is at least `minimum`.
    pub fn meets(self, minimum: ModVersion) -> bool {
        matches!(
            self.0.partial_cmp(&minimum.0),
            Some(Ordering::Greater | Ordering::Equal)
        )
    }

    /// Key used to group history records by version.
    ///
    /// The version is quantized to three decimal places and the decimal point is
    /// replaced with `_`, so `1.2` becomes `"1_200"`.
    pub fn version_key(self) -> String {
        format!("{:.3}", self.0).replace('.', "_")
    }
}

impl From<f32> for ModVersion {
    fn from(version: f32) -> Self {
        Self(version)
    }
}

impl fmt::Display for ModVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ModVersion {
    type Err = PermissionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f32 = s
            .trim()
            .parse()
            .map_err(|_| PermissionsError::InvalidContainer(format!("invalid mod version '{s}'")))?;
        if !value.is_finite() {
            return Err(PermissionsError::InvalidContainer(format!(
                "mod version '{s}' is not finite"
            )));
        }
        Ok(Self(value))
    }
}

/// Immutable query/answer value exchanged with client mods.
#[derive(Debug, Clone, PartialEq)]
pub struct PermissionsContainer {
    mod_name: String,
    mod_version: ModVersion,
    permissions: BTreeSet<String>,
}

impl PermissionsContainer {
    /// Build a container. Duplicate permission strings collapse.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionsError::InvalidContainer`] if `mod_name` is empty or the
    /// version is not a finite number.
    pub fn new<I, S>(
        mod_name: impl Into<String>,
        mod_version: ModVersion,
        permissions: I,
    ) -> Result<Self, PermissionsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mod_name = mod_name.into();
        if mod_name.is_empty() {
            return Err(PermissionsError::InvalidContainer(
                "mod name is empty".to_string(),
            ));
        }
        if !mod_version.value().is_finite() {
            return Err(PermissionsError::InvalidContainer(format!(
                "mod version {mod_version} is not finite"
            )));
        }

        Ok(Self {
            mod_name,
            mod_version,
            permissions: permissions.into_iter().map(Into::into).collect(),
        })
    }

    /// Build the authoritative answer to `query`.
    ///
    /// The answer keeps the query's mod name and version but its permission set is
    /// exactly `permissions`; nothing from the query's requested set carries over.
    pub fn reply_to<I, S>(query: &PermissionsContainer, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mod_name: query.mod_name.clone(),
            mod_version: query.mod_version,
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// Mod identifier.
    pub fn mod_name(&self) -> &str {
        &self.mod_name
    }

    /// Mod version.
    pub fn mod_version(&self) -> ModVersion {
        self.mod_version
    }

    /// Permission strings, sorted and deduplicated.
    pub fn permissions(&self) -> &BTreeSet<String> {
        &self.permissions
    }

    /// Whether this container is the reserved "all mods" query.
    pub fn is_all_mods(&self) -> bool {
        self.mod_name == ALL_MODS
    }

    /// Encode to the wire format.
    pub fn encode(&self) -> Result<Vec<u8>, PermissionsError> {
        let body = postcard::to_allocvec(&WireBodyRef {
            mod_name: &self.mod_name,
            mod_version: self.mod_version.value(),
            permissions: &self.permissions,
        })?;
        let mut out = Vec::with_capacity(1 + body.len());
        out.push(CONTAINER_FORMAT_VERSION);
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Decode from the wire format.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionsError::ProtocolDecode`] for an empty payload, an unknown
    /// format version, malformed or trailing bytes, an empty mod name, or a
    /// non-finite version.
    pub fn decode(data: &[u8]) -> Result<Self, PermissionsError> {
        let Some((&version, body)) = data.split_first() else {
            return Err(PermissionsError::decode("empty payload"));
        };
        if version != CONTAINER_FORMAT_VERSION {
            return Err(PermissionsError::decode(format!(
                "unsupported container format version {version}"
            )));
        }

        let (wire, rest): (WireBody, &[u8]) =
            postcard::take_from_bytes(body).map_err(|e| PermissionsError::decode(e.to_string()))?;
        if !rest.is_empty() {
            return Err(PermissionsError::decode(format!(
                "{} trailing bytes after container",
                rest.len()
            )));
        }

        Self::new(wire.mod_name, ModVersion::new(wire.mod_version), wire.permissions)
            .map_err(|e| PermissionsError::decode(e.to_string()))
    }
}

impl fmt::Display for PermissionsContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} v{} ({} permissions)",
            self.mod_name,
            self.mod_version,
            self.permissions.len()
        )
    }
}

#[derive(Serialize)]
struct WireBodyRef<'a> {
    mod_name: &'a str,
    mod_version: f32,
    permissions: &'a BTreeSet<String>,
}

#[derive(Deserialize)]
struct WireBody {
    mod_name: String,
    mod_version: f32,
    permissions: Vec<String>,
}

/// Prefix `permission` with `+` or `-`.
pub fn signed(permission: &str, granted: bool) -> String {
    let sign = if granted { GRANT_PREFIX } else { DENY_PREFIX };
    format!("{sign}{permission}")
}

/// Strip a leading `+` or `-` from a requested permission string.
pub fn unsigned(permission: &str) -> &str {
    permission
        .strip_prefix(GRANT_PREFIX)
        .or_else(|| permission.strip_prefix(DENY_PREFIX))
        .unwrap_or(permission)
}
