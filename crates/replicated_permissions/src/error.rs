//! Error types for permission replication
//!
//! This module defines the error hierarchy for the replicated_permissions crate using
//! `thiserror`. Fallible operations return `Result<T, PermissionsError>`.
//!
//! # Error Variants
//!
//! - [`PermissionsError::ProtocolDecode`]: Inbound bytes could not be decoded into a query
//! - [`PermissionsError::InvalidContainer`]: A container was constructed with invalid fields
//! - [`PermissionsError::Encode`]: Wire encoding failed (auto-converts from `postcard::Error`)
//! - [`PermissionsError::Config`]: Provider settings could not be parsed
//! - [`PermissionsError::ProviderInit`]: A mapping provider failed to initialize
//! - [`PermissionsError::Channel`]: The reply channel refused an outbound message
//! - [`PermissionsError::Io`]: Filesystem operations (auto-converts from `std::io::Error`)
//! - [`PermissionsError::Json`]: JSON persistence errors (auto-converts from `serde_json::Error`)
//!
//! Note that a version-check rejection is *not* an error. The gate reports it as a
//! plain boolean and the host decides how to surface it.
//!
//! # Example
//!
//! ```rust
//! use replicated_permissions::error::PermissionsError;
//!
//! fn example() -> Result<(), PermissionsError> {
//!     // Auto-conversion from std::io::Error
//!     let _file = std::fs::read_to_string("/nonexistent")?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for all replicated_permissions operations
#[derive(Error, Debug)]
pub enum PermissionsError {
    /// Inbound query bytes were malformed
    ///
    /// The query is dropped and no reply is sent. The dispatch loop logs the
    /// failure and continues with the next message.
    #[error("Failed to decode permissions query: {reason}")]
    ProtocolDecode {
        /// Description of what went wrong during decoding
        reason: String,
    },

    /// A container was built with fields that violate its invariants
    #[error("Invalid permissions container: {0}")]
    InvalidContainer(String),

    /// Wire encoding failed
    #[error("Failed to encode permissions container: {0}")]
    Encode(#[from] postcard::Error),

    /// Provider settings were present but could not be understood
    #[error("Invalid provider configuration in {path}: {reason}")]
    Config {
        /// The settings file that failed to load
        path: String,
        /// Description of the problem
        reason: String,
    },

    /// A mapping provider failed during `init`
    ///
    /// The provider chain logs this and carries on initializing the remaining
    /// providers.
    #[error("Mapping provider '{provider}' failed to initialize: {reason}")]
    ProviderInit {
        /// Name of the failing provider
        provider: String,
        /// Description of the failure
        reason: String,
    },

    /// The host channel refused to deliver a reply
    #[error("Reply channel error: {0}")]
    Channel(String),

    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PermissionsError {
    /// Shorthand for a [`PermissionsError::ProtocolDecode`] error
    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        PermissionsError::ProtocolDecode {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_decode_message() {
        let err = PermissionsError::decode("empty payload");
        assert_eq!(
            err.to_string(),
            "Failed to decode permissions query: empty payload"
        );
    }

    #[test]
    fn test_invalid_container_message() {
        let err = PermissionsError::InvalidContainer("mod name is empty".to_string());
        assert!(err.to_string().contains("mod name is empty"));
    }

    #[test]
    fn test_config_error_message() {
        let err = PermissionsError::Config {
            path: "generic_mappings.json".to_string(),
            reason: "expected value".to_string(),
        };
        assert!(err.to_string().contains("generic_mappings.json"));
        assert!(err.to_string().contains("expected value"));
    }

    #[test]
    fn test_provider_init_message() {
        let err = PermissionsError::ProviderInit {
            provider: "generic".to_string(),
            reason: "settings unreadable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Mapping provider 'generic' failed to initialize: settings unreadable"
        );
    }

    #[test]
    fn test_channel_error_message() {
        let err = PermissionsError::Channel("player offline".to_string());
        assert!(err.to_string().contains("player offline"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PermissionsError = io_err.into();
        assert!(matches!(err, PermissionsError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_result_with_question_mark_json() {
        fn parse_json() -> Result<serde_json::Value, PermissionsError> {
            Ok(serde_json::from_str("{ invalid }")?)
        }

        let err = parse_json().unwrap_err();
        assert!(matches!(err, PermissionsError::Json(_)));
    }
}
