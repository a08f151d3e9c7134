//! Shared error definitions for fold primitives.

use thiserror::Error;

/// Result alias used throughout fold.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while manipulating primitive types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The address string does not name a module.
    #[error("invalid address `{address}`: {reason}")]
    AddressSyntax {
        /// The offending address string.
        address: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// An object path contained no identifier.
    #[error("invalid object path `{path}`: no identifier found")]
    ObjectPathSyntax {
        /// The offending object path.
        path: String,
    },
}

impl Error {
    pub(crate) fn address(address: &str, reason: impl Into<String>) -> Self {
        Self::AddressSyntax {
            address: address.to_owned(),
            reason: reason.into(),
        }
    }
}
