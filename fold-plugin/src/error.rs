//! Errors raised while resolving addresses.

use thiserror::Error;

/// Result alias for resolution operations.
pub type PluginResult<T> = Result<T, PluginError>;

/// Errors produced by address resolution and capability checks.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The address string could not be parsed.
    #[error(transparent)]
    AddressSyntax(#[from] fold_primitives::Error),

    /// The module could not be loaded or an attribute is missing.
    #[error("cannot resolve `{address}`: {reason}")]
    Resolution {
        /// Address as supplied by the caller.
        address: String,
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// The resolved member does not provide the required capability.
    #[error("`{address}` does not provide capability `{capability}`")]
    CapabilityMismatch {
        /// Address as supplied by the caller.
        address: String,
        /// Type name of the required capability.
        capability: &'static str,
    },
}

impl PluginError {
    /// Creates a resolution error for the supplied address.
    #[must_use]
    pub fn resolution(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Resolution {
            address: address.into(),
            reason: reason.into(),
        }
    }
}
