//! Address resolution and capability registries.
//!
//! Namespaces of exported members are served by a [`NamespaceLoader`]; a
//! [`CapabilityRegistry`] resolves address strings against them, checks the
//! result provides the registry's capability, and memoises successful
//! resolutions until flushed.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod namespace;
mod registry;

pub use error::{PluginError, PluginResult};
pub use namespace::{
    Export, Interface, Member, Namespace, NamespaceBuilder, NamespaceLoader, NamespaceTable,
    PRIVATE_PREFIX, Registration, resolve_member,
};
pub use registry::CapabilityRegistry;

/// Re-exported so downstream crates can submit [`Registration`] entries
/// without a direct dependency.
pub use inventory;
