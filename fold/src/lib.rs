//! Address-driven plugin resolution and config-driven composition.
//!
//! This crate bundles the fold crates behind feature flags so downstream users
//! can pull in only the pieces they need. Resolution primitives are always
//! available; config parsing, log setup, and outputs are optional.

#![warn(missing_docs, clippy::pedantic)]

/// Address strings and config content.
pub use fold_primitives as primitives;

/// Namespaces and capability registries.
pub use fold_plugin as plugin;

/// Config readers and section dispatch (enabled by `config` feature).
#[cfg(feature = "config")]
pub use fold_config as config;

/// The `log` section (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use fold_telemetry as telemetry;

/// Output plugins and the `outputs` section (enabled by `outputs` feature).
#[cfg(feature = "outputs")]
pub use fold_outputs as outputs;
