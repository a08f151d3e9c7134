//! Output plugins and the `outputs` config section.
//!
//! An `outputs` section lists the destinations data should be published to,
//! each selecting an [`OutputPlugin`] by name:
//!
//! ```toml
//! [[outputs]]
//! name = "stdout"
//! ```
//!
//! [`OutputsSection`] validates the entries during dispatch and
//! [`OutputManager`] opens the outputs and fans writes out to them.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod manager;
mod plugin;
mod section;
mod stdout;

pub use error::{OutputError, OutputResult};
pub use manager::OutputManager;
pub use plugin::{
    Output, OutputPlugin, OutputPluginConfig, PluginMap, discover_plugins, plugin_map,
    registered_plugins,
};
pub use section::{OUTPUTS_SECTION, OutputsSection};
pub use stdout::{LineOutput, StdoutPlugin};

/// Namespace searched for output plugins.
pub const DEFAULT_OUTPUT_NAMESPACE: &str = "fold.outputs";
