//! Error types for output plugins and the `outputs` section.

use fold_plugin::PluginError;
use thiserror::Error;

/// Result alias for output operations.
pub type OutputResult<T> = Result<T, OutputError>;

/// Errors raised while configuring or writing outputs.
#[derive(Debug, Error)]
pub enum OutputError {
    /// The section is neither an output map nor a list of them.
    #[error("outputs must be a map or a list of maps, found {kind}")]
    Shape {
        /// Kind of the value found instead.
        kind: &'static str,
    },

    /// An output entry does not match its plugin's schema.
    #[error("invalid output config: {0}")]
    Schema(#[from] serde_json::Error),

    /// No plugin is registered under the requested name.
    #[error("no output plugin named `{name}`")]
    UnknownPlugin {
        /// Requested plugin name.
        name: String,
    },

    /// Two plugins share one name.
    #[error("more than one output plugin named `{name}`")]
    DuplicatePlugin {
        /// The contested plugin name.
        name: String,
    },

    /// Output plugins could not be discovered.
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// Writing to an output failed.
    #[error("failed to write output")]
    Io(#[from] std::io::Error),
}
