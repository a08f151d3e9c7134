//! Error types for the `log` section.

use std::path::PathBuf;

use fold_plugin::PluginError;
use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;

/// Result alias for telemetry setup.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Errors raised while validating the `log` section or installing its
/// handlers.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The section is neither a handler map nor a list of them.
    #[error("log section must be a map or a list of maps, found {kind}")]
    Shape {
        /// Kind of the value found instead.
        kind: &'static str,
    },

    /// A handler entry does not match the handler schema.
    #[error("invalid log handler: {0}")]
    Schema(#[from] serde_json::Error),

    /// A level name or number is not recognised.
    #[error("unknown log level `{level}`")]
    Level {
        /// Level as written.
        level: String,
    },

    /// A filter directive could not be parsed.
    #[error("invalid log filter `{directive}`")]
    Filter {
        /// Directive as written.
        directive: String,
        /// Parser error.
        #[source]
        source: ParseError,
    },

    /// A file sink could not be opened.
    #[error("failed to open log file `{}`", path.display())]
    Sink {
        /// Path of the file sink.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A handler with `sink = "custom"` has no `custom_sink` address.
    #[error("log handler with a custom sink requires `custom_sink`")]
    MissingCustomSink,

    /// The `custom_sink` address does not name a log sink.
    #[error("failed to load custom log sink `{address}`")]
    CustomSink {
        /// Address as written.
        address: String,
        /// Resolution failure.
        #[source]
        source: PluginError,
    },

    /// A global subscriber was already installed.
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized(#[source] TryInitError),
}
