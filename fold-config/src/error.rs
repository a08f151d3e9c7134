//! Error types for config parsing and section dispatch.

use std::path::PathBuf;

use fold_plugin::PluginError;
use thiserror::Error;

/// Result alias for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors surfaced while reading a config or dispatching its sections.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Every candidate reader rejected the source.
    #[error("failed to parse `{source_name}` with any config reader")]
    Parse {
        /// Path of the source file, or an excerpt of the source text.
        source_name: String,
        /// Failure reported by each reader that was tried, in order.
        failures: Vec<FormatError>,
    },

    /// The document names a section with no registered handler.
    #[error("no handler registered for section `{section}`")]
    UnknownSection {
        /// Section name as written in the document.
        section: String,
    },

    /// A handler rejected the content of its section.
    #[error("invalid `{section}` section")]
    Section {
        /// Section name as written in the document.
        section: String,
        /// Error returned by the handler.
        #[source]
        source: SectionError,
    },

    /// Two handlers claim the same section name.
    #[error("more than one handler registered for section `{section}`")]
    DuplicateSection {
        /// The contested section name.
        section: String,
    },

    /// A config document was not a map at the top level.
    #[error("config document must be a map, found {kind}")]
    NotAMap {
        /// Kind of the value that was found instead.
        kind: &'static str,
    },

    /// The source file could not be read.
    #[error("failed to read config file `{}`", path.display())]
    Io {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Readers or handlers could not be resolved.
    #[error(transparent)]
    Plugin(#[from] PluginError),
}

/// Failure of a single config reader.
#[derive(Debug, Error)]
#[error("{format} reader: {message}")]
pub struct FormatError {
    format: String,
    message: String,
}

impl FormatError {
    /// Creates a reader failure.
    #[must_use]
    pub fn new(format: impl Into<String>, message: impl ToString) -> Self {
        Self {
            format: format.into(),
            message: message.to_string(),
        }
    }

    /// Name of the reader that failed.
    #[must_use]
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Reader-specific description of the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error returned by a section handler.
#[derive(Debug, Error)]
pub enum SectionError {
    /// The content has the wrong shape or an unsupported value.
    #[error("{0}")]
    Invalid(String),

    /// The content could not be deserialized into the handler's schema.
    #[error(transparent)]
    Schema(#[from] serde_json::Error),

    /// A plugin named by the content could not be resolved.
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// Any other handler failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SectionError {
    /// Creates an [`SectionError::Invalid`] error.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}
