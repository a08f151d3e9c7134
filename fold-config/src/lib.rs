//! Config loading and section dispatch.
//!
//! Text is turned into a [`Document`] by the first [`ConfigFormat`] reader that
//! accepts it ([`ConfigLoader`]); each top-level section is then handed to the
//! [`SectionHandler`] registered under its name ([`dispatch`]). Readers and
//! handlers are plain capabilities, so both can be discovered through a
//! [`fold_plugin::CapabilityRegistry`].

#![warn(missing_docs, clippy::pedantic)]

mod config;
mod document;
mod error;
pub mod format;
mod loader;
pub mod section;

pub use config::Config;
pub use document::Document;
pub use error::{ConfigError, ConfigResult, FormatError, SectionError};
pub use format::{ConfigFormat, JsonFormat, TomlFormat};
pub use loader::ConfigLoader;
pub use section::{SectionDispatcher, SectionHandler, SectionMap, dispatch};

/// Namespace searched for config readers.
pub const DEFAULT_FORMAT_NAMESPACE: &str = "fold.config";

/// Namespace searched for section handlers.
pub const DEFAULT_SECTION_NAMESPACE: &str = "fold.sections";
