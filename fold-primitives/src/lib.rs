//! Core shared types for fold: address strings and configuration content.

#![warn(missing_docs, clippy::pedantic)]

mod address;
mod content;
mod error;

/// Address strings in `<module>:<object>` notation.
pub use address::{Address, ModulePath, ObjectPath};
/// Recursive configuration value and its ordered map.
pub use content::{Content, ContentMap};
/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
