//! A config read from text or a file and dispatched to its sections.

use std::path::Path;

use fold_primitives::Content;

use crate::document::Document;
use crate::error::ConfigResult;
use crate::loader::ConfigLoader;
use crate::section::SectionDispatcher;

/// A config document whose sections have all been parsed by their handlers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Config {
    document: Document,
}

impl Config {
    /// Dispatches an already parsed document.
    ///
    /// # Errors
    ///
    /// Returns the first unknown-section or handler error.
    pub fn from_document(document: &Document, sections: &SectionDispatcher) -> ConfigResult<Self> {
        Ok(Self {
            document: sections.dispatch(document)?,
        })
    }

    /// Parses `text` with fallback over `loader`'s readers, then dispatches it.
    ///
    /// # Errors
    ///
    /// Returns a parse error when no reader accepts the text, otherwise the
    /// first dispatch error.
    pub fn from_text(
        text: &str,
        extension: Option<&str>,
        loader: &ConfigLoader,
        sections: &SectionDispatcher,
    ) -> ConfigResult<Self> {
        Self::from_document(&loader.from_text(text, extension)?, sections)
    }

    /// Reads, parses, and dispatches a config file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the file cannot be read, a parse error naming
    /// the path when no reader accepts it, otherwise the first dispatch error.
    pub fn from_path(
        path: impl AsRef<Path>,
        loader: &ConfigLoader,
        sections: &SectionDispatcher,
    ) -> ConfigResult<Self> {
        Self::from_document(&loader.from_path(path)?, sections)
    }

    /// Parsed content of a section.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Content> {
        self.document.get(name)
    }

    /// Borrows the parsed document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Consumes the config, returning the parsed document.
    #[must_use]
    pub fn into_document(self) -> Document {
        self.document
    }
}
