//! The parsed top-level config map.

use fold_primitives::{Content, ContentMap};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level config value: an ordered map from section name to content.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(ContentMap);

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the content of a section.
    #[must_use]
    pub fn get(&self, section: &str) -> Option<&Content> {
        self.0.get(section)
    }

    /// Adds or replaces a section, keeping the position of an existing key.
    pub fn insert(&mut self, section: impl Into<String>, content: Content) -> Option<Content> {
        self.0.insert(section.into(), content)
    }

    /// Iterates over sections in document order.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &Content)> {
        self.0.iter().map(|(name, content)| (name.as_str(), content))
    }

    /// Section names in document order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the document has no sections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrows the underlying map.
    #[must_use]
    pub fn as_map(&self) -> &ContentMap {
        &self.0
    }

    /// Consumes the document, returning the underlying map.
    #[must_use]
    pub fn into_inner(self) -> ContentMap {
        self.0
    }
}

impl From<ContentMap> for Document {
    fn from(map: ContentMap) -> Self {
        Self(map)
    }
}

impl TryFrom<Content> for Document {
    type Error = ConfigError;

    fn try_from(content: Content) -> Result<Self, Self::Error> {
        content
            .into_map()
            .map(Self)
            .map_err(|other| ConfigError::NotAMap { kind: other.kind() })
    }
}

impl From<Document> for Content {
    fn from(document: Document) -> Self {
        Self::Map(document.0)
    }
}

impl FromIterator<(String, Content)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Content)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Document {
    type Item = (String, Content);
    type IntoIter = indexmap::map::IntoIter<String, Content>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
