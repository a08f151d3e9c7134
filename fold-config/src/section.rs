//! Routing of top-level config sections to their handlers.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use fold_plugin::{CapabilityRegistry, Interface, Member, Registration};
use fold_primitives::{Content, ContentMap};
use indexmap::IndexMap;
use tracing::debug;

use crate::document::Document;
use crate::error::{ConfigError, ConfigResult, SectionError};
use crate::DEFAULT_SECTION_NAMESPACE;

/// Capability of a handler that validates and transforms one config section.
pub trait SectionHandler: Send + Sync {
    /// Section name this handler is responsible for.
    ///
    /// Defaults to the handler's type name without its module path.
    fn name(&self) -> &str {
        let full = type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// Validates raw section content and returns its parsed form.
    ///
    /// # Errors
    ///
    /// Returns a [`SectionError`] when the content is invalid.
    fn parse(&self, content: Content) -> Result<Content, SectionError>;
}

/// Handlers keyed by the section name they serve.
pub type SectionMap = IndexMap<String, Arc<dyn SectionHandler>>;

/// Replaces every section of `document` with its handler's parsed result.
///
/// Sections are processed in document order and the output keeps that order.
/// The first unknown or invalid section aborts the whole dispatch.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownSection`] when a section has no handler and
/// [`ConfigError::Section`] when a handler rejects its content.
pub fn dispatch(document: &Document, handlers: &SectionMap) -> ConfigResult<Document> {
    let mut parsed = ContentMap::with_capacity(document.len());
    for (section, content) in document.sections() {
        let handler = handlers
            .get(section)
            .ok_or_else(|| ConfigError::UnknownSection {
                section: section.to_owned(),
            })?;
        debug!(section, "dispatching config section");
        let result = handler
            .parse(content.clone())
            .map_err(|source| ConfigError::Section {
                section: section.to_owned(),
                source,
            })?;
        parsed.insert(section.to_owned(), result);
    }
    Ok(Document::from(parsed))
}

fn section_marker() -> Member {
    Member::Interface(Interface::of::<dyn SectionHandler>())
}

inventory::submit! {
    Registration::new(DEFAULT_SECTION_NAMESPACE, "SectionHandler", section_marker)
}

/// A validated set of section handlers.
#[derive(Clone, Default)]
pub struct SectionDispatcher {
    handlers: SectionMap,
}

impl fmt::Debug for SectionDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionDispatcher")
            .field("sections", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SectionDispatcher {
    /// Creates a dispatcher from explicit handlers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateSection`] when two handlers share a
    /// name.
    pub fn new(
        handlers: impl IntoIterator<Item = Arc<dyn SectionHandler>>,
    ) -> ConfigResult<Self> {
        let mut map = SectionMap::new();
        for handler in handlers {
            let name = handler.name().to_owned();
            if map.contains_key(&name) {
                return Err(ConfigError::DuplicateSection { section: name });
            }
            map.insert(name, handler);
        }
        Ok(Self { handlers: map })
    }

    /// Creates a dispatcher from every handler in the default section
    /// namespace.
    ///
    /// # Errors
    ///
    /// See [`discover_in`](Self::discover_in).
    pub fn discover(registry: &CapabilityRegistry<dyn SectionHandler>) -> ConfigResult<Self> {
        Self::discover_in(registry, DEFAULT_SECTION_NAMESPACE)
    }

    /// Creates a dispatcher from every handler found in `namespace`.
    ///
    /// Handlers are ordered by name before registration so duplicate
    /// detection does not depend on discovery order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Plugin`] when the namespace cannot be resolved
    /// and [`ConfigError::DuplicateSection`] when two handlers share a name.
    pub fn discover_in(
        registry: &CapabilityRegistry<dyn SectionHandler>,
        namespace: &str,
    ) -> ConfigResult<Self> {
        let mut handlers = registry.discover(namespace, true)?;
        handlers.sort_by(|a, b| a.name().cmp(b.name()));
        Self::new(handlers)
    }

    /// Returns the handler for `section`.
    #[must_use]
    pub fn handler(&self, section: &str) -> Option<&Arc<dyn SectionHandler>> {
        self.handlers.get(section)
    }

    /// Registered section names.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Borrows the handler map.
    #[must_use]
    pub fn handlers(&self) -> &SectionMap {
        &self.handlers
    }

    /// Dispatches `document` through the registered handlers.
    ///
    /// # Errors
    ///
    /// See [`dispatch`].
    pub fn dispatch(&self, document: &Document) -> ConfigResult<Document> {
        dispatch(document, &self.handlers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Upper;

    impl SectionHandler for Upper {
        fn parse(&self, content: Content) -> Result<Content, SectionError> {
            content
                .as_str()
                .map(|text| Content::from(text.to_uppercase()))
                .ok_or_else(|| SectionError::invalid("expected a string"))
        }
    }

    struct Named(&'static str);

    impl SectionHandler for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn parse(&self, content: Content) -> Result<Content, SectionError> {
            Ok(content)
        }
    }

    fn handlers() -> SectionMap {
        let mut map = SectionMap::new();
        for name in ["a", "b", "c"] {
            map.insert(name.to_owned(), Arc::new(Named(name)) as Arc<dyn SectionHandler>);
        }
        map.insert("upper".to_owned(), Arc::new(Upper));
        map
    }

    fn document(value: serde_json::Value) -> Document {
        Document::try_from(Content::from(value)).unwrap()
    }

    #[test]
    fn default_name_is_type_name() {
        assert_eq!(Upper.name(), "Upper");
        assert_eq!(Named("log").name(), "log");
    }

    #[test]
    fn replaces_sections_with_parsed_content() {
        let parsed = dispatch(&document(json!({"upper": "shout", "a": 1})), &handlers()).unwrap();
        assert_eq!(parsed, document(json!({"upper": "SHOUT", "a": 1})));
    }

    #[test]
    fn keeps_document_order() {
        let parsed = dispatch(&document(json!({"c": 1, "a": 2, "b": 3})), &handlers()).unwrap();
        assert_eq!(parsed.names().collect::<Vec<_>>(), ["c", "a", "b"]);
    }

    #[test]
    fn unknown_section_fails() {
        let input = document(json!({"a": 1, "mystery": 2}));
        let err = dispatch(&input, &handlers()).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSection { ref section } if section == "mystery"));
        assert_eq!(input, document(json!({"a": 1, "mystery": 2})));
    }

    #[test]
    fn handler_error_names_section() {
        let err = dispatch(&document(json!({"upper": 5})), &handlers()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Section { ref section, source: SectionError::Invalid(_) } if section == "upper"
        ));
    }

    #[test]
    fn empty_document_dispatches_to_empty() {
        assert!(dispatch(&Document::new(), &SectionMap::new()).unwrap().is_empty());
    }

    #[test]
    fn dispatcher_rejects_duplicate_names() {
        let err = SectionDispatcher::new([
            Arc::new(Named("log")) as Arc<dyn SectionHandler>,
            Arc::new(Named("log")),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateSection { ref section } if section == "log"));
    }

    #[test]
    fn dispatcher_routes_by_handler_name() {
        let dispatcher = SectionDispatcher::new([
            Arc::new(Upper) as Arc<dyn SectionHandler>,
            Arc::new(Named("a")),
        ])
        .unwrap();
        assert_eq!(dispatcher.sections().collect::<Vec<_>>(), ["Upper", "a"]);
        let parsed = dispatcher.dispatch(&document(json!({"Upper": "x"}))).unwrap();
        assert_eq!(parsed.get("Upper"), Some(&Content::from("X")));
    }

    #[test]
    fn discovery_skips_the_marker() {
        let registry = CapabilityRegistry::<dyn SectionHandler>::with_registered();
        let dispatcher = SectionDispatcher::discover(&registry).unwrap();
        assert_eq!(dispatcher.sections().count(), 0);
        assert!(matches!(
            registry.load("fold.sections:SectionHandler", true),
            Err(fold_plugin::PluginError::CapabilityMismatch { .. })
        ));
    }
}
