//! Output capabilities and plugin lookup.

use std::sync::{Arc, OnceLock};

use fold_plugin::{CapabilityRegistry, Interface, Member, Registration};
use fold_primitives::Content;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{OutputError, OutputResult};
use crate::DEFAULT_OUTPUT_NAMESPACE;

/// Fields shared by every output entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputPluginConfig {
    /// Name of the plugin that handles the entry.
    pub name: String,
}

/// A live destination for data.
pub trait Output: Send + Sync {
    /// Publishes one datum.
    ///
    /// # Errors
    ///
    /// Returns an [`OutputError`] when the destination rejects the write.
    fn write(&self, data: &Content) -> OutputResult<()>;
}

/// Capability of a factory for one kind of [`Output`].
pub trait OutputPlugin: Send + Sync {
    /// Name that output entries use to select this plugin.
    fn name(&self) -> &str;

    /// Validates one output entry, returning its normalised form.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::Schema`] when the entry does not match the
    /// plugin's schema.
    fn parse_config(&self, config: Content) -> OutputResult<Content>;

    /// Opens an output from a validated entry.
    ///
    /// # Errors
    ///
    /// Returns an [`OutputError`] when the entry is invalid or the destination
    /// cannot be opened.
    fn create(&self, config: &Content) -> OutputResult<Box<dyn Output>>;
}

/// Output plugins keyed by name.
pub type PluginMap = IndexMap<String, Arc<dyn OutputPlugin>>;

/// Shared registry over every output plugin registered through `inventory`.
#[must_use]
pub fn registered_plugins() -> Arc<CapabilityRegistry<dyn OutputPlugin>> {
    static PLUGINS: OnceLock<Arc<CapabilityRegistry<dyn OutputPlugin>>> = OnceLock::new();
    Arc::clone(PLUGINS.get_or_init(|| Arc::new(CapabilityRegistry::with_registered())))
}

/// Keys `plugins` by name.
///
/// # Errors
///
/// Returns [`OutputError::DuplicatePlugin`] when two plugins share a name.
pub fn plugin_map(
    plugins: impl IntoIterator<Item = Arc<dyn OutputPlugin>>,
) -> OutputResult<PluginMap> {
    let mut map = PluginMap::new();
    for plugin in plugins {
        let name = plugin.name().to_owned();
        if map.contains_key(&name) {
            return Err(OutputError::DuplicatePlugin { name });
        }
        map.insert(name, plugin);
    }
    Ok(map)
}

/// Collects every plugin found in the default output namespace.
///
/// # Errors
///
/// Returns [`OutputError::Plugin`] when the namespace cannot be resolved and
/// [`OutputError::DuplicatePlugin`] when two plugins share a name.
pub fn discover_plugins(registry: &CapabilityRegistry<dyn OutputPlugin>) -> OutputResult<PluginMap> {
    plugin_map(registry.discover(DEFAULT_OUTPUT_NAMESPACE, true)?)
}

/// Looks up the plugin named by an entry's `name` field.
pub(crate) fn plugin_for<'a>(
    plugins: &'a PluginMap,
    entry: &Content,
) -> OutputResult<&'a Arc<dyn OutputPlugin>> {
    let name = entry
        .get("name")
        .and_then(Content::as_str)
        .ok_or_else(|| OutputError::Schema(serde::de::Error::missing_field("name")))?;
    plugins
        .get(name)
        .ok_or_else(|| OutputError::UnknownPlugin {
            name: name.to_owned(),
        })
}

/// Splits section content into its entries; a single map is one entry.
pub(crate) fn entries(content: &Content) -> OutputResult<Vec<&Content>> {
    match content {
        Content::Map(_) => Ok(vec![content]),
        Content::List(items) => items
            .iter()
            .map(|item| match item {
                Content::Map(_) => Ok(item),
                other => Err(OutputError::Shape { kind: other.kind() }),
            })
            .collect(),
        other => Err(OutputError::Shape { kind: other.kind() }),
    }
}

fn plugin_marker() -> Member {
    Member::Interface(Interface::of::<dyn OutputPlugin>())
}

inventory::submit! {
    Registration::new(DEFAULT_OUTPUT_NAMESPACE, "OutputPlugin", plugin_marker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fold_plugin::{Export, Namespace, NamespaceLoader, NamespaceTable};
    use serde_json::json;

    use crate::stdout::StdoutPlugin;

    fn outputs_registry(namespace: Namespace) -> CapabilityRegistry<dyn OutputPlugin> {
        let mut table = NamespaceTable::new();
        table.insert(namespace);
        CapabilityRegistry::new(Arc::new(table) as Arc<dyn NamespaceLoader>)
    }

    #[test]
    fn base_config_rejects_extra_keys() {
        let config: OutputPluginConfig = Content::from(json!({"name": "handlerName"}))
            .deserialize_into()
            .unwrap();
        assert_eq!(config.name, "handlerName");

        let extra = Content::from(json!({"name": "handlerName", "foo": "bar"}));
        assert!(extra.deserialize_into::<OutputPluginConfig>().is_err());
    }

    #[test]
    fn entries_accept_map_or_list_of_maps() {
        let single = Content::from(json!({"name": "stdout"}));
        assert_eq!(entries(&single).unwrap().len(), 1);

        let many = Content::from(json!([{"name": "a"}, {"name": "b"}]));
        assert_eq!(entries(&many).unwrap().len(), 2);

        let mixed = Content::from(json!([{"name": "a"}, "b"]));
        assert!(matches!(entries(&mixed), Err(OutputError::Shape { kind: "string" })));
    }

    #[test]
    fn discovery_keys_plugins_by_name() {
        let registry = outputs_registry(
            Namespace::builder(DEFAULT_OUTPUT_NAMESPACE)
                .interface::<dyn OutputPlugin>("OutputPlugin")
                .object("Stdout", Export::of::<dyn OutputPlugin>(Arc::new(StdoutPlugin)))
                .build(),
        );
        let plugins = discover_plugins(&registry).unwrap();
        assert_eq!(plugins.keys().collect::<Vec<_>>(), ["stdout"]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let registry = outputs_registry(
            Namespace::builder(DEFAULT_OUTPUT_NAMESPACE)
                .object("Stdout", Export::of::<dyn OutputPlugin>(Arc::new(StdoutPlugin)))
                .object("Console", Export::of::<dyn OutputPlugin>(Arc::new(StdoutPlugin)))
                .build(),
        );
        let err = discover_plugins(&registry).err().unwrap();
        assert!(matches!(err, OutputError::DuplicatePlugin { ref name } if name == "stdout"));
    }

    #[test]
    fn registered_plugins_are_shared() {
        let registry = registered_plugins();
        let plugins = discover_plugins(&registry).unwrap();
        assert!(plugins.contains_key("stdout"));
        assert!(Arc::ptr_eq(&registry, &registered_plugins()));
        assert!(registered_plugins().is_cached(DEFAULT_OUTPUT_NAMESPACE));
    }

    #[test]
    fn unknown_names_are_reported() {
        let err = plugin_for(&PluginMap::new(), &Content::from(json!({"name": "kafka"}))).err().unwrap();
        assert!(matches!(err, OutputError::UnknownPlugin { ref name } if name == "kafka"));

        let err = plugin_for(&PluginMap::new(), &Content::from(json!({}))).err().unwrap();
        assert!(matches!(err, OutputError::Schema(_)));
    }
}
