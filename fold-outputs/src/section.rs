//! The `outputs` config section.

use std::sync::{Arc, OnceLock};

use fold_config::{DEFAULT_SECTION_NAMESPACE, SectionError, SectionHandler};
use fold_plugin::{Export, Member, Registration};
use fold_primitives::Content;
use tracing::debug;

use crate::error::OutputResult;
use crate::plugin::{PluginMap, discover_plugins, entries, plugin_for, registered_plugins};

/// Name of the config section handled by [`OutputsSection`].
pub const OUTPUTS_SECTION: &str = "outputs";

/// Handler of the `outputs` config section.
///
/// Each entry names an output plugin, which validates the rest of the entry.
/// Without explicit plugins, the registered ones are discovered when the
/// section is first parsed and kept for later parses.
#[derive(Clone, Default)]
pub struct OutputsSection {
    plugins: OnceLock<PluginMap>,
}

impl std::fmt::Debug for OutputsSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let plugins = self
            .plugins
            .get()
            .map(|plugins| plugins.keys().cloned().collect::<Vec<_>>());
        f.debug_struct("OutputsSection")
            .field("plugins", &plugins)
            .finish()
    }
}

impl OutputsSection {
    /// Creates a section that discovers the registered plugins.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a section restricted to `plugins`.
    #[must_use]
    pub fn with_plugins(plugins: PluginMap) -> Self {
        Self {
            plugins: OnceLock::from(plugins),
        }
    }

    fn plugins(&self) -> OutputResult<&PluginMap> {
        if let Some(plugins) = self.plugins.get() {
            return Ok(plugins);
        }
        let discovered = discover_plugins(&registered_plugins())?;
        Ok(self.plugins.get_or_init(|| discovered))
    }

    /// Validates every entry against the plugin it names.
    ///
    /// # Errors
    ///
    /// Returns an [`OutputError`](crate::OutputError) for malformed content,
    /// unknown plugin names, or entries a plugin rejects.
    pub fn parse_outputs(&self, content: &Content) -> OutputResult<Content> {
        let plugins = self.plugins()?;
        let parsed = entries(content)?
            .into_iter()
            .map(|entry| plugin_for(plugins, entry)?.parse_config(entry.clone()))
            .collect::<OutputResult<Vec<_>>>()?;
        debug!(outputs = parsed.len(), "outputs section parsed");
        Ok(Content::List(parsed))
    }
}

impl SectionHandler for OutputsSection {
    fn name(&self) -> &str {
        OUTPUTS_SECTION
    }

    fn parse(&self, content: Content) -> Result<Content, SectionError> {
        Ok(self.parse_outputs(&content).map_err(anyhow::Error::from)?)
    }
}

fn outputs_section() -> Member {
    Member::Object(Export::of::<dyn SectionHandler>(Arc::new(OutputsSection::new())))
}

inventory::submit! {
    Registration::new(DEFAULT_SECTION_NAMESPACE, "OutputsSection", outputs_section)
}
