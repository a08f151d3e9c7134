//! Opening and writing the outputs of an `outputs` section.

use fold_primitives::Content;
use tracing::trace;

use crate::error::OutputResult;
use crate::plugin::{Output, PluginMap, discover_plugins, entries, plugin_for, registered_plugins};

/// Fans data out to every output listed in an `outputs` section.
pub struct OutputManager {
    outputs: Vec<Box<dyn Output>>,
}

impl std::fmt::Debug for OutputManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputManager")
            .field("outputs", &self.outputs.len())
            .finish()
    }
}

impl OutputManager {
    /// Wraps already opened outputs.
    #[must_use]
    pub fn new(outputs: Vec<Box<dyn Output>>) -> Self {
        Self { outputs }
    }

    /// Opens one output per entry of `content`, using `plugins` to create
    /// them.
    ///
    /// # Errors
    ///
    /// Returns an [`OutputError`](crate::OutputError) for malformed content,
    /// unknown plugin names, or outputs that fail to open.
    pub fn from_content(content: &Content, plugins: &PluginMap) -> OutputResult<Self> {
        let outputs = entries(content)?
            .into_iter()
            .map(|entry| plugin_for(plugins, entry)?.create(entry))
            .collect::<OutputResult<Vec<_>>>()?;
        Ok(Self { outputs })
    }

    /// Like [`from_content`](Self::from_content), with plugins discovered
    /// from the default output namespace.
    ///
    /// # Errors
    ///
    /// See [`from_content`](Self::from_content).
    pub fn from_registered(content: &Content) -> OutputResult<Self> {
        let plugins = discover_plugins(&registered_plugins())?;
        Self::from_content(content, &plugins)
    }

    /// Number of outputs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Returns `true` when there are no outputs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Writes `data` to every output in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the error of the first output that fails.
    pub fn write(&self, data: &Content) -> OutputResult<()> {
        for output in &self.outputs {
            output.write(data)?;
        }
        trace!(outputs = self.outputs.len(), "datum written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde_json::json;

    use crate::error::OutputError;
    use crate::plugin::OutputPlugin;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Content>>,
    }

    struct Recording(Arc<Recorder>);

    impl Output for Recording {
        fn write(&self, data: &Content) -> OutputResult<()> {
            self.0.seen.lock().push(data.clone());
            Ok(())
        }
    }

    struct RecordingPlugin(Arc<Recorder>);

    impl OutputPlugin for RecordingPlugin {
        fn name(&self) -> &str {
            "memory"
        }

        fn parse_config(&self, config: Content) -> OutputResult<Content> {
            Ok(config)
        }

        fn create(&self, _config: &Content) -> OutputResult<Box<dyn Output>> {
            Ok(Box::new(Recording(Arc::clone(&self.0))))
        }
    }

    #[test]
    fn writes_reach_every_output() {
        let recorder = Arc::new(Recorder::default());
        let mut plugins = PluginMap::new();
        plugins.insert(
            "memory".to_owned(),
            Arc::new(RecordingPlugin(Arc::clone(&recorder))),
        );

        let manager = OutputManager::from_content(
            &Content::from(json!([{"name": "memory"}, {"name": "memory"}])),
            &plugins,
        )
        .unwrap();
        assert_eq!(manager.len(), 2);

        manager.write(&Content::from("pikachu")).unwrap();
        assert_eq!(*recorder.seen.lock(), [Content::from("pikachu"), Content::from("pikachu")]);
    }

    #[test]
    fn registered_stdout_plugin_opens() {
        let manager = OutputManager::from_registered(&Content::from(json!({"name": "stdout"}))).unwrap();
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn unknown_plugin_fails() {
        let err = OutputManager::from_content(&Content::from(json!({"name": "kafka"})), &PluginMap::new())
            .unwrap_err();
        assert!(matches!(err, OutputError::UnknownPlugin { .. }));
    }
}
