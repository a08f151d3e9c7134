//! The `stdout` output plugin.

use std::io::{self, Write};
use std::sync::Arc;

use fold_plugin::{Export, Member, Registration};
use fold_primitives::Content;
use parking_lot::Mutex;

use crate::error::OutputResult;
use crate::plugin::{Output, OutputPlugin, OutputPluginConfig};
use crate::DEFAULT_OUTPUT_NAMESPACE;

/// Plugin writing each datum as one line on standard output.
///
/// Entries take no options beyond `name`.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutPlugin;

impl OutputPlugin for StdoutPlugin {
    fn name(&self) -> &str {
        "stdout"
    }

    fn parse_config(&self, config: Content) -> OutputResult<Content> {
        let config: OutputPluginConfig = config.deserialize_into()?;
        Ok(Content::from_serialize(&config)?)
    }

    fn create(&self, config: &Content) -> OutputResult<Box<dyn Output>> {
        config.deserialize_into::<OutputPluginConfig>()?;
        Ok(Box::new(LineOutput::new(io::stdout())))
    }
}

/// Writes the display form of each datum followed by a newline.
///
/// Null is written as an empty line.
#[derive(Debug)]
pub struct LineOutput<W> {
    writer: Mutex<W>,
}

impl<W: Write> LineOutput<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> Output for LineOutput<W> {
    fn write(&self, data: &Content) -> OutputResult<()> {
        let mut writer = self.writer.lock();
        if data.is_null() {
            writeln!(writer)?;
        } else {
            writeln!(writer, "{data}")?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn stdout_plugin() -> Member {
    Member::Object(Export::of::<dyn OutputPlugin>(Arc::new(StdoutPlugin)))
}

inventory::submit! {
    Registration::new(DEFAULT_OUTPUT_NAMESPACE, "StdoutPlugin", stdout_plugin)
}
