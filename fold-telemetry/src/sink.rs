//! Log sinks resolved from an address.
//!
//! A handler written as `sink = "custom"` names its destination through
//! `custom_sink`, an address such as `fold.sinks:Stderr` that is loaded with a
//! [`CapabilityRegistry<dyn LogSink>`](fold_plugin::CapabilityRegistry).

use std::io::{self, IsTerminal};
use std::sync::{Arc, OnceLock};

use fold_plugin::{CapabilityRegistry, Export, Interface, Member, Registration};
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// Namespace holding the built-in log sinks.
pub const DEFAULT_SINK_NAMESPACE: &str = "fold.sinks";

/// Shared registry over every log sink registered through `inventory`.
#[must_use]
pub fn registered_sinks() -> Arc<CapabilityRegistry<dyn LogSink>> {
    static SINKS: OnceLock<Arc<CapabilityRegistry<dyn LogSink>>> = OnceLock::new();
    Arc::clone(SINKS.get_or_init(|| Arc::new(CapabilityRegistry::with_registered())))
}

/// Destination of formatted log lines.
pub trait LogSink: Send + Sync {
    /// Returns a writer factory for one formatting layer.
    fn make_writer(&self) -> BoxMakeWriter;

    /// Whether the destination is a terminal, used when `colorize` is unset.
    fn is_terminal(&self) -> bool {
        false
    }
}

/// Writes to standard output.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn make_writer(&self) -> BoxMakeWriter {
        BoxMakeWriter::new(io::stdout)
    }

    fn is_terminal(&self) -> bool {
        io::stdout().is_terminal()
    }
}

/// Writes to standard error.
#[derive(Clone, Copy, Debug, Default)]
pub struct StderrSink;

impl LogSink for StderrSink {
    fn make_writer(&self) -> BoxMakeWriter {
        BoxMakeWriter::new(io::stderr)
    }

    fn is_terminal(&self) -> bool {
        io::stderr().is_terminal()
    }
}

fn sink_marker() -> Member {
    Member::Interface(Interface::of::<dyn LogSink>())
}

fn stdout_sink() -> Member {
    Member::Object(Export::of::<dyn LogSink>(Arc::new(StdoutSink)))
}

fn stderr_sink() -> Member {
    Member::Object(Export::of::<dyn LogSink>(Arc::new(StderrSink)))
}

inventory::submit! {
    Registration::new(DEFAULT_SINK_NAMESPACE, "LogSink", sink_marker)
}

inventory::submit! {
    Registration::new(DEFAULT_SINK_NAMESPACE, "Stdout", stdout_sink)
}

inventory::submit! {
    Registration::new(DEFAULT_SINK_NAMESPACE, "Stderr", stderr_sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fold_plugin::PluginError;

    #[test]
    fn builtin_sinks_are_registered() {
        let registry = CapabilityRegistry::<dyn LogSink>::with_registered();
        assert_eq!(registry.discover(DEFAULT_SINK_NAMESPACE, true).unwrap().len(), 2);
        assert!(registry.load("fold.sinks:Stderr", true).is_ok());

        let err = registry.load("fold.sinks:LogSink", true).err().unwrap();
        assert!(matches!(err, PluginError::CapabilityMismatch { .. }));
    }

    #[test]
    fn registered_sinks_are_shared() {
        let first = registered_sinks();
        first.load("fold.sinks:Stdout", true).unwrap();
        assert!(Arc::ptr_eq(&first, &registered_sinks()));
        assert!(registered_sinks().is_cached("fold.sinks:Stdout"));
    }
}
