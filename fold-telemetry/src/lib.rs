//! Log configuration for fold.
//!
//! The `log` config section lists one or more handlers, each naming a sink
//! (`stdout`, `stderr`, `custom`, or a file path) and optionally a level, a
//! line format, env-filter directives, and colouring:
//!
//! ```toml
//! [[log]]
//! sink = "stderr"
//! level = "info"
//!
//! [[log]]
//! sink = "fold.log"
//! level = 10
//! format = "compact"
//!
//! [[log]]
//! sink = "custom"
//! custom_sink = "fold.sinks:Stdout"
//! ```
//!
//! A `custom` sink is loaded by address as a [`LogSink`]; the built-in ones
//! live in [`DEFAULT_SINK_NAMESPACE`].
//!
//! [`LogSection`] validates that content during dispatch; [`LogManager`]
//! turns it into a `tracing` subscriber.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod handler;
mod manager;
mod sink;

pub use error::{TelemetryError, TelemetryResult};
pub use handler::{LogFormat, LogHandlerConfig, LogLevel, Sink};
pub use manager::{BoxedLayer, LOG_SECTION, LogManager, LogSection, LogSubscriber};
pub use sink::{DEFAULT_SINK_NAMESPACE, LogSink, StderrSink, StdoutSink, registered_sinks};
