//! Turning a parsed `log` section into a tracing subscriber.

use std::fs::OpenOptions;
use std::io::{self, IsTerminal};
use std::sync::Arc;

use fold_config::{DEFAULT_SECTION_NAMESPACE, SectionError, SectionHandler};
use fold_plugin::{CapabilityRegistry, Export, Member, Registration};
use fold_primitives::Content;
use tracing::{Subscriber, debug};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::registry::{LookupSpan, Registry};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::error::{TelemetryError, TelemetryResult};
use crate::handler::{LogFormat, LogHandlerConfig, Sink};
use crate::sink::{LogSink, registered_sinks};

/// Name of the config section handled by [`LogSection`].
pub const LOG_SECTION: &str = "log";

/// A boxed per-handler layer over the registry.
pub type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Subscriber assembled from a `log` section.
pub type LogSubscriber = Layered<Vec<BoxedLayer>, Registry>;

/// Validated set of log handlers.
///
/// Custom sinks are loaded through a sink registry, the shared
/// [`registered_sinks`](crate::registered_sinks) one unless another is given.
#[derive(Clone, Debug)]
pub struct LogManager {
    handlers: Vec<LogHandlerConfig>,
    sinks: Arc<CapabilityRegistry<dyn LogSink>>,
}

impl LogManager {
    /// Creates a manager from typed handlers.
    #[must_use]
    pub fn new(handlers: Vec<LogHandlerConfig>) -> Self {
        Self::with_sinks(handlers, registered_sinks())
    }

    /// Creates a manager loading custom sinks from `sinks`.
    #[must_use]
    pub fn with_sinks(
        handlers: Vec<LogHandlerConfig>,
        sinks: Arc<CapabilityRegistry<dyn LogSink>>,
    ) -> Self {
        Self { handlers, sinks }
    }

    /// Validates raw or already parsed `log` section content.
    ///
    /// # Errors
    ///
    /// See [`from_content_with`](Self::from_content_with).
    pub fn from_content(content: &Content) -> TelemetryResult<Self> {
        Self::from_content_with(content, registered_sinks())
    }

    /// Validates `log` section content, loading custom sinks from `sinks`.
    ///
    /// A single map is treated as a one-element list.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Shape`] for content that is neither a map nor
    /// a list, [`TelemetryError::Schema`] for entries that do not match
    /// [`LogHandlerConfig`], [`TelemetryError::Filter`] for unparsable filter
    /// directives, and [`TelemetryError::MissingCustomSink`] or
    /// [`TelemetryError::CustomSink`] for custom sinks that cannot be loaded.
    pub fn from_content_with(
        content: &Content,
        sinks: Arc<CapabilityRegistry<dyn LogSink>>,
    ) -> TelemetryResult<Self> {
        let handlers = match content {
            Content::Map(_) => vec![content.deserialize_into::<LogHandlerConfig>()?],
            Content::List(items) => items
                .iter()
                .map(Content::deserialize_into::<LogHandlerConfig>)
                .collect::<Result<Vec<_>, _>>()?,
            other => return Err(TelemetryError::Shape { kind: other.kind() }),
        };
        let manager = Self::with_sinks(handlers, sinks);
        for handler in &manager.handlers {
            env_filter(handler)?;
            if handler.sink == Sink::Custom {
                manager.custom_sink(handler)?;
            }
        }
        Ok(manager)
    }

    /// Handlers in section order.
    #[must_use]
    pub fn handlers(&self) -> &[LogHandlerConfig] {
        &self.handlers
    }

    /// Normalised section content: a list with only the fields that were set.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Schema`] if a handler cannot be serialized.
    pub fn to_content(&self) -> TelemetryResult<Content> {
        Ok(Content::from_serialize(&self.handlers)?)
    }

    /// Builds a subscriber with one formatting layer per handler.
    ///
    /// File sinks are opened here, in append mode.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Sink`] when a file cannot be opened,
    /// [`TelemetryError::Filter`] for unparsable filter directives, and the
    /// custom sink errors of [`from_content_with`](Self::from_content_with).
    pub fn subscriber(&self) -> TelemetryResult<LogSubscriber> {
        let layers = self
            .handlers
            .iter()
            .map(|handler| self.build_layer(handler))
            .collect::<TelemetryResult<Vec<_>>>()?;
        Ok(tracing_subscriber::registry().with(layers))
    }

    /// Installs the subscriber as the global default.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::AlreadyInitialized`] when a global subscriber
    /// is already set, or any error of [`subscriber`](Self::subscriber).
    pub fn configure(&self) -> TelemetryResult<()> {
        self.subscriber()?
            .try_init()
            .map_err(TelemetryError::AlreadyInitialized)?;
        debug!(handlers = self.handlers.len(), "log handlers installed");
        Ok(())
    }

    fn custom_sink(&self, handler: &LogHandlerConfig) -> TelemetryResult<Arc<dyn LogSink>> {
        let address = handler
            .custom_sink
            .as_deref()
            .ok_or(TelemetryError::MissingCustomSink)?;
        self.sinks
            .load(address, true)
            .map_err(|source| TelemetryError::CustomSink {
                address: address.to_owned(),
                source,
            })
    }

    fn build_layer(&self, handler: &LogHandlerConfig) -> TelemetryResult<BoxedLayer> {
        let filter = env_filter(handler)?;
        let layer = match &handler.sink {
            Sink::Stdout => {
                let ansi = handler.colorize.unwrap_or_else(|| io::stdout().is_terminal());
                format_layer(io::stdout, ansi, handler.format, filter)
            }
            Sink::Stderr => {
                let ansi = handler.colorize.unwrap_or_else(|| io::stderr().is_terminal());
                format_layer(io::stderr, ansi, handler.format, filter)
            }
            Sink::Custom => {
                let sink = self.custom_sink(handler)?;
                let ansi = handler.colorize.unwrap_or_else(|| sink.is_terminal());
                format_layer(sink.make_writer(), ansi, handler.format, filter)
            }
            Sink::File(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|source| TelemetryError::Sink {
                        path: path.clone(),
                        source,
                    })?;
                let ansi = handler.colorize.unwrap_or(false);
                format_layer(Arc::new(file), ansi, handler.format, filter)
            }
        };
        Ok(layer)
    }
}

fn env_filter(handler: &LogHandlerConfig) -> TelemetryResult<EnvFilter> {
    let level = handler.level.unwrap_or_default().filter();
    let directive = handler.filter.as_deref().unwrap_or_default();
    EnvFilter::builder()
        .with_default_directive(level.into())
        .parse(directive)
        .map_err(|source| TelemetryError::Filter {
            directive: directive.to_owned(),
            source,
        })
}

fn format_layer<S, W>(
    writer: W,
    ansi: bool,
    format: Option<LogFormat>,
    filter: EnvFilter,
) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer().with_writer(writer).with_ansi(ansi);
    match format.unwrap_or_default() {
        LogFormat::Full => layer.with_filter(filter).boxed(),
        LogFormat::Compact => layer.compact().with_filter(filter).boxed(),
        LogFormat::Pretty => layer.pretty().with_filter(filter).boxed(),
    }
}

/// Handler of the `log` config section.
///
/// Parsing validates every entry and returns the normalised list; it does not
/// install anything. Pass the parsed content to [`LogManager::from_content`]
/// to build or install the subscriber.
#[derive(Clone, Default)]
pub struct LogSection {
    sinks: Option<Arc<CapabilityRegistry<dyn LogSink>>>,
}

impl std::fmt::Debug for LogSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSection")
            .field("registered_sinks", &self.sinks.is_none())
            .finish()
    }
}

impl LogSection {
    /// Creates a handler loading custom sinks from `sinks`.
    ///
    /// The default handler uses [`registered_sinks`](crate::registered_sinks),
    /// fetched when a section is first parsed.
    #[must_use]
    pub fn new(sinks: Arc<CapabilityRegistry<dyn LogSink>>) -> Self {
        Self { sinks: Some(sinks) }
    }

    fn sinks(&self) -> Arc<CapabilityRegistry<dyn LogSink>> {
        self.sinks.clone().unwrap_or_else(registered_sinks)
    }
}

impl SectionHandler for LogSection {
    fn name(&self) -> &str {
        LOG_SECTION
    }

    fn parse(&self, content: Content) -> Result<Content, SectionError> {
        let manager = LogManager::from_content_with(&content, self.sinks())
            .map_err(anyhow::Error::from)?;
        Ok(manager.to_content().map_err(anyhow::Error::from)?)
    }
}

fn log_section() -> Member {
    Member::Object(Export::of::<dyn SectionHandler>(Arc::new(LogSection::default())))
}

inventory::submit! {
    Registration::new(DEFAULT_SECTION_NAMESPACE, "LogSection", log_section)
}
