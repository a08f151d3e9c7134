//! Schema of one entry of the `log` section.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::error::TelemetryError;

/// One log handler: where events go and which of them are kept.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogHandlerConfig {
    /// Destination of formatted events.
    pub sink: Sink,
    /// Minimum level written by this handler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<LogLevel>,
    /// Line layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<LogFormat>,
    /// Extra `target=level` directives, in env-filter syntax.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Whether to emit ANSI colours.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colorize: Option<bool>,
    /// Address of a [`LogSink`](crate::LogSink), required when `sink` is
    /// `"custom"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_sink: Option<String>,
}

impl LogHandlerConfig {
    /// Creates a handler writing to `sink` with every option left unset.
    #[must_use]
    pub const fn new(sink: Sink) -> Self {
        Self {
            sink,
            level: None,
            format: None,
            filter: None,
            colorize: None,
            custom_sink: None,
        }
    }

    /// Creates a handler writing to the sink found at `address`.
    #[must_use]
    pub fn custom(address: impl Into<String>) -> Self {
        Self {
            custom_sink: Some(address.into()),
            ..Self::new(Sink::Custom)
        }
    }
}

/// Destination of a log handler.
///
/// Written as `"stdout"`, `"stderr"`, `"custom"`, or any other string, which
/// is taken as a file path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Sink {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
    /// Sink loaded from the handler's `custom_sink` address.
    Custom,
    /// File opened in append mode.
    File(PathBuf),
}

impl From<String> for Sink {
    fn from(value: String) -> Self {
        match value.as_str() {
            "stdout" => Self::Stdout,
            "stderr" => Self::Stderr,
            "custom" => Self::Custom,
            _ => Self::File(PathBuf::from(value)),
        }
    }
}

impl From<Sink> for String {
    fn from(sink: Sink) -> Self {
        sink.to_string()
    }
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
            Self::Custom => f.write_str("custom"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Minimum level of a handler.
///
/// Accepts level names (`trace`, `debug`, `info`, `success`, `warn`,
/// `warning`, `error`, `critical`, `off`, any case) or numeric severities on
/// the scale where 10 is debug and 40 is error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LevelSpec", into = "String")]
pub struct LogLevel(LevelFilter);

#[derive(Deserialize)]
#[serde(untagged)]
enum LevelSpec {
    Severity(i64),
    Name(String),
}

impl LogLevel {
    /// Parses a level name.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Level`] for unknown names.
    pub fn from_name(name: &str) -> Result<Self, TelemetryError> {
        let filter = match name.to_ascii_lowercase().as_str() {
            "trace" => LevelFilter::TRACE,
            "debug" => LevelFilter::DEBUG,
            "info" | "success" => LevelFilter::INFO,
            "warn" | "warning" => LevelFilter::WARN,
            "error" | "critical" => LevelFilter::ERROR,
            "off" => LevelFilter::OFF,
            _ => {
                return Err(TelemetryError::Level {
                    level: name.to_owned(),
                });
            }
        };
        Ok(Self(filter))
    }

    /// Maps a numeric severity onto the nearest level at or below it.
    #[must_use]
    pub const fn from_severity(severity: i64) -> Self {
        let filter = match severity {
            i64::MIN..10 => LevelFilter::TRACE,
            10..20 => LevelFilter::DEBUG,
            20..30 => LevelFilter::INFO,
            30..40 => LevelFilter::WARN,
            _ => LevelFilter::ERROR,
        };
        Self(filter)
    }

    /// The equivalent tracing filter.
    #[must_use]
    pub const fn filter(self) -> LevelFilter {
        self.0
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        Self(LevelFilter::DEBUG)
    }
}

impl TryFrom<LevelSpec> for LogLevel {
    type Error = TelemetryError;

    fn try_from(spec: LevelSpec) -> Result<Self, Self::Error> {
        match spec {
            LevelSpec::Severity(severity) => Ok(Self::from_severity(severity)),
            LevelSpec::Name(name) => Self::from_name(&name),
        }
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level
            .0
            .into_level()
            .map_or_else(|| "off".to_owned(), |level| level.as_str().to_ascii_lowercase())
    }
}

/// Line layout of a handler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Default single-line layout with targets and span context.
    #[default]
    Full,
    /// Shorter single-line layout.
    Compact,
    /// Multi-line human-oriented layout.
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;
    use fold_primitives::Content;
    use serde_json::json;

    fn handler(value: serde_json::Value) -> Result<LogHandlerConfig, serde_json::Error> {
        Content::from(value).deserialize_into()
    }

    #[test]
    fn string_sinks_become_paths() {
        let config = handler(json!({"sink": "foo"})).unwrap();
        assert_eq!(config, LogHandlerConfig::new(Sink::File("foo".into())));

        let config = handler(json!({"sink": "stdin"})).unwrap();
        assert_eq!(config.sink, Sink::File("stdin".into()));
    }

    #[test]
    fn standard_streams_are_recognised() {
        assert_eq!(handler(json!({"sink": "stdout"})).unwrap().sink, Sink::Stdout);
        assert_eq!(handler(json!({"sink": "stderr"})).unwrap().sink, Sink::Stderr);
    }

    #[test]
    fn custom_sink_keeps_its_address() {
        let config = handler(json!({"sink": "custom", "custom_sink": "fold.sinks:Stdout"})).unwrap();
        assert_eq!(config, LogHandlerConfig::custom("fold.sinks:Stdout"));

        let content = Content::from_serialize(&config).unwrap();
        assert_eq!(
            content,
            Content::from(json!({"sink": "custom", "custom_sink": "fold.sinks:Stdout"}))
        );
    }

    #[test]
    fn levels_accept_names_and_numbers() {
        let level = |value: serde_json::Value| handler(json!({"sink": "stdout", "level": value})).unwrap().level;
        assert_eq!(level(json!("WARNING")), Some(LogLevel(LevelFilter::WARN)));
        assert_eq!(level(json!(20)), Some(LogLevel(LevelFilter::INFO)));
        assert_eq!(level(json!(5)), Some(LogLevel(LevelFilter::TRACE)));
        assert_eq!(level(json!(50)), Some(LogLevel(LevelFilter::ERROR)));
        assert!(handler(json!({"sink": "stdout", "level": "loud"})).is_err());
    }

    #[test]
    fn rejects_unknown_fields_and_missing_sink() {
        assert!(handler(json!({"sink": "stdout", "rotation": "daily"})).is_err());
        assert!(handler(json!({"level": "info"})).is_err());
    }

    #[test]
    fn serializes_only_set_fields() {
        let config = handler(json!({"sink": "stderr", "level": 30, "format": "pretty"})).unwrap();
        let content = Content::from_serialize(&config).unwrap();
        assert_eq!(
            content,
            Content::from(json!({"sink": "stderr", "level": "warn", "format": "pretty"}))
        );
    }
}
