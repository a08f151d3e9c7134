//! Best-effort parsing of config text with a set of candidate readers.

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use fold_plugin::CapabilityRegistry;
use tracing::{debug, trace, warn};

use crate::document::Document;
use crate::error::{ConfigError, ConfigResult, FormatError};
use crate::format::{ConfigFormat, JsonFormat, TomlFormat};
use crate::DEFAULT_FORMAT_NAMESPACE;

const TEXT_EXCERPT_CHARS: usize = 64;

/// Parses config text by trying every known reader until one succeeds.
///
/// When the source extension is known, readers claiming it are tried first;
/// the remaining readers are tried only if all of those fail.
#[derive(Clone)]
pub struct ConfigLoader {
    formats: Vec<Arc<dyn ConfigFormat>>,
}

impl fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.formats.iter().map(|format| format.name()).collect();
        f.debug_struct("ConfigLoader").field("formats", &names).finish()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new([
            Arc::new(JsonFormat) as Arc<dyn ConfigFormat>,
            Arc::new(TomlFormat),
        ])
    }
}

impl ConfigLoader {
    /// Creates a loader trying `formats` in the given order.
    #[must_use]
    pub fn new(formats: impl IntoIterator<Item = Arc<dyn ConfigFormat>>) -> Self {
        Self {
            formats: formats.into_iter().collect(),
        }
    }

    /// Builds a loader from every reader registered in the default format
    /// namespace.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Plugin`] when the namespace cannot be resolved.
    pub fn discover(registry: &CapabilityRegistry<dyn ConfigFormat>) -> ConfigResult<Self> {
        Self::discover_in(registry, DEFAULT_FORMAT_NAMESPACE)
    }

    /// Builds a loader from every reader found in `namespace`, ordered by
    /// reader name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Plugin`] when the namespace cannot be resolved.
    pub fn discover_in(
        registry: &CapabilityRegistry<dyn ConfigFormat>,
        namespace: &str,
    ) -> ConfigResult<Self> {
        let mut formats = registry.discover(namespace, true)?;
        formats.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(Self::new(formats))
    }

    /// Readers in the order they are tried.
    #[must_use]
    pub fn formats(&self) -> &[Arc<dyn ConfigFormat>] {
        &self.formats
    }

    /// Parses `text`, preferring readers that claim `extension`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when no reader accepts the text. The
    /// error names the source by an escaped excerpt of the text.
    pub fn from_text(&self, text: &str, extension: Option<&str>) -> ConfigResult<Document> {
        self.parse(text, &excerpt(text), extension)
    }

    /// Reads and parses a file, using its extension to pick the first readers
    /// to try.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read and
    /// [`ConfigError::Parse`], naming the path, when no reader accepts it.
    pub fn from_path(&self, path: impl AsRef<Path>) -> ConfigResult<Document> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);
        self.parse(&text, &path.display().to_string(), extension.as_deref())
    }

    fn parse(
        &self,
        text: &str,
        source_name: &str,
        extension: Option<&str>,
    ) -> ConfigResult<Document> {
        let (preferred, remaining): (Vec<_>, Vec<_>) = match extension {
            Some(extension) => self
                .formats
                .iter()
                .partition(|format| format.claims(extension)),
            None => (Vec::new(), self.formats.iter().collect()),
        };

        let mut failures = Vec::new();
        for pass in [preferred, remaining] {
            if pass.is_empty() {
                continue;
            }
            match try_formats(&pass, text, &mut failures) {
                Some(document) => return Ok(document),
                None => warn!(
                    source = source_name,
                    tried = pass.len(),
                    "config readers failed, widening search"
                ),
            }
        }

        Err(ConfigError::Parse {
            source_name: source_name.to_owned(),
            failures,
        })
    }
}

fn excerpt(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(TEXT_EXCERPT_CHARS).collect();
    let mut excerpt = head.escape_debug().to_string();
    if chars.next().is_some() {
        excerpt.push_str("...");
    }
    excerpt
}

fn try_formats(
    formats: &[&Arc<dyn ConfigFormat>],
    text: &str,
    failures: &mut Vec<FormatError>,
) -> Option<Document> {
    for format in formats {
        match format.from_text(text) {
            Ok(map) => {
                debug!(format = format.name(), sections = map.len(), "config parsed");
                return Some(Document::from(map));
            }
            Err(err) => {
                trace!(format = format.name(), error = %err, "config reader rejected text");
                failures.push(err);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use fold_primitives::{Content, ContentMap};

    struct Rejecting {
        calls: AtomicUsize,
    }

    impl ConfigFormat for Rejecting {
        fn name(&self) -> &str {
            "rejecting"
        }

        fn extensions(&self) -> &[&str] {
            &["json"]
        }

        fn from_text(&self, _text: &str) -> Result<ContentMap, FormatError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(FormatError::new(self.name(), "always fails"))
        }
    }

    fn pokemon() -> Document {
        let mut inner = ContentMap::new();
        inner.insert("pikachu".into(), Content::from("electric"));
        [("pokemon".to_owned(), Content::from(inner))]
            .into_iter()
            .collect()
    }

    #[test]
    fn parses_json_without_hint() {
        let document = ConfigLoader::default()
            .from_text(r#"{"pokemon":{"pikachu":"electric"}}"#, None)
            .unwrap();
        assert_eq!(document, pokemon());
    }

    #[test]
    fn falls_back_when_hint_is_wrong() {
        let document = ConfigLoader::default()
            .from_text(r#"{"pokemon":{"pikachu":"electric"}}"#, Some("toml"))
            .unwrap();
        assert_eq!(document, pokemon());
    }

    #[test]
    fn preferred_readers_run_first() {
        let rejecting = Arc::new(Rejecting {
            calls: AtomicUsize::new(0),
        });
        let loader = ConfigLoader::new([
            Arc::new(TomlFormat) as Arc<dyn ConfigFormat>,
            Arc::clone(&rejecting) as Arc<dyn ConfigFormat>,
        ]);

        let document = loader.from_text("[pokemon]\npikachu = \"electric\"", Some("json")).unwrap();
        assert_eq!(document, pokemon());
        assert_eq!(rejecting.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn aggregates_every_failure() {
        let err = ConfigLoader::default()
            .from_text("not = [valid", Some("toml"))
            .unwrap_err();
        match err {
            ConfigError::Parse {
                source_name,
                failures,
            } => {
                assert_eq!(source_name, "not = [valid");
                let formats: Vec<_> = failures.iter().map(FormatError::format).collect();
                assert_eq!(formats, ["toml", "json"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parse_error_names_the_text() {
        let err = ConfigLoader::default()
            .from_text("pokemon: pikachu", None)
            .unwrap_err();
        assert!(err.to_string().contains("pokemon: pikachu"), "{err}");

        let long = format!("pokemon:\n{}", "x".repeat(200));
        let err = ConfigLoader::default().from_text(&long, None).unwrap_err();
        match err {
            ConfigError::Parse { source_name, .. } => {
                assert!(source_name.starts_with("pokemon:\\n"), "{source_name}");
                assert!(source_name.ends_with("..."));
                assert!(source_name.len() < long.len());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_loader_fails() {
        let err = ConfigLoader::new([]).from_text("{}", None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref failures, .. } if failures.is_empty()));
    }

    #[test]
    fn reads_files_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".TOML").tempfile().unwrap();
        writeln!(file, "[pokemon]\npikachu = \"electric\"").unwrap();

        let document = ConfigLoader::default().from_path(file.path()).unwrap();
        assert_eq!(document, pokemon());
    }

    #[test]
    fn parse_error_names_the_path() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "pokemon: pikachu").unwrap();

        let err = ConfigLoader::default().from_path(file.path()).unwrap_err();
        assert!(
            matches!(err, ConfigError::Parse { ref source_name, .. } if source_name == &file.path().display().to_string())
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::default()
            .from_path(dir.path().join("absent.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn discovers_registered_readers() {
        let registry = CapabilityRegistry::<dyn ConfigFormat>::with_registered();
        let loader = ConfigLoader::discover(&registry).unwrap();
        let names: Vec<_> = loader.formats().iter().map(|format| format.name()).collect();
        assert_eq!(names, ["json", "toml"]);
    }
}
