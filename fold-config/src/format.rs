//! Text readers turning config files into [`Content`] maps.

use std::sync::Arc;

use fold_plugin::{Export, Interface, Member, Registration};
use fold_primitives::{Content, ContentMap};

use crate::error::FormatError;
use crate::DEFAULT_FORMAT_NAMESPACE;

/// Capability of a config text reader.
pub trait ConfigFormat: Send + Sync {
    /// Name used in diagnostics and to order discovered readers.
    fn name(&self) -> &str;

    /// File extensions claimed by the reader, without the leading dot.
    fn extensions(&self) -> &[&str];

    /// Parses a whole document.
    ///
    /// # Errors
    ///
    /// Returns a [`FormatError`] when the text is not valid for this format or
    /// its top level is not a map.
    fn from_text(&self, text: &str) -> Result<ContentMap, FormatError>;

    /// Returns `true` when the reader claims `extension` (case-insensitive).
    fn claims(&self, extension: &str) -> bool {
        self.extensions()
            .iter()
            .any(|claimed| claimed.eq_ignore_ascii_case(extension))
    }
}

/// JSON reader.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonFormat;

impl ConfigFormat for JsonFormat {
    fn name(&self) -> &str {
        "json"
    }

    fn extensions(&self) -> &[&str] {
        &["json"]
    }

    fn from_text(&self, text: &str) -> Result<ContentMap, FormatError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|err| FormatError::new(self.name(), err))?;
        Content::from(value).into_map().map_err(|other| {
            FormatError::new(self.name(), format!("top level is a {}, not a map", other.kind()))
        })
    }
}

/// TOML reader. Datetimes are kept as their RFC 3339 strings.
#[derive(Clone, Copy, Debug, Default)]
pub struct TomlFormat;

impl ConfigFormat for TomlFormat {
    fn name(&self) -> &str {
        "toml"
    }

    fn extensions(&self) -> &[&str] {
        &["toml"]
    }

    fn from_text(&self, text: &str) -> Result<ContentMap, FormatError> {
        let table: toml::Table =
            toml::from_str(text).map_err(|err| FormatError::new(self.name(), err))?;
        Ok(table
            .into_iter()
            .map(|(key, value)| (key, toml_content(value)))
            .collect())
    }
}

fn toml_content(value: toml::Value) -> Content {
    match value {
        toml::Value::String(value) => Content::String(value),
        toml::Value::Integer(value) => Content::Integer(value),
        toml::Value::Float(value) => Content::Float(value),
        toml::Value::Boolean(value) => Content::Bool(value),
        toml::Value::Datetime(value) => Content::String(value.to_string()),
        toml::Value::Array(items) => Content::List(items.into_iter().map(toml_content).collect()),
        toml::Value::Table(table) => Content::Map(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_content(value)))
                .collect(),
        ),
    }
}

fn json_format() -> Member {
    Member::Object(Export::of::<dyn ConfigFormat>(Arc::new(JsonFormat)))
}

fn toml_format() -> Member {
    Member::Object(Export::of::<dyn ConfigFormat>(Arc::new(TomlFormat)))
}

fn format_marker() -> Member {
    Member::Interface(Interface::of::<dyn ConfigFormat>())
}

inventory::submit! {
    Registration::new(DEFAULT_FORMAT_NAMESPACE, "ConfigFormat", format_marker)
}

inventory::submit! {
    Registration::new(DEFAULT_FORMAT_NAMESPACE, "JsonFormat", json_format)
}

inventory::submit! {
    Registration::new(DEFAULT_FORMAT_NAMESPACE, "TomlFormat", toml_format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn content(value: serde_json::Value) -> ContentMap {
        Content::from(value).into_map().unwrap()
    }

    fn parse_toml(text: &str) -> ContentMap {
        TomlFormat.from_text(text).unwrap()
    }

    #[test]
    fn json_reads_nested_maps() {
        let parsed = JsonFormat
            .from_text(r#"{"pokemon": {"pikachu": "electric"}}"#)
            .unwrap();
        assert_eq!(parsed, content(json!({"pokemon": {"pikachu": "electric"}})));
        assert!(matches!(parsed.get("pokemon"), Some(Content::Map(_))));
    }

    #[test]
    fn json_preserves_list_order() {
        let parsed = JsonFormat
            .from_text(
                r#"{"employee": [
                    {"name": "Batman", "occupation": "superhero"},
                    {"name": "Bruce Wayne", "occupation": "CEO"}
                ]}"#,
            )
            .unwrap();
        assert_eq!(
            parsed,
            content(json!({"employee": [
                {"name": "Batman", "occupation": "superhero"},
                {"name": "Bruce Wayne", "occupation": "CEO"}
            ]}))
        );
    }

    #[test]
    fn json_rejects_non_map_top_level() {
        let err = JsonFormat.from_text("[1, 2]").unwrap_err();
        assert_eq!(err.format(), "json");
        assert!(JsonFormat.from_text("").is_err());
    }

    #[test]
    fn toml_empty_file_is_empty_map() {
        assert!(parse_toml("").is_empty());
    }

    #[test]
    fn toml_reads_tables_and_lists() {
        let parsed = parse_toml(
            r#"
            shapes = ["square", "circle"]

            [pokemon]
            pikachu = "electric"
            mew = "psychic"
            "#,
        );
        assert_eq!(
            parsed,
            content(json!({
                "shapes": ["square", "circle"],
                "pokemon": {"pikachu": "electric", "mew": "psychic"}
            }))
        );
    }

    #[test]
    fn toml_nests_dotted_tables() {
        let parsed = parse_toml(
            r#"
            [car]
            make = "Honda"
            model = "Civic"

            [car.position]
            x = 1
            y = 2
            "#,
        );
        assert_eq!(
            parsed,
            content(json!({"car": {"make": "Honda", "model": "Civic", "position": {"x": 1, "y": 2}}}))
        );
    }

    #[test]
    fn toml_array_of_tables_keeps_order() {
        let parsed = parse_toml(
            r#"
            [[employee]]
            name = "Batman"
            occupation = "superhero"

            [[employee]]
            name = "Bruce Wayne"
            occupation = "CEO"
            "#,
        );
        assert_eq!(
            parsed,
            content(json!({"employee": [
                {"name": "Batman", "occupation": "superhero"},
                {"name": "Bruce Wayne", "occupation": "CEO"}
            ]}))
        );
    }

    #[test]
    fn toml_datetimes_become_strings() {
        let parsed = parse_toml("born = 1979-05-27T07:32:00Z");
        assert_eq!(parsed.get("born"), Some(&Content::from("1979-05-27T07:32:00Z")));
    }

    #[test]
    fn toml_rejects_json_objects() {
        assert!(TomlFormat.from_text(r#"{"foo": "bar"}"#).is_err());
    }

    #[test]
    fn extensions_match_case_insensitively() {
        assert!(JsonFormat.claims("JSON"));
        assert!(!JsonFormat.claims("toml"));
        assert!(TomlFormat.claims("toml"));
    }
}
