//! Format-agnostic configuration values.

use std::fmt::{self, Display, Formatter};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// String-keyed map that remembers insertion order.
pub type ContentMap = IndexMap<String, Content>;

/// Recursive value produced by every config reader and consumed by section
/// handlers.
///
/// Maps keep their insertion order, so documents are walked and re-emitted in
/// the order their keys were written.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    /// Absence of a value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Integer(i64),
    /// Floating point value.
    Float(f64),
    /// UTF-8 string value.
    String(String),
    /// Ordered list of values.
    List(Vec<Content>),
    /// Ordered string-keyed map of values.
    Map(ContentMap),
}

impl Content {
    /// Short name of the variant, used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Returns `true` for [`Content::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the string slice if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the boolean if this is a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the integer if this is an integer.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns a float view of any numeric value.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the items if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Content]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries if this is a map.
    #[must_use]
    pub const fn as_map(&self) -> Option<&ContentMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Consumes the value, returning the entries if this is a map.
    ///
    /// # Errors
    ///
    /// Gives the value back unchanged when it is not a map.
    pub fn into_map(self) -> Result<ContentMap, Self> {
        match self {
            Self::Map(map) => Ok(map),
            other => Err(other),
        }
    }

    /// Looks up a key when this is a map.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Content> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Deserializes the value into a typed structure.
    ///
    /// # Errors
    ///
    /// Returns the [`serde_json::Error`] raised when the value does not match
    /// the shape of `T`.
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(Value::from(self.clone()))
    }

    /// Builds a value from any serializable structure.
    ///
    /// # Errors
    ///
    /// Returns the [`serde_json::Error`] raised while serializing `value`.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Self::from)
    }
}

impl Display for Content {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(value) => f.write_str(value),
            other => {
                let rendered = serde_json::to_string(other).map_err(|_| fmt::Error)?;
                f.write_str(&rendered)
            }
        }
    }
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(value) => Self::Bool(value),
            Value::Number(number) => number.as_i64().map_or_else(
                || Self::Float(number.as_f64().unwrap_or(f64::NAN)),
                Self::Integer,
            ),
            Value::String(value) => Self::String(value),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<Content> for Value {
    fn from(value: Content) -> Self {
        match value {
            Content::Null => Self::Null,
            Content::Bool(value) => Self::Bool(value),
            Content::Integer(value) => Self::from(value),
            Content::Float(value) => serde_json::Number::from_f64(value).map_or(Self::Null, Self::Number),
            Content::String(value) => Self::String(value),
            Content::List(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Content::Map(entries) => Self::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Content {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Content {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Content {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Content {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Content {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<Content>> for Content {
    fn from(items: Vec<Content>) -> Self {
        Self::List(items)
    }
}

impl From<ContentMap> for Content {
    fn from(entries: ContentMap) -> Self {
        Self::Map(entries)
    }
}

impl FromIterator<(String, Content)> for Content {
    fn from_iter<I: IntoIterator<Item = (String, Content)>>(iter: I) -> Self {
        Self::Map(iter.into_iter().collect())
    }
}
