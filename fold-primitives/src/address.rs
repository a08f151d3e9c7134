//! Address strings in `<module>:<object>` notation.
//!
//! The module side may carry leading dots marking a relative path
//! (`.sibling:Thing`). Both sides are normalised by re-extracting their
//! identifier tokens, so `module.` and `module` name the same module and
//! `module:.object.` names the same object as `module:object`.
//!
//! ```
//! use fold_primitives::Address;
//!
//! let address: Address = "json:decoder.JSONDecodeError".parse().unwrap();
//! assert_eq!(address.module().to_string(), "json");
//!
//! let object = address.object().unwrap();
//! assert_eq!(object.head(), "decoder");
//! assert_eq!(object.attributes(), ["JSONDecodeError"]);
//! ```

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const MODULE_SEPARATOR: char = ':';
const PATH_SEPARATOR: char = '.';

fn is_identifier_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

fn is_path_char(c: char) -> bool {
    is_identifier_char(c) || c == PATH_SEPARATOR
}

/// Longest prefix made only of identifier characters and dots.
fn path_prefix(input: &str) -> &str {
    let end = input.find(|c| !is_path_char(c)).unwrap_or(input.len());
    &input[..end]
}

fn identifiers(raw: &str) -> Vec<String> {
    raw.split(|c| !is_identifier_char(c))
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}

/// A parsed address: a module path plus an optional object path.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    module: ModulePath,
    object: Option<ObjectPath>,
}

impl Address {
    /// Parses an address string.
    ///
    /// Characters that are neither identifier characters nor dots end the
    /// module side; everything past the object side is ignored. An empty or
    /// dot-only object side means the whole module was requested.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AddressSyntax`] when the string does not start with a
    /// module containing at least one identifier (for example `":module"`).
    pub fn parse(address: &str) -> Result<Self> {
        let raw_module = path_prefix(address);
        if raw_module.is_empty() {
            return Err(Error::address(address, "missing module name"));
        }

        let level = raw_module.len() - raw_module.trim_start_matches(PATH_SEPARATOR).len();
        let segments = identifiers(raw_module);
        if segments.is_empty() {
            return Err(Error::address(address, "module name has no identifier"));
        }

        let object = address[raw_module.len()..]
            .strip_prefix(MODULE_SEPARATOR)
            .map(path_prefix)
            .and_then(|raw| ObjectPath::from_tokens(identifiers(raw)));

        Ok(Self {
            module: ModulePath { level, segments },
            object,
        })
    }

    /// Returns the module part of the address.
    #[must_use]
    pub fn module(&self) -> &ModulePath {
        &self.module
    }

    /// Returns the object part, if one was requested.
    #[must_use]
    pub fn object(&self) -> Option<&ObjectPath> {
        self.object.as_ref()
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.module, f)?;
        if let Some(object) = &self.object {
            write!(f, "{MODULE_SEPARATOR}{object}")?;
        }
        Ok(())
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_string()
    }
}

/// Module side of an address.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ModulePath {
    level: usize,
    segments: Vec<String>,
}

impl ModulePath {
    /// Number of leading dots; zero for absolute paths.
    #[must_use]
    pub const fn level(&self) -> usize {
        self.level
    }

    /// Returns `true` when the path is relative to an anchor package.
    #[must_use]
    pub const fn is_relative(&self) -> bool {
        self.level > 0
    }

    /// Identifier segments, without the relative marker.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Resolves the path against an anchor package.
    ///
    /// Absolute paths are returned unchanged. A path with `n` leading dots
    /// drops `n - 1` trailing segments of `package` before appending its own
    /// segments. Returns `None` when a relative path has no usable anchor or
    /// climbs above the package root.
    #[must_use]
    pub fn absolute(&self, package: Option<&str>) -> Option<String> {
        let joined = self.segments.join(".");
        if self.level == 0 {
            return Some(joined);
        }

        let package = identifiers(package?);
        if package.len() < self.level {
            return None;
        }
        let base = package[..package.len() - (self.level - 1)].join(".");
        Some(format!("{base}.{joined}"))
    }
}

impl Display for ModulePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for _ in 0..self.level {
            f.write_str(".")?;
        }
        f.write_str(&self.segments.join("."))
    }
}

/// Object side of an address: a head name followed by an attribute chain.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ObjectPath {
    head: String,
    attributes: Vec<String>,
}

impl ObjectPath {
    /// Splits an object path such as `decoder.JSONDecodeError` into its head
    /// name and attribute chain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ObjectPathSyntax`] if the path holds no identifier.
    pub fn parse(path: &str) -> Result<Self> {
        Self::from_tokens(identifiers(path)).ok_or_else(|| Error::ObjectPathSyntax {
            path: path.to_owned(),
        })
    }

    fn from_tokens(mut tokens: Vec<String>) -> Option<Self> {
        if tokens.is_empty() {
            return None;
        }
        let head = tokens.remove(0);
        Some(Self {
            head,
            attributes: tokens,
        })
    }

    /// The first name looked up on the module.
    #[must_use]
    pub fn head(&self) -> &str {
        &self.head
    }

    /// Attributes walked after the head, in order.
    #[must_use]
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Iterates over the head followed by every attribute.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.head.as_str()).chain(self.attributes.iter().map(String::as_str))
    }
}

impl Display for ObjectPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.head)?;
        for attribute in &self.attributes {
            write!(f, ".{attribute}")?;
        }
        Ok(())
    }
}

impl FromStr for ObjectPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
