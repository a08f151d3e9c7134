//! Namespaces of exported members and the loaders that find them.
//!
//! A [`Namespace`] plays the part of a loadable module: a dotted path plus an
//! ordered table of named members. Members are either objects that expose one
//! or more capability views, nested namespaces, or bare capability markers.
//! Namespaces are declared up front, either with [`Namespace::builder`] or by
//! submitting [`Registration`] entries through `inventory`, and served to the
//! resolver by a [`NamespaceLoader`].

use std::any::{Any, TypeId, type_name};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use fold_primitives::Address;
use indexmap::IndexMap;
use tracing::trace;

use crate::error::{PluginError, PluginResult};

/// Members whose name starts with this marker are private and never
/// discovered.
pub const PRIVATE_PREFIX: char = '_';

/// An exported object together with the capability views it provides.
///
/// Each view is stored under the capability's type, so a single object can be
/// resolved through any registry whose capability it implements.
#[derive(Clone, Default)]
pub struct Export {
    views: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
    capabilities: Vec<&'static str>,
}

impl Export {
    /// Creates an export with no capability views.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an export providing a single capability.
    #[must_use]
    pub fn of<C>(object: Arc<C>) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
    {
        Self::new().provide(object)
    }

    /// Adds a capability view, replacing any previous view of the same
    /// capability.
    #[must_use]
    pub fn provide<C>(mut self, object: Arc<C>) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let previous = self.views.insert(TypeId::of::<C>(), Arc::new(object));
        if previous.is_none() {
            self.capabilities.push(type_name::<C>());
        }
        self
    }

    /// Returns the view for capability `C`, if this export provides it.
    #[must_use]
    pub fn view<C>(&self) -> Option<Arc<C>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        self.views
            .get(&TypeId::of::<C>())?
            .downcast_ref::<Arc<C>>()
            .cloned()
    }

    /// Returns `true` when the export provides capability `C`.
    #[must_use]
    pub fn provides<C>(&self) -> bool
    where
        C: ?Sized + 'static,
    {
        self.views.contains_key(&TypeId::of::<C>())
    }

    /// Type names of the provided capabilities, in insertion order.
    #[must_use]
    pub fn capabilities(&self) -> &[&'static str] {
        &self.capabilities
    }
}

impl fmt::Debug for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Export")
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

/// Marker exported for a capability itself.
///
/// Re-exporting the capability alongside its implementations is common; the
/// marker never satisfies a capability check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interface {
    type_id: TypeId,
    type_name: &'static str,
}

impl Interface {
    /// Creates the marker for capability `C`.
    #[must_use]
    pub fn of<C: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            type_name: type_name::<C>(),
        }
    }

    /// Returns `true` when this is the marker for capability `C`.
    #[must_use]
    pub fn is<C: ?Sized + 'static>(&self) -> bool {
        self.type_id == TypeId::of::<C>()
    }

    /// Type name of the capability.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// A named entry of a [`Namespace`].
#[derive(Clone, Debug)]
pub enum Member {
    /// An object exposing capability views.
    Object(Export),
    /// A nested namespace.
    Namespace(Arc<Namespace>),
    /// The marker of a capability.
    Interface(Interface),
}

impl Member {
    /// Short description of the member kind, used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Object(_) => "object",
            Self::Namespace(_) => "namespace",
            Self::Interface(_) => "capability marker",
        }
    }
}

/// Immutable table of members published under a dotted path.
#[derive(Debug)]
pub struct Namespace {
    path: String,
    members: IndexMap<String, Member>,
}

impl Namespace {
    /// Starts building a namespace published under `path`.
    #[must_use]
    pub fn builder(path: impl Into<String>) -> NamespaceBuilder {
        NamespaceBuilder {
            path: path.into(),
            members: IndexMap::new(),
        }
    }

    /// Returns the dotted path of the namespace.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Looks up a member by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    /// Iterates over every member in declaration order.
    pub fn members(&self) -> impl Iterator<Item = (&str, &Member)> {
        self.members
            .iter()
            .map(|(name, member)| (name.as_str(), member))
    }

    /// Iterates over members whose name does not carry [`PRIVATE_PREFIX`].
    pub fn public_members(&self) -> impl Iterator<Item = (&str, &Member)> {
        self.members()
            .filter(|(name, _)| !name.starts_with(PRIVATE_PREFIX))
    }

    /// Number of members, private ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` when the namespace exports nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Builder for [`Namespace`].
#[derive(Debug)]
pub struct NamespaceBuilder {
    path: String,
    members: IndexMap<String, Member>,
}

impl NamespaceBuilder {
    /// Adds an exported object.
    #[must_use]
    pub fn object(self, name: impl Into<String>, export: Export) -> Self {
        self.member(name, Member::Object(export))
    }

    /// Adds the marker of capability `C`.
    #[must_use]
    pub fn interface<C: ?Sized + 'static>(self, name: impl Into<String>) -> Self {
        self.member(name, Member::Interface(Interface::of::<C>()))
    }

    /// Nests a namespace under the last segment of its path.
    #[must_use]
    pub fn namespace(mut self, child: Namespace) -> Self {
        self.insert_namespace(Arc::new(child));
        self
    }

    /// Adds an arbitrary member, replacing any member of the same name.
    #[must_use]
    pub fn member(mut self, name: impl Into<String>, member: Member) -> Self {
        self.insert(name, member);
        self
    }

    fn insert(&mut self, name: impl Into<String>, member: Member) {
        self.members.insert(name.into(), member);
    }

    fn insert_namespace(&mut self, child: Arc<Namespace>) {
        let name = child
            .path
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_owned();
        self.insert(name, Member::Namespace(child));
    }

    /// Finalises the namespace.
    #[must_use]
    pub fn build(self) -> Namespace {
        Namespace {
            path: self.path,
            members: self.members,
        }
    }
}

/// Source of namespaces, looked up by absolute dotted path.
pub trait NamespaceLoader: Send + Sync {
    /// Returns the namespace published under `path`, if any.
    fn load_namespace(&self, path: &str) -> Option<Arc<Namespace>>;
}

/// One member submitted to the link-time registration table.
///
/// ```ignore
/// inventory::submit! {
///     Registration::new("fold.config", "JsonFormat", json_format)
/// }
/// ```
#[derive(Debug)]
pub struct Registration {
    namespace: &'static str,
    name: &'static str,
    member: fn() -> Member,
}

impl Registration {
    /// Declares `name` in `namespace`, built lazily by `member`.
    #[must_use]
    pub const fn new(namespace: &'static str, name: &'static str, member: fn() -> Member) -> Self {
        Self {
            namespace,
            name,
            member,
        }
    }

    /// Path of the namespace the member belongs to.
    #[must_use]
    pub const fn namespace(&self) -> &'static str {
        self.namespace
    }

    /// Name of the member.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

inventory::collect!(Registration);

/// In-memory [`NamespaceLoader`] keyed by dotted path.
#[derive(Clone, Default)]
pub struct NamespaceTable {
    namespaces: HashMap<String, Arc<Namespace>>,
}

impl fmt::Debug for NamespaceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamespaceTable")
            .field("namespaces", &self.paths())
            .finish()
    }
}

impl NamespaceTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from every [`Registration`] linked into the binary.
    ///
    /// Registrations sharing a namespace path are merged. Dotted paths are
    /// nested into their parents, creating empty parents where needed, so
    /// `json.decoder` is reachable both directly and as member `decoder` of
    /// `json`.
    #[must_use]
    pub fn from_inventory() -> Self {
        let mut builders: BTreeMap<String, NamespaceBuilder> = BTreeMap::new();
        for registration in inventory::iter::<Registration> {
            builders
                .entry(registration.namespace.to_owned())
                .or_insert_with(|| Namespace::builder(registration.namespace))
                .insert(registration.name, (registration.member)());
        }
        Self::from_builders(builders)
    }

    fn from_builders(mut builders: BTreeMap<String, NamespaceBuilder>) -> Self {
        let paths: Vec<String> = builders.keys().cloned().collect();
        for path in &paths {
            let mut current = path.as_str();
            while let Some((parent, _)) = current.rsplit_once('.') {
                builders
                    .entry(parent.to_owned())
                    .or_insert_with(|| Namespace::builder(parent));
                current = parent;
            }
        }

        // Children are built before their parents so the parent can hold them.
        let mut ordered: Vec<String> = builders.keys().cloned().collect();
        ordered.sort_by_key(|path| Reverse(path.matches('.').count()));

        let mut table = Self::new();
        for path in ordered {
            let Some(builder) = builders.remove(&path) else {
                continue;
            };
            let namespace = Arc::new(builder.build());
            if let Some((parent, _)) = path.rsplit_once('.') {
                if let Some(parent) = builders.get_mut(parent) {
                    parent.insert_namespace(Arc::clone(&namespace));
                }
            }
            table.namespaces.insert(path, namespace);
        }
        table
    }

    /// Publishes a namespace and every namespace nested inside it.
    pub fn insert(&mut self, namespace: Namespace) -> Arc<Namespace> {
        let namespace = Arc::new(namespace);
        self.register(Arc::clone(&namespace));
        namespace
    }

    fn register(&mut self, namespace: Arc<Namespace>) {
        for (_, member) in namespace.members() {
            if let Member::Namespace(child) = member {
                self.register(Arc::clone(child));
            }
        }
        self.namespaces.insert(namespace.path.clone(), namespace);
    }

    /// Returns the namespace published under `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Arc<Namespace>> {
        self.namespaces.get(path).cloned()
    }

    /// Sorted list of published paths.
    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<_> = self.namespaces.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}

impl NamespaceLoader for NamespaceTable {
    fn load_namespace(&self, path: &str) -> Option<Arc<Namespace>> {
        self.get(path)
    }
}

impl<L: NamespaceLoader + ?Sized> NamespaceLoader for Arc<L> {
    fn load_namespace(&self, path: &str) -> Option<Arc<Namespace>> {
        (**self).load_namespace(path)
    }
}

/// Resolves an address to the raw member it names, without any capability
/// check.
///
/// The module is loaded through `loader` (relative modules are anchored on
/// `package`). When the address carries an object path, its head and each
/// attribute are looked up in turn, every step descending into a nested
/// namespace.
///
/// # Errors
///
/// Returns [`PluginError::AddressSyntax`] for malformed addresses and
/// [`PluginError::Resolution`] when the module or any attribute is missing.
pub fn resolve_member(
    loader: &dyn NamespaceLoader,
    address: &str,
    package: Option<&str>,
) -> PluginResult<Member> {
    let parsed = Address::parse(address)?;
    resolve_parsed(loader, address, &parsed, package)
}

pub(crate) fn resolve_parsed(
    loader: &dyn NamespaceLoader,
    raw: &str,
    address: &Address,
    package: Option<&str>,
) -> PluginResult<Member> {
    let module = address.module();
    let path = module.absolute(package).ok_or_else(|| {
        let reason = match package {
            Some(package) => format!("relative module `{module}` escapes package `{package}`"),
            None => format!("relative module `{module}` requires an anchor package"),
        };
        PluginError::resolution(raw, reason)
    })?;

    let namespace = loader
        .load_namespace(&path)
        .ok_or_else(|| PluginError::resolution(raw, format!("no namespace `{path}`")))?;
    trace!(address = raw, namespace = %path, "namespace loaded");

    let Some(object) = address.object() else {
        return Ok(Member::Namespace(namespace));
    };

    let mut current = Member::Namespace(namespace);
    for name in object.names() {
        current = match current {
            Member::Namespace(namespace) => namespace.get(name).cloned().ok_or_else(|| {
                PluginError::resolution(
                    raw,
                    format!("namespace `{}` has no member `{name}`", namespace.path()),
                )
            })?,
            other => {
                return Err(PluginError::resolution(
                    raw,
                    format!("cannot look up `{name}` on {}", other.kind()),
                ));
            }
        };
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named: Send + Sync {
        fn label(&self) -> &str;
    }

    struct Label(&'static str);

    impl Named for Label {
        fn label(&self) -> &str {
            self.0
        }
    }

    fn label(text: &'static str) -> Export {
        Export::of::<dyn Named>(Arc::new(Label(text)))
    }

    fn answer() -> Member {
        Member::Object(label("forty-two"))
    }

    inventory::submit! {
        Registration::new("fold.test.deep.inner", "Answer", answer)
    }

    fn table() -> NamespaceTable {
        let decoder = Namespace::builder("json.decoder")
            .object("JSONDecodeError", label("decode-error"))
            .build();
        let json = Namespace::builder("json")
            .object("loads", label("loads"))
            .namespace(decoder)
            .build();

        let mut table = NamespaceTable::new();
        table.insert(json);
        table
    }

    fn label_of(member: &Member) -> String {
        match member {
            Member::Object(export) => export.view::<dyn Named>().unwrap().label().to_owned(),
            other => panic!("expected object, found {}", other.kind()),
        }
    }

    #[test]
    fn export_views_are_typed() {
        let export = label("x");
        assert!(export.provides::<dyn Named>());
        assert!(export.view::<dyn Named>().is_some());
        assert!(export.view::<dyn Fn() + Send + Sync>().is_none());
        assert_eq!(export.capabilities().len(), 1);
    }

    #[test]
    fn insert_publishes_nested_namespaces() {
        let table = table();
        assert_eq!(table.paths(), ["json", "json.decoder"]);
        let decoder = table.get("json.decoder").unwrap();
        assert!(decoder.get("JSONDecodeError").is_some());
    }

    #[test]
    fn resolves_attribute_chain() {
        let table = table();
        let member = resolve_member(&table, "json:decoder.JSONDecodeError", None).unwrap();
        assert_eq!(label_of(&member), "decode-error");

        let member = resolve_member(&table, "json.decoder:JSONDecodeError", None).unwrap();
        assert_eq!(label_of(&member), "decode-error");
    }

    #[test]
    fn bare_module_resolves_to_namespace() {
        let member = resolve_member(&table(), "json", None).unwrap();
        assert!(matches!(member, Member::Namespace(ns) if ns.path() == "json"));
    }

    #[test]
    fn missing_pieces_are_resolution_errors() {
        let table = table();
        for address in ["yaml:loads", "json:dumps", "json:loads.inner", ".json:loads"] {
            let err = resolve_member(&table, address, None).expect_err(address);
            assert!(
                matches!(err, PluginError::Resolution { address: ref a, .. } if a == address),
                "{address}: {err}"
            );
        }
    }

    #[test]
    fn relative_module_uses_anchor() {
        let member = resolve_member(&table(), ".decoder:JSONDecodeError", Some("json")).unwrap();
        assert_eq!(label_of(&member), "decode-error");
    }

    #[test]
    fn public_members_skip_private_names() {
        let namespace = Namespace::builder("pkg")
            .object("Visible", label("v"))
            .object("_Hidden", label("h"))
            .build();
        let names: Vec<_> = namespace.public_members().map(|(name, _)| name).collect();
        assert_eq!(names, ["Visible"]);
        assert_eq!(namespace.len(), 2);
    }

    #[test]
    fn inventory_registrations_are_nested() {
        let table = NamespaceTable::from_inventory();
        let member = resolve_member(&table, "fold.test:deep.inner.Answer", None).unwrap();
        assert_eq!(label_of(&member), "forty-two");
        assert!(table.get("fold").is_some());
        assert!(table.get("fold.test.deep").is_some());
    }
}
