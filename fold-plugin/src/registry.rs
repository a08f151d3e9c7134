//! Capability registry with a read-through resolution cache.

use std::any::type_name;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use fold_primitives::Address;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{PluginError, PluginResult};
use crate::namespace::{Member, Namespace, NamespaceLoader, NamespaceTable, resolve_parsed};

enum Cached<C: ?Sized> {
    Object(Arc<C>),
    Namespace(Arc<Namespace>),
}

impl<C: ?Sized> Clone for Cached<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Object(object) => Self::Object(Arc::clone(object)),
            Self::Namespace(namespace) => Self::Namespace(Arc::clone(namespace)),
        }
    }
}

/// Resolves addresses to objects providing capability `C`.
///
/// `C` is normally a trait object type such as `dyn SectionHandler`. The
/// registry owns its cache: `load` memoises the resolved object under the
/// exact address string it was given, `discover` memoises the namespace
/// handle and re-filters its members on every call. Nothing expires until
/// [`flush`](Self::flush) is called.
///
/// The cache is guarded by a mutex that is released while a namespace is
/// being resolved; two concurrent misses on one address both resolve and the
/// last write wins.
pub struct CapabilityRegistry<C>
where
    C: ?Sized + Send + Sync + 'static,
{
    loader: Arc<dyn NamespaceLoader>,
    cache: Mutex<HashMap<String, Cached<C>>>,
}

impl<C> fmt::Debug for CapabilityRegistry<C>
where
    C: ?Sized + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("capability", &Self::capability_name())
            .field("cached", &self.cached_addresses())
            .finish_non_exhaustive()
    }
}

impl<C> CapabilityRegistry<C>
where
    C: ?Sized + Send + Sync + 'static,
{
    /// Creates a registry resolving namespaces through `loader`.
    #[must_use]
    pub fn new(loader: Arc<dyn NamespaceLoader>) -> Self {
        Self {
            loader,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a registry over every namespace registered through
    /// `inventory`.
    #[must_use]
    pub fn with_registered() -> Self {
        Self::new(Arc::new(NamespaceTable::from_inventory()))
    }

    /// Type name of the required capability.
    #[must_use]
    pub fn capability_name() -> &'static str {
        type_name::<C>()
    }

    /// Loads the object named by an absolute address.
    ///
    /// # Errors
    ///
    /// See [`load_from`](Self::load_from).
    pub fn load(&self, address: &str, use_cache: bool) -> PluginResult<Arc<C>> {
        self.load_from(address, None, use_cache)
    }

    /// Loads the object named by `address`, anchoring relative modules on
    /// `package`.
    ///
    /// With `use_cache`, a previous successful load of the identical address
    /// string is returned without touching the loader, and a fresh success is
    /// stored under that string.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::AddressSyntax`] for malformed addresses,
    /// [`PluginError::Resolution`] when the module or an attribute is missing,
    /// and [`PluginError::CapabilityMismatch`] when the member is not an object
    /// providing `C` (the capability marker itself included).
    pub fn load_from(
        &self,
        address: &str,
        package: Option<&str>,
        use_cache: bool,
    ) -> PluginResult<Arc<C>> {
        let parsed = Address::parse(address)?;

        if use_cache {
            let cached = self.cache.lock().get(address).cloned();
            match cached {
                Some(Cached::Object(object)) => {
                    debug!(address, capability = Self::capability_name(), "capability cache hit");
                    return Ok(object);
                }
                Some(Cached::Namespace(_)) => return Err(self.mismatch(address)),
                None => {}
            }
        }

        let member = resolve_parsed(self.loader.as_ref(), address, &parsed, package)?;
        let object = match member {
            Member::Object(export) => export.view::<C>(),
            Member::Namespace(_) | Member::Interface(_) => None,
        }
        .ok_or_else(|| self.mismatch(address))?;

        if use_cache {
            self.cache
                .lock()
                .insert(address.to_owned(), Cached::Object(Arc::clone(&object)));
        }
        debug!(address, capability = Self::capability_name(), "capability resolved");
        Ok(object)
    }

    /// Returns every public object of a namespace that provides `C`.
    ///
    /// # Errors
    ///
    /// See [`discover_from`](Self::discover_from).
    pub fn discover(&self, namespace: &str, use_cache: bool) -> PluginResult<Vec<Arc<C>>> {
        self.discover_from(namespace, None, use_cache)
    }

    /// Returns every public object of the namespace named by `namespace` that
    /// provides `C`, anchoring relative modules on `package`.
    ///
    /// Members whose name starts with
    /// [`PRIVATE_PREFIX`](crate::PRIVATE_PREFIX), capability markers, nested
    /// namespaces, and objects lacking `C` are skipped rather than reported.
    /// An object exported under several names appears once. Order follows the
    /// namespace's declaration order but is not part of the contract.
    ///
    /// # Errors
    ///
    /// Returns [`PluginError::AddressSyntax`] for malformed addresses and
    /// [`PluginError::Resolution`] when the address does not name a namespace.
    pub fn discover_from(
        &self,
        namespace: &str,
        package: Option<&str>,
        use_cache: bool,
    ) -> PluginResult<Vec<Arc<C>>> {
        let parsed = Address::parse(namespace)?;
        let handle = self.namespace_handle(namespace, &parsed, package, use_cache)?;

        let mut seen = HashSet::new();
        let discovered: Vec<Arc<C>> = handle
            .public_members()
            .filter_map(|(_, member)| match member {
                Member::Object(export) => export.view::<C>(),
                Member::Namespace(_) | Member::Interface(_) => None,
            })
            .filter(|object| seen.insert(Arc::as_ptr(object).cast::<()>()))
            .collect();

        debug!(
            namespace,
            capability = Self::capability_name(),
            found = discovered.len(),
            "namespace discovered"
        );
        Ok(discovered)
    }

    fn namespace_handle(
        &self,
        raw: &str,
        address: &Address,
        package: Option<&str>,
        use_cache: bool,
    ) -> PluginResult<Arc<Namespace>> {
        if use_cache {
            let cached = self.cache.lock().get(raw).cloned();
            match cached {
                Some(Cached::Namespace(namespace)) => {
                    debug!(namespace = raw, "namespace cache hit");
                    return Ok(namespace);
                }
                Some(Cached::Object(_)) => return Err(not_a_namespace(raw, "object")),
                None => {}
            }
        }

        let namespace = match resolve_parsed(self.loader.as_ref(), raw, address, package)? {
            Member::Namespace(namespace) => namespace,
            other => return Err(not_a_namespace(raw, other.kind())),
        };

        if use_cache {
            self.cache
                .lock()
                .insert(raw.to_owned(), Cached::Namespace(Arc::clone(&namespace)));
        }
        Ok(namespace)
    }

    /// Empties the cache.
    pub fn flush(&self) {
        let mut cache = self.cache.lock();
        debug!(
            capability = Self::capability_name(),
            evicted = cache.len(),
            "capability cache flushed"
        );
        cache.clear();
    }

    /// Returns `true` when `address` has a cache entry.
    #[must_use]
    pub fn is_cached(&self, address: &str) -> bool {
        self.cache.lock().contains_key(address)
    }

    /// Sorted list of cached address strings.
    #[must_use]
    pub fn cached_addresses(&self) -> Vec<String> {
        let mut addresses: Vec<_> = self.cache.lock().keys().cloned().collect();
        addresses.sort_unstable();
        addresses
    }

    fn mismatch(&self, address: &str) -> PluginError {
        PluginError::CapabilityMismatch {
            address: address.to_owned(),
            capability: Self::capability_name(),
        }
    }
}

fn not_a_namespace(address: &str, kind: &str) -> PluginError {
    PluginError::resolution(address, format!("resolved to {kind}, not a namespace"))
}
