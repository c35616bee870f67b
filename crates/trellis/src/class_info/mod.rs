//! Per-class script lookup caches.
//!
//! A [`ClassInfo`] remembers, for one class, which script (if any) answers
//! each view name. Lookups walk the class's ancestry so views are inherited.
//! Misses are cached as well, so a view that does not exist costs one round of
//! resource resolution rather than one per request.
//!
//! [`ClassInfoCache`] hands out one `ClassInfo` per live class. It keys its
//! entries weakly so a cached class can still be dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use tracing::trace;

use crate::class::{Class, WeakClass, WeakClassMap};
use crate::error::DispatchError;
use crate::script::Script;

/// Tracing target for lookup caches.
pub(crate) const CACHE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::cache");

/// Resolves a view declared directly on a single class.
pub trait ScriptResolver {
    /// Resolves `view` for `class` alone, ignoring its ancestors.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] when the resource exists but cannot be read
    /// or parsed.
    fn resolve(&self, class: &Class, view: &str) -> Result<Option<Arc<dyn Script>>, DispatchError>;
}

type ScriptSlot = Option<Arc<dyn Script>>;

/// Cached view lookups for one class.
#[derive(Debug)]
pub struct ClassInfo {
    class: WeakClass,
    class_name: String,
    scripts: RwLock<HashMap<String, ScriptSlot>>,
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ClassInfo {
    /// Creates an empty cache for `class`.
    #[must_use]
    pub fn new(class: &Class) -> Self {
        Self {
            class: class.downgrade(),
            class_name: class.name().to_owned(),
            scripts: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Name of the class this cache serves.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Finds the script for `view`, most-derived class first.
    ///
    /// Both hits and misses are cached. Failures are not, so a broken
    /// template is retried once it has been fixed. Each view is resolved at
    /// most once, even under concurrent lookups. Resolution holds only a
    /// per-view lock, so cached views stay readable while another view of
    /// the same class is being resolved.
    ///
    /// # Errors
    ///
    /// Returns the resolver's failure, or [`DispatchError::Internal`] if a
    /// cache lock is poisoned.
    pub fn find_script(
        &self,
        view: &str,
        resolver: &dyn ScriptResolver,
    ) -> Result<Option<Arc<dyn Script>>, DispatchError> {
        if let Some(slot) = self.cached(view)? {
            return Ok(slot);
        }

        let view_lock = self.view_lock(view)?;
        let _resolving = view_lock
            .lock()
            .map_err(|_| DispatchError::internal("class info view lock poisoned"))?;
        if let Some(slot) = self.cached(view)? {
            return Ok(slot);
        }
        let Some(class) = self.class.upgrade() else {
            return Ok(None);
        };

        let found = resolve_in_ancestry(&class, view, resolver)?;
        trace!(
            target: CACHE_TARGET,
            class = %self.class_name,
            view,
            found = found.is_some(),
            "cached view lookup"
        );
        self.scripts
            .write()
            .map_err(|_| DispatchError::internal("class info lock poisoned"))?
            .insert(view.to_owned(), found.clone());
        // Later callers hit the installed slot, so the view lock can go.
        self.in_flight
            .lock()
            .map_err(|_| DispatchError::internal("class info lock poisoned"))?
            .remove(view);
        Ok(found)
    }

    /// Number of view names with a cached answer.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Internal`] if the cache lock is poisoned.
    pub fn cached_views(&self) -> Result<usize, DispatchError> {
        Ok(self.read()?.len())
    }

    fn cached(&self, view: &str) -> Result<Option<ScriptSlot>, DispatchError> {
        Ok(self.read()?.get(view).cloned())
    }

    /// Lock serialising resolution of one view name.
    fn view_lock(&self, view: &str) -> Result<Arc<Mutex<()>>, DispatchError> {
        let mut in_flight = self
            .in_flight
            .lock()
            .map_err(|_| DispatchError::internal("class info lock poisoned"))?;
        Ok(Arc::clone(in_flight.entry(view.to_owned()).or_default()))
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, ScriptSlot>>, DispatchError> {
        self.scripts
            .read()
            .map_err(|_| DispatchError::internal("class info lock poisoned"))
    }
}

fn resolve_in_ancestry(
    class: &Class,
    view: &str,
    resolver: &dyn ScriptResolver,
) -> Result<Option<Arc<dyn Script>>, DispatchError> {
    for ancestor in class.ancestry() {
        if let Some(script) = resolver.resolve(ancestor, view)? {
            return Ok(Some(script));
        }
    }
    Ok(None)
}

/// One [`ClassInfo`] per live class, created on first use.
///
/// A single mutex guards creation, so concurrent callers asking for the same
/// class always observe the same instance.
#[derive(Debug, Default)]
pub struct ClassInfoCache {
    entries: Mutex<WeakClassMap<Arc<ClassInfo>>>,
}

impl ClassInfoCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the `ClassInfo` for `class`, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Internal`] if the cache lock is poisoned.
    pub fn get_class_info(&self, class: &Class) -> Result<Arc<ClassInfo>, DispatchError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| DispatchError::internal("class info cache lock poisoned"))?;
        Ok(entries.get_or_insert_with(class, || {
            trace!(target: CACHE_TARGET, class = %class, "creating class info");
            Arc::new(ClassInfo::new(class))
        }))
    }

    /// Number of classes with a live entry.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Internal`] if the cache lock is poisoned.
    pub fn len(&self) -> Result<usize, DispatchError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| DispatchError::internal("class info cache lock poisoned"))?;
        Ok(entries.len())
    }
}
