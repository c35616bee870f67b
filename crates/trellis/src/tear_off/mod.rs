//! Per-class helpers for one view technology.
//!
//! A tear-off is created lazily the first time a class needs it and then
//! lives on the class's [`MetaClass`](crate::meta_class::MetaClass). There is
//! at most one tear-off per (class, tear-off type) pair.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::trace;

use crate::class::Class;
use crate::class_info::CACHE_TARGET;
use crate::error::DispatchError;
use crate::script::Script;

/// Locates named view scripts for one class and one view technology.
pub trait TearOff: Send + Sync + fmt::Debug {
    /// Finds the script for `view`, walking the class's ancestry.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] when a script exists but cannot be read or
    /// parsed.
    fn find_script(&self, view: &str) -> Result<Option<Arc<dyn Script>>, DispatchError>;

    /// Extension of the scripts this tear-off locates, e.g. `.tpl`.
    fn default_extension(&self) -> &str;
}

/// Factory identifying a kind of tear-off.
pub trait TearOffType: Send + Sync {
    /// Stable key distinguishing this tear-off type from others.
    fn key(&self) -> &str;

    /// Builds the tear-off for `class`.
    fn create(&self, class: &Class) -> Arc<dyn TearOff>;
}

/// Cache of tear-offs attached to one class.
#[derive(Debug, Default)]
pub struct TearOffSupport {
    tear_offs: Mutex<HashMap<String, Arc<dyn TearOff>>>,
}

impl TearOffSupport {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the tear-off of `kind` for `class`, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Internal`] if the cache lock is poisoned.
    pub fn load_tear_off(
        &self,
        class: &Class,
        kind: &dyn TearOffType,
    ) -> Result<Arc<dyn TearOff>, DispatchError> {
        let mut tear_offs = self
            .tear_offs
            .lock()
            .map_err(|_| DispatchError::internal("tear-off cache lock poisoned"))?;
        if let Some(existing) = tear_offs.get(kind.key()) {
            return Ok(Arc::clone(existing));
        }
        trace!(target: CACHE_TARGET, class = %class, kind = kind.key(), "creating tear-off");
        let created = kind.create(class);
        tear_offs.insert(kind.key().to_owned(), Arc::clone(&created));
        Ok(created)
    }

    /// Number of tear-offs created so far.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Internal`] if the cache lock is poisoned.
    pub fn len(&self) -> Result<usize, DispatchError> {
        self.tear_offs
            .lock()
            .map(|tear_offs| tear_offs.len())
            .map_err(|_| DispatchError::internal("tear-off cache lock poisoned"))
    }
}
