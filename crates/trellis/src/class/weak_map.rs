//! Class-keyed map that never extends the lifetime of its keys.

use std::collections::HashMap;

use super::{Class, WeakClass};

struct Entry<V> {
    class: WeakClass,
    value: V,
}

/// Map keyed by class identity holding only weak references to the keys.
///
/// Entries whose class has been dropped are never returned and are purged the
/// next time a value is inserted. The map performs no locking; owners wrap it
/// in a mutex to make check-then-insert atomic.
pub struct WeakClassMap<V> {
    entries: HashMap<usize, Entry<V>>,
}

impl<V> Default for WeakClassMap<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<V: Clone> WeakClassMap<V> {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value cached for `class`, if its entry is still live.
    #[must_use]
    pub fn get(&self, class: &Class) -> Option<V> {
        self.entries
            .get(&class.identity())
            .filter(|entry| entry.class.upgrade().is_some_and(|live| live == *class))
            .map(|entry| entry.value.clone())
    }

    /// Returns the cached value for `class`, building and caching it on a miss.
    pub fn get_or_insert_with(&mut self, class: &Class, build: impl FnOnce() -> V) -> V {
        match self.try_get_or_insert_with(class, || Ok::<V, std::convert::Infallible>(build())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Fallible variant of [`get_or_insert_with`](Self::get_or_insert_with).
    ///
    /// Nothing is cached when `build` fails.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `build`.
    pub fn try_get_or_insert_with<E>(
        &mut self,
        class: &Class,
        build: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get(class) {
            return Ok(value);
        }
        self.purge();
        let value = build()?;
        self.entries.insert(
            class.identity(),
            Entry {
                class: class.downgrade(),
                value: value.clone(),
            },
        );
        Ok(value)
    }
}

impl<V> WeakClassMap<V> {
    /// Drops entries whose class is gone, returning how many were removed.
    pub fn purge(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.class.is_dropped());
        before - self.entries.len()
    }

    /// Number of entries whose class is still alive.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| !entry.class.is_dropped())
            .count()
    }

    /// Whether no live entries remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V> std::fmt::Debug for WeakClassMap<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakClassMap")
            .field("entries", &self.entries.len())
            .finish()
    }
}
