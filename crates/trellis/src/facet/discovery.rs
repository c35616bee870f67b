//! Startup-time registry of named extension implementations.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::dispatch::DISPATCH_TARGET;
use crate::error::RegistrationError;

/// Named implementations of a capability, kept in registration order.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use trellis::facet::ExtensionRegistry;
///
/// let mut registry: ExtensionRegistry<str> = ExtensionRegistry::new();
/// registry.register("html", Arc::from("text/html")).expect("register html");
/// registry.register("text", Arc::from("text/plain")).expect("register text");
///
/// let selected = registry.select(&["text", "missing"]);
/// assert_eq!(selected.len(), 1);
/// assert_eq!(&*selected[0], "text/plain");
/// ```
pub struct ExtensionRegistry<T: ?Sized> {
    entries: Vec<(String, Arc<T>)>,
}

impl<T: ?Sized> Default for ExtensionRegistry<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: ?Sized> ExtensionRegistry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `extension` under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::EmptyName`] for a blank name and
    /// [`RegistrationError::Duplicate`] if `name` is already taken.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        extension: Arc<T>,
    ) -> Result<(), RegistrationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        if self.get(&name).is_some() {
            return Err(RegistrationError::Duplicate { name });
        }
        self.entries.push((name, extension));
        Ok(())
    }

    /// Every registered implementation, in registration order.
    #[must_use]
    pub fn discover(&self) -> Vec<Arc<T>> {
        self.entries
            .iter()
            .map(|(_, extension)| Arc::clone(extension))
            .collect()
    }

    /// The implementations named in `names`, in the order given.
    ///
    /// Unknown names are logged and skipped.
    #[must_use]
    pub fn select(&self, names: &[&str]) -> Vec<Arc<T>> {
        names
            .iter()
            .filter_map(|name| {
                let found = self.get(name);
                if found.is_none() {
                    warn!(target: DISPATCH_TARGET, name, "unknown extension requested");
                }
                found
            })
            .collect()
    }

    /// Looks up an implementation by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<T>> {
        self.entries
            .iter()
            .find(|(registered, _)| registered == name)
            .map(|(_, extension)| Arc::clone(extension))
    }

    /// Registered names, in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Returns the number of registered implementations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: ?Sized> fmt::Debug for ExtensionRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("names", &self.names())
            .finish()
    }
}
