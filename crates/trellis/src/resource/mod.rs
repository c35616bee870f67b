//! View resource lookup.
//!
//! View scripts are addressed by logical paths such as `pkg/Type/index.tpl`.
//! A [`ResourceLoader`] maps those paths to readable [`Resource`]s. A miss is
//! reported as `Ok(None)`; only genuine I/O trouble is an error.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::sync::Arc;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use trellis_config::Config;

use crate::error::DispatchError;

#[derive(Debug, Clone)]
enum Location {
    File(Utf8PathBuf),
    Memory(Arc<str>),
}

/// A located view resource.
#[derive(Debug, Clone)]
pub struct Resource {
    path: String,
    location: Location,
}

impl Resource {
    /// Creates a resource backed by a file.
    pub fn file(path: impl Into<String>, file: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            location: Location::File(file.into()),
        }
    }

    /// Creates a resource backed by in-memory content.
    pub fn memory(path: impl Into<String>, content: impl Into<Arc<str>>) -> Self {
        Self {
            path: path.into(),
            location: Location::Memory(content.into()),
        }
    }

    /// Logical path of the resource.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Extension of the final path segment including the dot, e.g. `.tpl`.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        let file_name = self.path.rsplit('/').next().unwrap_or(&self.path);
        file_name
            .rfind('.')
            .and_then(|index| file_name.get(index..))
    }

    /// Reads the resource as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while reading a file-backed resource.
    pub fn read_to_string(&self) -> io::Result<String> {
        match &self.location {
            Location::File(file) => fs::read_to_string(file),
            Location::Memory(content) => Ok(content.to_string()),
        }
    }
}

/// Locates view resources by logical path.
pub trait ResourceLoader: Send + Sync {
    /// Finds the resource at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Resource`] when the lookup itself fails.
    fn find(&self, path: &str) -> Result<Option<Resource>, DispatchError>;
}

/// Loader serving resources from a directory tree.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: Utf8PathBuf,
}

impl DirectoryLoader {
    /// Creates a loader rooted at `root`.
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates a loader rooted at the configured view directory.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.view_root())
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

impl ResourceLoader for DirectoryLoader {
    fn find(&self, path: &str) -> Result<Option<Resource>, DispatchError> {
        let relative = Utf8Path::new(path);
        let confined = relative
            .components()
            .all(|component| matches!(component, Utf8Component::Normal(_)));
        if !confined {
            return Ok(None);
        }

        let file = self.root.join(relative);
        match fs::metadata(&file) {
            Ok(metadata) if metadata.is_file() => Ok(Some(Resource::file(path, file))),
            Ok(_) => Ok(None),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(DispatchError::resource_io(path, error)),
        }
    }
}

/// Loader serving resources from memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    entries: HashMap<String, Arc<str>>,
}

impl MemoryLoader {
    /// Creates an empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resource.
    #[must_use]
    pub fn with(mut self, path: impl Into<String>, content: impl Into<Arc<str>>) -> Self {
        self.insert(path, content);
        self
    }

    /// Adds or replaces a resource.
    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<Arc<str>>) {
        self.entries.insert(path.into(), content.into());
    }
}

impl ResourceLoader for MemoryLoader {
    fn find(&self, path: &str) -> Result<Option<Resource>, DispatchError> {
        Ok(self
            .entries
            .get(path)
            .map(|content| Resource::memory(path, Arc::clone(content))))
    }
}

#[cfg(test)]
mod tests;
