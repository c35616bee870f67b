//! Runtime type descriptors for dispatchable nodes.
//!
//! A [`Class`] names the type of a node (`pkg.Type`), links to its
//! superclass, and records whether it was defined at runtime by a script
//! engine. Classes are reference counted and may be dropped while the
//! application keeps running, so caches key them weakly through
//! [`WeakClassMap`].

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

mod weak_map;

pub use self::weak_map::WeakClassMap;

#[derive(Debug)]
struct ClassDef {
    name: String,
    superclass: Option<Class>,
    dynamic: bool,
}

/// Shared handle to a runtime type descriptor.
///
/// Equality and hashing use allocation identity: two classes with the same
/// name defined separately are distinct, as with classes from different
/// loaders.
///
/// # Example
///
/// ```
/// use trellis::Class;
///
/// let base = Class::new("shop.Item");
/// let book = Class::builder("shop.Book").superclass(&base).build();
/// let names: Vec<_> = book.ancestry().map(|class| class.name().to_owned()).collect();
/// assert_eq!(names, ["shop.Book", "shop.Item"]);
/// ```
#[derive(Clone)]
pub struct Class {
    inner: Arc<ClassDef>,
}

impl Class {
    /// Creates a root class with no superclass.
    pub fn new(name: impl Into<String>) -> Self {
        Self::builder(name).build()
    }

    /// Starts building a class.
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder {
            name: name.into(),
            superclass: None,
            dynamic: false,
        }
    }

    /// Fully qualified dotted name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Direct superclass, if any.
    #[must_use]
    pub fn superclass(&self) -> Option<&Self> {
        self.inner.superclass.as_ref()
    }

    /// Whether the class was defined at runtime by a script engine.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.inner.dynamic
    }

    /// Iterates this class followed by each ancestor, most derived first.
    #[must_use]
    pub const fn ancestry(&self) -> Ancestry<'_> {
        Ancestry { next: Some(self) }
    }

    /// Creates a weak reference that does not keep the class alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakClass {
        WeakClass {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Resource path of the view `view` with extension `extension`.
    ///
    /// The class `pkg.Type` maps `index` and `.tpl` to `pkg/Type/index.tpl`.
    /// Returns `None` when `view` is not a plain name, so a path token can
    /// never escape the class's resource directory.
    #[must_use]
    pub fn resource_path(&self, view: &str, extension: &str) -> Option<String> {
        if !is_view_name(view) {
            return None;
        }
        let directory = self.name().replace('.', "/");
        Some(format!("{directory}/{view}{extension}"))
    }

    fn identity(&self) -> usize {
        Arc::as_ptr(&self.inner).cast::<()>() as usize
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Class {}

impl Hash for Class {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name())
            .field("dynamic", &self.is_dynamic())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Builder for [`Class`].
#[derive(Debug)]
pub struct ClassBuilder {
    name: String,
    superclass: Option<Class>,
    dynamic: bool,
}

impl ClassBuilder {
    /// Sets the direct superclass.
    #[must_use]
    pub fn superclass(mut self, superclass: &Class) -> Self {
        self.superclass = Some(superclass.clone());
        self
    }

    /// Marks the class as defined at runtime by a script engine.
    #[must_use]
    pub const fn dynamic(mut self) -> Self {
        self.dynamic = true;
        self
    }

    /// Finishes the class.
    #[must_use]
    pub fn build(self) -> Class {
        Class {
            inner: Arc::new(ClassDef {
                name: self.name,
                superclass: self.superclass,
                dynamic: self.dynamic,
            }),
        }
    }
}

/// Weak reference to a [`Class`].
#[derive(Clone, Debug)]
pub struct WeakClass {
    inner: Weak<ClassDef>,
}

impl WeakClass {
    /// Returns the class if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Class> {
        self.inner.upgrade().map(|inner| Class { inner })
    }

    /// Whether the class has been dropped.
    #[must_use]
    pub fn is_dropped(&self) -> bool {
        self.inner.strong_count() == 0
    }
}

/// Iterator over a class and its ancestors.
#[derive(Debug, Clone)]
pub struct Ancestry<'a> {
    next: Option<&'a Class>,
}

impl<'a> Iterator for Ancestry<'a> {
    type Item = &'a Class;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.superclass();
        Some(current)
    }
}

/// Whether `token` can name a view script.
fn is_view_name(token: &str) -> bool {
    !token.is_empty()
        && token != "."
        && token != ".."
        && !token.contains(['/', '\\'])
        && !token.contains('\0')
}
