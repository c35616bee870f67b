//! Objects that make up a dispatchable graph.
//!
//! A [`Node`] exposes its members by name. Actions are invoked with the
//! request and write the response themselves. Children are nested nodes that
//! dispatch continues into. Properties are string values read by view
//! scripts.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::class::Class;
use crate::error::ActionError;
use crate::request::{Request, Response};

/// An object in the dispatch graph.
pub trait Node: Send + Sync + fmt::Debug {
    /// Runtime class of the node.
    fn class(&self) -> Class;

    /// Reads a named property for view rendering.
    fn property(&self, _name: &str) -> Option<String> {
        None
    }

    /// Returns the child reached through the member `name`.
    fn child(&self, _name: &str) -> Option<Arc<dyn Node>> {
        None
    }

    /// Whether the node exposes an action called `name`.
    fn has_action(&self, _name: &str) -> bool {
        false
    }

    /// Runs the action `name`.
    ///
    /// # Errors
    ///
    /// Returns an [`ActionError`] when the action fails or does not exist.
    fn invoke_action(
        &self,
        name: &str,
        _request: &Request,
        _response: &mut Response,
    ) -> Result<(), ActionError> {
        Err(ActionError::new(format!("no action named '{name}'")))
    }
}

/// Handler backing an [`ObjectNode`] action.
pub type ActionFn = Arc<dyn Fn(&Request, &mut Response) -> Result<(), ActionError> + Send + Sync>;

/// General-purpose node assembled from maps of members.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use trellis::{Class, Node, ObjectNode};
///
/// let cart = ObjectNode::new(Class::new("shop.Cart")).with_property("count", "3");
/// let shop = ObjectNode::new(Class::new("shop.Shop")).with_child("cart", cart);
/// let cart = shop.child("cart").expect("child");
/// assert_eq!(cart.property("count").as_deref(), Some("3"));
/// ```
#[derive(Clone)]
pub struct ObjectNode {
    class: Class,
    properties: BTreeMap<String, String>,
    children: BTreeMap<String, Arc<dyn Node>>,
    actions: BTreeMap<String, ActionFn>,
}

impl ObjectNode {
    /// Creates a node of `class` with no members.
    #[must_use]
    pub const fn new(class: Class) -> Self {
        Self {
            class,
            properties: BTreeMap::new(),
            children: BTreeMap::new(),
            actions: BTreeMap::new(),
        }
    }

    /// Adds a property.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Adds a child node.
    #[must_use]
    pub fn with_child(mut self, name: impl Into<String>, child: impl Node + 'static) -> Self {
        self.children.insert(name.into(), Arc::new(child));
        self
    }

    /// Adds an already shared child node.
    #[must_use]
    pub fn with_shared_child(mut self, name: impl Into<String>, child: Arc<dyn Node>) -> Self {
        self.children.insert(name.into(), child);
        self
    }

    /// Adds an action.
    #[must_use]
    pub fn with_action<F>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&Request, &mut Response) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        self.actions.insert(name.into(), Arc::new(action));
        self
    }

    /// Wraps the node for use as a dispatch root.
    #[must_use]
    pub fn into_shared(self) -> Arc<dyn Node> {
        Arc::new(self)
    }
}

impl Node for ObjectNode {
    fn class(&self) -> Class {
        self.class.clone()
    }

    fn property(&self, name: &str) -> Option<String> {
        self.properties.get(name).cloned()
    }

    fn child(&self, name: &str) -> Option<Arc<dyn Node>> {
        self.children.get(name).cloned()
    }

    fn has_action(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    fn invoke_action(
        &self,
        name: &str,
        request: &Request,
        response: &mut Response,
    ) -> Result<(), ActionError> {
        match self.actions.get(name) {
            Some(action) => action(request, response),
            None => Err(ActionError::new(format!("no action named '{name}'"))),
        }
    }
}

impl fmt::Debug for ObjectNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectNode")
            .field("class", &self.class.name())
            .field("properties", &self.properties)
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}
