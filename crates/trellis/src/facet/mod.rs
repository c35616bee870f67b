//! Pluggable view technologies.
//!
//! A [`Facet`] contributes dispatch rules for each class it is asked about,
//! answers index requests when the path is exhausted, and can resolve a view
//! for direct rendering. Facets are built once at startup, usually through an
//! [`ExtensionRegistry`], and live for the rest of the process.

mod discovery;

use std::sync::Arc;

pub use self::discovery::ExtensionRegistry;
use crate::dispatch::Dispatcher;
use crate::error::DispatchError;
use crate::meta_class::MetaClass;
use crate::node::Node;
use crate::request::{Request, Response};
use crate::script::ViewRenderer;

/// A view technology plugged into the dispatcher.
pub trait Facet: Send + Sync {
    /// Stable name used for registration and logging.
    fn name(&self) -> &str;

    /// Appends the dispatch rules this facet contributes for `owner`.
    ///
    /// Called once per class, the first time the class takes part in
    /// dispatch. Implementations may create tear-offs on `owner`.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] when the rules cannot be prepared.
    fn build_view_dispatchers(
        &self,
        owner: &MetaClass,
        dispatchers: &mut Vec<Arc<dyn Dispatcher>>,
    ) -> Result<(), DispatchError>;

    /// Renders the index view of `node` once the path is exhausted.
    ///
    /// Returns `Ok(false)` when the facet has no index view for the node.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] when an index view exists but fails.
    fn handle_index_request(
        &self,
        request: &mut Request,
        response: &mut Response,
        node: &Arc<dyn Node>,
        owner: &MetaClass,
    ) -> Result<bool, DispatchError>;

    /// Script extensions understood by the facet, e.g. `.tpl`.
    fn script_extensions(&self) -> Vec<String>;

    /// Resolves `view` of `owner`'s class for direct rendering.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] when the view exists but cannot be loaded.
    fn create_view_renderer(
        &self,
        _owner: &MetaClass,
        _view: &str,
    ) -> Result<Option<ViewRenderer>, DispatchError> {
        Ok(None)
    }
}
