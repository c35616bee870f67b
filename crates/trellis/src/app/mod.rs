//! Request dispatch over an object graph.
//!
//! [`WebApp`] owns the registered facets and one [`MetaClass`] per class that
//! has taken part in dispatch. [`WebApp::dispatch`] walks the request path
//! token by token, offering each token to the current node's dispatchers in
//! order until one claims it. When the path is exhausted the facets are asked
//! for an index view.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{debug, error, trace, warn};
use trellis_config::{Config, DispatchOrder};

use crate::class::{Class, WeakClassMap};
use crate::dispatch::{Claim, DISPATCH_TARGET};
use crate::error::DispatchError;
use crate::facet::Facet;
use crate::meta_class::MetaClass;
use crate::node::Node;
use crate::request::{Request, Response};
use crate::script::ViewRenderer;

/// Final result of dispatching a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A dispatcher or index view produced the response.
    Handled,
    /// Nothing claimed the path; callers typically answer 404.
    Unhandled,
}

impl Outcome {
    /// Whether the request was handled.
    #[must_use]
    pub const fn is_handled(self) -> bool {
        matches!(self, Self::Handled)
    }
}

/// Dispatch entry point shared by every request thread.
pub struct WebApp {
    facets: Vec<Arc<dyn Facet>>,
    order: DispatchOrder,
    meta_classes: Mutex<WeakClassMap<Arc<MetaClass>>>,
}

impl WebApp {
    /// Creates an app dispatching through `facets` with the given rule order.
    #[must_use]
    pub fn new(facets: Vec<Arc<dyn Facet>>, order: DispatchOrder) -> Self {
        Self {
            facets,
            order,
            meta_classes: Mutex::new(WeakClassMap::new()),
        }
    }

    /// Creates an app using the dispatch order from `config`.
    #[must_use]
    pub fn from_config(config: &Config, facets: Vec<Arc<dyn Facet>>) -> Self {
        Self::new(facets, config.dispatch_order())
    }

    /// Registered facets, in registration order.
    #[must_use]
    pub fn facets(&self) -> &[Arc<dyn Facet>] {
        &self.facets
    }

    /// Order in which rule groups are tried.
    #[must_use]
    pub const fn dispatch_order(&self) -> DispatchOrder {
        self.order
    }

    /// Returns the metadata for `class`, building it on first use.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] when a facet fails to build its rules or
    /// the cache lock is poisoned.
    pub fn get_meta_class(&self, class: &Class) -> Result<Arc<MetaClass>, DispatchError> {
        let mut meta_classes = self
            .meta_classes
            .lock()
            .map_err(|_| DispatchError::internal("meta-class cache lock poisoned"))?;
        meta_classes.try_get_or_insert_with(class, || {
            trace!(target: DISPATCH_TARGET, class = %class, "building meta-class");
            MetaClass::build(class, &self.facets, self.order).map(Arc::new)
        })
    }

    /// Dispatches `request` starting at `root`.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] when a claimed action or view fails. The
    /// response is left uncommitted by failing views.
    ///
    /// # Example
    ///
    /// ```
    /// use trellis::{Class, ObjectNode, Outcome, Request, Response, WebApp};
    /// use trellis_config::DispatchOrder;
    ///
    /// let root = ObjectNode::new(Class::new("shop.Shop"))
    ///     .with_action("ping", |_, response| {
    ///         response.send("text/plain", "pong");
    ///         Ok(())
    ///     })
    ///     .into_shared();
    /// let app = WebApp::new(Vec::new(), DispatchOrder::default());
    ///
    /// let mut response = Response::new();
    /// let outcome = app
    ///     .dispatch(&root, &mut Request::new("/ping"), &mut response)
    ///     .expect("dispatch");
    /// assert_eq!(outcome, Outcome::Handled);
    /// assert_eq!(response.body(), "pong");
    /// ```
    pub fn dispatch(
        &self,
        root: &Arc<dyn Node>,
        request: &mut Request,
        response: &mut Response,
    ) -> Result<Outcome, DispatchError> {
        let result = self.walk(root, request, response);
        if let Err(failure) = &result {
            if matches!(failure, DispatchError::Internal { .. }) {
                error!(target: DISPATCH_TARGET, path = request.path(), %failure, "dispatch failed");
            } else {
                warn!(
                    target: DISPATCH_TARGET,
                    path = request.path(),
                    resource = failure.resource(),
                    %failure,
                    "dispatch failed"
                );
            }
        }
        result
    }

    /// Resolves `view` of `class` for rendering outside path dispatch.
    ///
    /// Facets are asked in registration order; the first hit wins.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] when the view exists but cannot be loaded.
    pub fn create_view_renderer(
        &self,
        class: &Class,
        view: &str,
    ) -> Result<Option<ViewRenderer>, DispatchError> {
        let meta = self.get_meta_class(class)?;
        for facet in &self.facets {
            if let Some(renderer) = facet.create_view_renderer(&meta, view)? {
                return Ok(Some(renderer));
            }
        }
        Ok(None)
    }

    fn walk(
        &self,
        root: &Arc<dyn Node>,
        request: &mut Request,
        response: &mut Response,
    ) -> Result<Outcome, DispatchError> {
        let mut node = Arc::clone(root);
        request.push_ancestor(Arc::clone(&node));
        loop {
            let meta = self.get_meta_class(&node.class())?;
            if !request.tokens().has_more() {
                return self.dispatch_index(request, response, &node, &meta);
            }
            match Self::offer_token(request, response, &node, &meta)? {
                Claim::Handled => return Ok(Outcome::Handled),
                Claim::Declined => return Ok(Outcome::Unhandled),
                Claim::Continue(child) => {
                    request.push_ancestor(Arc::clone(&child));
                    node = child;
                }
            }
        }
    }

    fn offer_token(
        request: &mut Request,
        response: &mut Response,
        node: &Arc<dyn Node>,
        meta: &MetaClass,
    ) -> Result<Claim, DispatchError> {
        let remaining = request.tokens().remaining();
        for dispatcher in meta.dispatchers() {
            trace!(
                target: DISPATCH_TARGET,
                rule = %dispatcher,
                rest = %request.tokens(),
                "offering token"
            );
            match dispatcher.dispatch(request, response, node)? {
                Claim::Declined => {}
                Claim::Continue(_) if request.tokens().remaining() == remaining => {
                    return Err(DispatchError::internal(format!(
                        "dispatcher '{dispatcher}' continued without consuming a token"
                    )));
                }
                claim => return Ok(claim),
            }
        }
        debug!(
            target: DISPATCH_TARGET,
            token = request.tokens().peek(),
            class = meta.name(),
            "no dispatcher claimed token"
        );
        Ok(Claim::Declined)
    }

    fn dispatch_index(
        &self,
        request: &mut Request,
        response: &mut Response,
        node: &Arc<dyn Node>,
        meta: &MetaClass,
    ) -> Result<Outcome, DispatchError> {
        for facet in &self.facets {
            if facet.handle_index_request(request, response, node, meta)? {
                debug!(target: DISPATCH_TARGET, facet = facet.name(), class = meta.name(), "index view rendered");
                return Ok(Outcome::Handled);
            }
        }
        debug!(target: DISPATCH_TARGET, class = meta.name(), "no index view");
        Ok(Outcome::Unhandled)
    }
}

impl fmt::Debug for WebApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let facets: Vec<&str> = self.facets.iter().map(|facet| facet.name()).collect();
        f.debug_struct("WebApp")
            .field("facets", &facets)
            .field("order", &self.order)
            .field("meta_classes", &self.meta_classes)
            .finish()
    }
}
