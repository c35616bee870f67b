//! Dispatch rules that may claim the next path token.
//!
//! Each [`Dispatcher`] is offered the current node and the request. A rule
//! peeks at the next token and consumes it only once it has decided to
//! claim it. With no token left, every rule declines without side effects.
//!
//! The built-in rules cover node members: [`ActionDispatcher`] runs named
//! actions and [`ChildDispatcher`] descends into children. Facets contribute
//! [`ScriptInvokingDispatcher`]s that render view scripts.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::DispatchError;
use crate::node::Node;
use crate::request::{Request, Response};
use crate::script::{Script, ScriptInvoker};
use crate::tear_off::TearOff;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Result of offering a token to a dispatcher.
#[derive(Debug, Clone)]
pub enum Claim {
    /// The rule does not match; the next rule is tried.
    Declined,
    /// The rule consumed the token and fully handled the response.
    Handled,
    /// The rule consumed the token; dispatch continues into the given node.
    Continue(Arc<dyn Node>),
}

impl Claim {
    /// Whether the rule matched.
    #[must_use]
    pub const fn is_claimed(&self) -> bool {
        !matches!(self, Self::Declined)
    }
}

/// A rule in the per-class dispatch chain.
///
/// Implementations hold no per-request state. `Display` describes the URL
/// shape the rule matches and appears in dispatch traces.
pub trait Dispatcher: Send + Sync + fmt::Display {
    /// Offers the next token of `request` to this rule.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] when the rule matched but failed to act.
    fn dispatch(
        &self,
        request: &mut Request,
        response: &mut Response,
        node: &Arc<dyn Node>,
    ) -> Result<Claim, DispatchError>;
}

/// Invokes a node action named by the next token.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionDispatcher;

impl Dispatcher for ActionDispatcher {
    fn dispatch(
        &self,
        request: &mut Request,
        response: &mut Response,
        node: &Arc<dyn Node>,
    ) -> Result<Claim, DispatchError> {
        let Some(name) = request.tokens().peek().map(str::to_owned) else {
            return Ok(Claim::Declined);
        };
        if !node.has_action(&name) {
            return Ok(Claim::Declined);
        }
        request.tokens_mut().advance();
        debug!(target: DISPATCH_TARGET, action = %name, ?node, "invoking action");
        node.invoke_action(&name, request, response)
            .map_err(|error| DispatchError::action(&name, error.message()))?;
        Ok(Claim::Handled)
    }
}

impl fmt::Display for ActionDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("action(...) for url=/ACTION/...")
    }
}

/// Descends into the child named by the next token.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChildDispatcher;

impl Dispatcher for ChildDispatcher {
    fn dispatch(
        &self,
        request: &mut Request,
        _response: &mut Response,
        node: &Arc<dyn Node>,
    ) -> Result<Claim, DispatchError> {
        let Some(name) = request.tokens().peek() else {
            return Ok(Claim::Declined);
        };
        let Some(child) = node.child(name) else {
            return Ok(Claim::Declined);
        };
        debug!(target: DISPATCH_TARGET, member = name, ?child, "descending into child");
        request.tokens_mut().advance();
        Ok(Claim::Continue(child))
    }
}

impl fmt::Display for ChildDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("child(...) for url=/MEMBER/...")
    }
}

/// Finds the script a node exposes under a view name.
pub trait ScriptLookup: Send + Sync {
    /// Finds the script for `view` on `node`.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] when a script exists but cannot be read or
    /// parsed.
    fn find_script(
        &self,
        node: &Arc<dyn Node>,
        view: &str,
    ) -> Result<Option<Arc<dyn Script>>, DispatchError>;
}

/// Looks scripts up through a tear-off bound when the dispatcher was built.
#[derive(Debug, Clone)]
pub struct TearOffLookup {
    tear_off: Arc<dyn TearOff>,
}

impl TearOffLookup {
    /// Wraps a tear-off.
    #[must_use]
    pub const fn new(tear_off: Arc<dyn TearOff>) -> Self {
        Self { tear_off }
    }
}

impl ScriptLookup for TearOffLookup {
    fn find_script(
        &self,
        _node: &Arc<dyn Node>,
        view: &str,
    ) -> Result<Option<Arc<dyn Script>>, DispatchError> {
        self.tear_off.find_script(view)
    }
}

/// Renders the view script named by the next token.
#[derive(Debug, Clone)]
pub struct ScriptInvokingDispatcher<L> {
    lookup: L,
}

impl<L: ScriptLookup> ScriptInvokingDispatcher<L> {
    /// Creates a dispatcher resolving scripts through `lookup`.
    pub const fn new(lookup: L) -> Self {
        Self { lookup }
    }
}

impl<L: ScriptLookup> Dispatcher for ScriptInvokingDispatcher<L> {
    fn dispatch(
        &self,
        request: &mut Request,
        response: &mut Response,
        node: &Arc<dyn Node>,
    ) -> Result<Claim, DispatchError> {
        let Some(next) = request.tokens().peek().map(str::to_owned) else {
            return Ok(Claim::Declined);
        };
        let Some(script) = self.lookup.find_script(node, &next)? else {
            return Ok(Claim::Declined);
        };

        request.tokens_mut().advance();
        debug!(
            target: DISPATCH_TARGET,
            view = %next,
            ?node,
            rest = %request.tokens(),
            "invoking view"
        );
        ScriptInvoker::invoke_script(request, response, script.as_ref(), node)?;
        Ok(Claim::Handled)
    }
}

impl<L> fmt::Display for ScriptInvokingDispatcher<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TOKEN for url=/TOKEN/...")
    }
}

#[cfg(test)]
mod tests;
