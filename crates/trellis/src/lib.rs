//! Request-to-object dispatch for reflective web applications.
//!
//! Trellis binds request paths to object graphs. A request starts at a root
//! [`Node`]; each path token is offered to the dispatch rules of the current
//! node's class until one claims it. Built-in rules invoke actions and
//! descend into children. Pluggable view technologies ([`facet::Facet`])
//! contribute rules that render per-class view scripts, resolved by
//! convention as `pkg/Type/view.ext` and inherited along the superclass
//! chain. When the path is exhausted, facets are asked for an `index` view.
//!
//! Per-class metadata is built once and cached weakly, so classes defined
//! at runtime can be dropped while the application keeps running.

pub mod app;
pub mod class;
pub mod class_info;
pub mod dispatch;
pub mod error;
pub mod facet;
pub mod meta_class;
pub mod node;
pub mod request;
pub mod resource;
pub mod script;
pub mod tear_off;
pub mod telemetry;

pub use app::{Outcome, WebApp};
pub use class::{Class, WeakClass};
pub use error::{ActionError, DispatchError, RegistrationError};
pub use node::{Node, ObjectNode};
pub use request::{Request, Response};
pub use script::{Rendered, Script, ScriptEngine, ViewRenderer};

#[cfg(test)]
mod tests;
