//! View engine adapter interface.
//!
//! A [`ScriptEngine`] turns a [`Resource`] into an executable [`Script`].
//! Scripts are immutable once parsed and can be invoked concurrently. They
//! render into a [`Rendered`] value instead of writing to the response, so
//! a failing script never leaves a half-written response behind.
//! [`ScriptInvoker`] commits the output once rendering has succeeded.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::error::DispatchError;
use crate::node::Node;
use crate::request::{Request, Response};
use crate::resource::Resource;

/// Errors raised by script engines.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The script source is malformed.
    #[error("syntax error: {message}")]
    Syntax {
        /// Description of the syntax problem.
        message: String,
    },
    /// The script raised a fault while running.
    #[error("execution error: {message}")]
    Execution {
        /// Description of the runtime fault.
        message: String,
    },
    /// Reading the script source failed.
    #[error("failed to read script: {source}")]
    Io {
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
    /// The engine itself is unavailable or misbehaved.
    #[error("engine failure: {message}")]
    Engine {
        /// Description of the engine failure.
        message: String,
    },
}

impl ScriptError {
    /// Creates a syntax error.
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
        }
    }

    /// Creates an execution error.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }

    /// Creates an engine error.
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
        }
    }

    /// Wraps an I/O error.
    #[must_use]
    pub fn io(source: io::Error) -> Self {
        Self::Io {
            source: Arc::new(source),
        }
    }
}

/// Request data made available to a running script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderContext {
    path: String,
    rest: String,
    parameters: BTreeMap<String, String>,
}

impl RenderContext {
    /// Captures the script-visible parts of `request`.
    #[must_use]
    pub fn from_request(request: &Request) -> Self {
        Self {
            path: request.path().to_owned(),
            rest: request.rest_of_path(),
            parameters: request.parameters().clone(),
        }
    }

    /// Full request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Part of the path not consumed by dispatch.
    #[must_use]
    pub fn rest(&self) -> &str {
        &self.rest
    }

    /// Looks up a request parameter.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }
}

/// Output of a successful script invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    body: String,
    content_type: String,
}

impl Rendered {
    /// Creates rendered output.
    pub fn new(body: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            content_type: content_type.into(),
        }
    }

    /// Rendered body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Content type of the body.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Splits into `(content_type, body)`.
    #[must_use]
    pub fn into_parts(self) -> (String, String) {
        (self.content_type, self.body)
    }
}

/// A parsed, immutable view script.
pub trait Script: Send + Sync + fmt::Debug {
    /// Logical resource path the script was parsed from.
    fn resource(&self) -> &str;

    /// Runs the script against `target`.
    ///
    /// # Errors
    ///
    /// Returns a [`ScriptError`] when the script faults or the engine is
    /// unavailable.
    fn invoke(&self, context: &RenderContext, target: &Arc<dyn Node>)
    -> Result<Rendered, ScriptError>;
}

/// Parses view resources of one extension into scripts.
pub trait ScriptEngine: Send + Sync {
    /// Extension handled by the engine, including the dot.
    fn extension(&self) -> &str;

    /// Parses `resource` into a script.
    ///
    /// # Errors
    ///
    /// Returns a [`ScriptError`] when the resource cannot be read or parsed.
    fn parse_script(&self, resource: &Resource) -> Result<Arc<dyn Script>, ScriptError>;
}

/// Executes scripts on behalf of dispatchers and commits their output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptInvoker;

impl ScriptInvoker {
    /// Runs `script` against `node` and commits the result to `response`.
    ///
    /// The response is left untouched when the script fails.
    ///
    /// # Errors
    ///
    /// Returns the script failure tagged with the script's resource path.
    pub fn invoke_script(
        request: &Request,
        response: &mut Response,
        script: &dyn Script,
        node: &Arc<dyn Node>,
    ) -> Result<(), DispatchError> {
        let context = RenderContext::from_request(request);
        let rendered = script
            .invoke(&context, node)
            .map_err(|error| DispatchError::from_script(script.resource(), error))?;
        response.commit(rendered);
        Ok(())
    }
}

/// A script resolved for direct rendering outside path dispatch.
#[derive(Debug, Clone)]
pub struct ViewRenderer {
    script: Arc<dyn Script>,
}

impl ViewRenderer {
    /// Wraps a resolved script.
    #[must_use]
    pub const fn new(script: Arc<dyn Script>) -> Self {
        Self { script }
    }

    /// Resource path of the underlying script.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.script.resource()
    }

    /// Renders the view of `node` into `response`.
    ///
    /// # Errors
    ///
    /// Returns the script failure tagged with its resource path.
    pub fn forward(
        &self,
        request: &Request,
        response: &mut Response,
        node: &Arc<dyn Node>,
    ) -> Result<(), DispatchError> {
        ScriptInvoker::invoke_script(request, response, self.script.as_ref(), node)
    }
}

#[cfg(test)]
mod tests;
