//! Error types for dispatch resolution failures.
//!
//! A resolution miss is not an error: it travels back up the chain as a
//! declined claim and ends as [`Outcome::Unhandled`](crate::app::Outcome).
//! Everything here is a genuine failure that must reach the HTTP error layer.
//! Script failures carry the identity of the offending resource so operators
//! can find the template at fault.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::script::ScriptError;

/// Errors surfaced while resolving or executing a request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A view resource could not be located or read.
    #[error("failed to read view resource '{path}': {source}")]
    Resource {
        /// Logical resource path, e.g. `pkg/Type/index.tpl`.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// A view resource was found but could not be parsed.
    #[error("failed to parse view '{resource}': {message}")]
    Parse {
        /// Logical resource path of the script.
        resource: String,
        /// Description of the syntax problem.
        message: String,
    },

    /// A parsed script raised an error while rendering.
    #[error("view '{resource}' failed during execution: {message}")]
    Execution {
        /// Logical resource path of the script.
        resource: String,
        /// Description of the runtime fault.
        message: String,
    },

    /// No registered template container understands the resource extension.
    #[error("unrecognised view extension: {path}")]
    UnrecognisedExtension {
        /// Resource path whose extension was not recognised.
        path: String,
    },

    /// A node action failed.
    #[error("action '{name}' failed: {message}")]
    Action {
        /// Name of the action that was invoked.
        name: String,
        /// Failure description reported by the action.
        message: String,
    },

    /// Internal invariant violation (e.g. a poisoned lock).
    #[error("internal error: {message}")]
    Internal {
        /// Description of the violated invariant.
        message: String,
    },
}

impl DispatchError {
    /// Returns the HTTP status code the error layer should answer with.
    ///
    /// Every dispatch failure is a server-side fault; a missing route is
    /// reported as [`Outcome::Unhandled`](crate::app::Outcome) instead.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Resource { .. }
            | Self::Parse { .. }
            | Self::Execution { .. }
            | Self::UnrecognisedExtension { .. }
            | Self::Action { .. }
            | Self::Internal { .. } => 500,
        }
    }

    /// Returns the script resource involved in the failure, when there is one.
    #[must_use]
    pub fn resource(&self) -> Option<&str> {
        match self {
            Self::Resource { path, .. } | Self::UnrecognisedExtension { path } => Some(path),
            Self::Parse { resource, .. } | Self::Execution { resource, .. } => Some(resource),
            Self::Action { .. } | Self::Internal { .. } => None,
        }
    }

    /// Creates a resource error from an I/O failure.
    pub fn resource_io(path: impl Into<String>, source: io::Error) -> Self {
        Self::Resource {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    /// Creates an execution error tagged with the script resource.
    pub fn execution(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Creates an unrecognised extension error.
    pub fn unrecognised_extension(path: impl Into<String>) -> Self {
        Self::UnrecognisedExtension { path: path.into() }
    }

    /// Creates an action failure.
    pub fn action(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Action {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Tags a script engine failure with the resource it concerns.
    pub fn from_script(resource: impl Into<String>, error: ScriptError) -> Self {
        let resource = resource.into();
        match error {
            ScriptError::Syntax { message } => Self::Parse { resource, message },
            ScriptError::Execution { message } => Self::Execution { resource, message },
            ScriptError::Io { source } => Self::Resource {
                path: resource,
                source,
            },
            ScriptError::Engine { message } => Self::Internal {
                message: format!("script engine failed on '{resource}': {message}"),
            },
        }
    }
}

/// Failure reported by a node action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ActionError {
    message: String,
}

impl ActionError {
    /// Creates an action error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Human-readable failure description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors raised while registering extensions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// An extension with the same name is already registered.
    #[error("extension '{name}' is already registered")]
    Duplicate {
        /// Name that collided.
        name: String,
    },
    /// The extension name was empty.
    #[error("extension name must not be empty")]
    EmptyName,
}

#[cfg(test)]
mod tests;
