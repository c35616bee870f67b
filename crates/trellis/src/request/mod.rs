//! Per-request dispatch context and in-memory response.
//!
//! [`Request`] carries the cursor over the remaining path tokens together with
//! the stack of nodes visited so far. Dispatchers peek at the next token and
//! only consume it once they have decided to claim it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use percent_encoding::percent_decode_str;

use crate::node::Node;
use crate::script::Rendered;

/// Cursor over the decoded segments of a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens {
    tokens: Vec<String>,
    position: usize,
}

impl Tokens {
    /// Splits a path into percent-decoded tokens, skipping empty segments.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let tokens = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
            .collect();
        Self {
            tokens,
            position: 0,
        }
    }

    /// Returns the next token without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<&str> {
        self.tokens.get(self.position).map(String::as_str)
    }

    /// Consumes and returns the next token.
    pub fn advance(&mut self) -> Option<&str> {
        let token = self.tokens.get(self.position)?;
        self.position += 1;
        Some(token.as_str())
    }

    /// Whether any tokens remain.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.position < self.tokens.len()
    }

    /// Number of tokens left to consume.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.tokens.len().saturating_sub(self.position)
    }

    /// Tokens consumed so far.
    #[must_use]
    pub fn consumed(&self) -> &[String] {
        self.tokens.get(..self.position).unwrap_or_default()
    }

    /// Tokens not yet consumed.
    #[must_use]
    pub fn unconsumed(&self) -> &[String] {
        self.tokens.get(self.position..).unwrap_or_default()
    }
}

impl fmt::Display for Tokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_path(self.unconsumed()))
    }
}

/// A node visited during dispatch, with the URL at which it was reached.
#[derive(Debug, Clone)]
pub struct Ancestor {
    node: Arc<dyn Node>,
    url: String,
}

impl Ancestor {
    /// The visited node.
    #[must_use]
    pub fn node(&self) -> &Arc<dyn Node> {
        &self.node
    }

    /// URL prefix that resolved to this node, e.g. `/` or `/shop/cart`.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Request being resolved against an object graph.
///
/// # Example
///
/// ```
/// use trellis::Request;
///
/// let mut request = Request::new("/shop/cart%20items/");
/// assert_eq!(request.tokens().peek(), Some("shop"));
/// request.tokens_mut().advance();
/// assert_eq!(request.rest_of_path(), "/cart items");
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    path: String,
    tokens: Tokens,
    ancestors: Vec<Ancestor>,
    parameters: BTreeMap<String, String>,
}

impl Request {
    /// Creates a request for `path`.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let tokens = Tokens::parse(&path);
        Self {
            path,
            tokens,
            ancestors: Vec::new(),
            parameters: BTreeMap::new(),
        }
    }

    /// Adds a request parameter.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Original request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Remaining path tokens.
    #[must_use]
    pub const fn tokens(&self) -> &Tokens {
        &self.tokens
    }

    /// Mutable access to the token cursor.
    pub const fn tokens_mut(&mut self) -> &mut Tokens {
        &mut self.tokens
    }

    /// Unconsumed remainder of the path, with a leading `/`.
    #[must_use]
    pub fn rest_of_path(&self) -> String {
        self.tokens.to_string()
    }

    /// Looks up a request parameter.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    /// All request parameters.
    #[must_use]
    pub const fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    /// Nodes visited so far, root first.
    #[must_use]
    pub fn ancestors(&self) -> &[Ancestor] {
        &self.ancestors
    }

    /// Records `node` as reached at the current position of the cursor.
    pub(crate) fn push_ancestor(&mut self, node: Arc<dyn Node>) {
        let url = join_path(self.tokens.consumed());
        self.ancestors.push(Ancestor { node, url });
    }
}

/// In-memory response written by actions and views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    content_type: Option<String>,
    body: String,
    committed: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            content_type: None,
            body: String::new(),
            committed: false,
        }
    }
}

impl Response {
    /// Creates an empty, uncommitted response with status 200.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Sets the HTTP status code.
    pub const fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// Content type of the body, once set.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Response body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Whether a body has been committed.
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        self.committed
    }

    /// Writes a complete body and marks the response committed.
    pub fn send(&mut self, content_type: impl Into<String>, body: impl Into<String>) {
        self.content_type = Some(content_type.into());
        self.body = body.into();
        self.committed = true;
    }

    /// Commits rendered view output.
    pub fn commit(&mut self, rendered: Rendered) {
        let (content_type, body) = rendered.into_parts();
        self.send(content_type, body);
    }
}

fn join_path(tokens: &[String]) -> String {
    if tokens.is_empty() {
        return "/".to_owned();
    }
    tokens.iter().fold(String::new(), |mut path, token| {
        path.push('/');
        path.push_str(token);
        path
    })
}

#[cfg(test)]
mod tests;
