//! Interpolated template syntax.
//!
//! A template is literal text with `${...}` expressions:
//!
//! - `${it.NAME}` reads property `NAME` of the rendered node;
//! - `${request.path}` is the full request path;
//! - `${request.rest}` is the part of the path not yet consumed;
//! - `${param.NAME}` reads request parameter `NAME`.
//!
//! `$$` renders a literal `$`. A `$` followed by anything else is literal.

use std::fmt;
use std::mem;

use thiserror::Error;
use trellis::Node;
use trellis::script::RenderContext;

/// Error raised while parsing template source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at byte {offset}")]
pub struct SyntaxError {
    offset: usize,
    message: String,
}

impl SyntaxError {
    fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }

    /// Byte offset of the `$` opening the offending expression.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Description of the problem.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error raised while rendering a parsed template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The node has no property with the given name.
    #[error("undefined property 'it.{name}'")]
    MissingProperty {
        /// Property name.
        name: String,
    },
    /// The request carries no parameter with the given name.
    #[error("undefined request parameter 'param.{name}'")]
    MissingParameter {
        /// Parameter name.
        name: String,
    },
}

/// A value reference inside `${...}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// `it.NAME`
    Property(String),
    /// `request.path`
    RequestPath,
    /// `request.rest`
    RequestRest,
    /// `param.NAME`
    Parameter(String),
}

impl Expr {
    fn parse(text: &str) -> Result<Self, String> {
        if text.is_empty() {
            return Err(String::from("empty expression"));
        }
        match text.split_once('.') {
            Some(("it", name)) if is_identifier(name) => Ok(Self::Property(name.to_owned())),
            Some(("param", name)) if !name.is_empty() => Ok(Self::Parameter(name.to_owned())),
            Some(("request", "path")) => Ok(Self::RequestPath),
            Some(("request", "rest")) => Ok(Self::RequestRest),
            Some(("request", other)) => Err(format!("unknown request attribute '{other}'")),
            _ => Err(format!("unknown expression '{text}'")),
        }
    }

    fn evaluate(&self, context: &RenderContext, target: &dyn Node) -> Result<String, RenderError> {
        match self {
            Self::Property(name) => {
                target
                    .property(name)
                    .ok_or_else(|| RenderError::MissingProperty { name: name.clone() })
            }
            Self::RequestPath => Ok(context.path().to_owned()),
            Self::RequestRest => Ok(context.rest().to_owned()),
            Self::Parameter(name) => context
                .parameter(name)
                .map(str::to_owned)
                .ok_or_else(|| RenderError::MissingParameter { name: name.clone() }),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property(name) => write!(f, "${{it.{name}}}"),
            Self::RequestPath => f.write_str("${request.path}"),
            Self::RequestRest => f.write_str("${request.rest}"),
            Self::Parameter(name) => write!(f, "${{param.{name}}}"),
        }
    }
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '-')
}

/// A piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text copied to the output unchanged.
    Literal(String),
    /// An expression replaced by its value.
    Expr(Expr),
}

/// A parsed interpolated template.
///
/// # Example
///
/// ```
/// use trellis_template::syntax::Template;
///
/// let template = Template::parse("Hello ${it.name}, that costs $$5").expect("parse");
/// assert_eq!(template.segments().len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parses `source`.
    ///
    /// # Errors
    ///
    /// Returns a [`SyntaxError`] for an unterminated `${`, an empty
    /// expression, or an expression with an unknown root.
    pub fn parse(source: &str) -> Result<Self, SyntaxError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((offset, ch)) = chars.next() {
            if ch != '$' {
                literal.push(ch);
                continue;
            }
            match chars.peek().map(|&(_, next)| next) {
                Some('$') => {
                    chars.next();
                    literal.push('$');
                }
                Some('{') => {
                    chars.next();
                    let mut body = String::new();
                    let mut closed = false;
                    for (_, inner) in chars.by_ref() {
                        if inner == '}' {
                            closed = true;
                            break;
                        }
                        body.push(inner);
                    }
                    if !closed {
                        return Err(SyntaxError::new(offset, "unterminated expression"));
                    }
                    let expr = Expr::parse(body.trim())
                        .map_err(|message| SyntaxError::new(offset, message))?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(mem::take(&mut literal)));
                    }
                    segments.push(Segment::Expr(expr));
                }
                _ => literal.push('$'),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    /// Parsed segments in source order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Renders the template for `target`.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] when a referenced property or parameter is
    /// undefined.
    pub fn render(&self, context: &RenderContext, target: &dyn Node) -> Result<String, RenderError> {
        self.segments
            .iter()
            .try_fold(String::new(), |mut output, segment| {
                match segment {
                    Segment::Literal(text) => output.push_str(text),
                    Segment::Expr(expr) => output.push_str(&expr.evaluate(context, target)?),
                }
                Ok(output)
            })
    }
}

#[cfg(test)]
mod tests;
