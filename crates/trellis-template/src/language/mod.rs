//! Template languages and the script adapters built on them.
//!
//! A [`TemplateLanguage`] knows how to compile one file extension. Each
//! language gets a [`TemplateContainer`] bound to the facet's engine; the
//! container is the [`ScriptEngine`] that turns resources into
//! [`TemplateScript`]s.

use std::fmt;
use std::sync::Arc;

use trellis::error::RegistrationError;
use trellis::facet::ExtensionRegistry;
use trellis::resource::Resource;
use trellis::script::{RenderContext, Rendered, Script, ScriptEngine, ScriptError};
use trellis::Node;

use crate::engine::{EngineHandle, RenderJob, TemplateId};
use crate::syntax::Template;

/// A template compiled on the engine thread.
pub trait CompiledTemplate {
    /// Renders the template for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Execution`] when rendering faults.
    fn render(&self, context: &RenderContext, target: &dyn Node) -> Result<String, ScriptError>;
}

/// A view template language handling one file extension.
pub trait TemplateLanguage: Send + Sync {
    /// Registration name of the language.
    fn name(&self) -> &str;

    /// File extension including the dot, e.g. `.tpl`.
    fn extension(&self) -> &str;

    /// Content type of rendered output.
    fn content_type(&self) -> &str;

    /// Compiles `source`. Called on the engine thread only.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Syntax`] when the source is malformed.
    fn compile(&self, source: &str) -> Result<Box<dyn CompiledTemplate>, ScriptError>;

    /// Builds the script adapter for this language on `engine`.
    fn create_container(&self, engine: &EngineHandle) -> TemplateContainer;
}

/// `${...}` interpolation over node properties and request data.
#[derive(Debug, Default, Clone, Copy)]
pub struct InterpolatedLanguage;

impl TemplateLanguage for InterpolatedLanguage {
    fn name(&self) -> &str {
        "interpolated"
    }

    fn extension(&self) -> &str {
        ".tpl"
    }

    fn content_type(&self) -> &str {
        "text/html"
    }

    fn compile(&self, source: &str) -> Result<Box<dyn CompiledTemplate>, ScriptError> {
        let template =
            Template::parse(source).map_err(|error| ScriptError::syntax(error.to_string()))?;
        Ok(Box::new(template))
    }

    fn create_container(&self, engine: &EngineHandle) -> TemplateContainer {
        TemplateContainer::new(Arc::new(*self), engine.clone())
    }
}

impl CompiledTemplate for Template {
    fn render(&self, context: &RenderContext, target: &dyn Node) -> Result<String, ScriptError> {
        Self::render(self, context, target).map_err(|error| ScriptError::execution(error.to_string()))
    }
}

/// Plain text served as written.
#[derive(Debug, Default, Clone, Copy)]
pub struct VerbatimLanguage;

struct Verbatim(String);

impl CompiledTemplate for Verbatim {
    fn render(&self, _context: &RenderContext, _target: &dyn Node) -> Result<String, ScriptError> {
        Ok(self.0.clone())
    }
}

impl TemplateLanguage for VerbatimLanguage {
    fn name(&self) -> &str {
        "verbatim"
    }

    fn extension(&self) -> &str {
        ".txt"
    }

    fn content_type(&self) -> &str {
        "text/plain"
    }

    fn compile(&self, source: &str) -> Result<Box<dyn CompiledTemplate>, ScriptError> {
        Ok(Box::new(Verbatim(source.to_owned())))
    }

    fn create_container(&self, engine: &EngineHandle) -> TemplateContainer {
        TemplateContainer::new(Arc::new(*self), engine.clone())
    }
}

/// Registry holding the built-in languages, `.tpl` first.
///
/// # Errors
///
/// Returns a [`RegistrationError`] if the built-in names collide.
pub fn builtin_languages() -> Result<ExtensionRegistry<dyn TemplateLanguage>, RegistrationError> {
    let mut registry: ExtensionRegistry<dyn TemplateLanguage> = ExtensionRegistry::new();
    for language in [
        Arc::new(InterpolatedLanguage) as Arc<dyn TemplateLanguage>,
        Arc::new(VerbatimLanguage),
    ] {
        registry.register(language.name().to_owned(), language)?;
    }
    Ok(registry)
}

/// Script adapter for one language, bound to an engine.
#[derive(Clone)]
pub struct TemplateContainer {
    language: Arc<dyn TemplateLanguage>,
    engine: EngineHandle,
}

impl TemplateContainer {
    /// Binds `language` to `engine`.
    #[must_use]
    pub fn new(language: Arc<dyn TemplateLanguage>, engine: EngineHandle) -> Self {
        Self { language, engine }
    }

    /// The language compiled by this container.
    #[must_use]
    pub fn language(&self) -> &dyn TemplateLanguage {
        self.language.as_ref()
    }
}

impl ScriptEngine for TemplateContainer {
    fn extension(&self) -> &str {
        self.language.extension()
    }

    fn parse_script(&self, resource: &Resource) -> Result<Arc<dyn Script>, ScriptError> {
        let source = resource.read_to_string().map_err(ScriptError::io)?;
        let id = self
            .engine
            .compile(Arc::clone(&self.language), resource.path(), source)?;
        Ok(Arc::new(TemplateScript {
            resource: resource.path().to_owned(),
            content_type: self.language.content_type().to_owned(),
            id,
            engine: self.engine.clone(),
        }))
    }
}

impl fmt::Debug for TemplateContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateContainer")
            .field("language", &self.language.name())
            .field("extension", &self.language.extension())
            .finish()
    }
}

/// A compiled template, invocable from any thread.
///
/// The compiled form stays on the engine thread and is released when the
/// script is dropped.
#[derive(Debug)]
pub struct TemplateScript {
    resource: String,
    content_type: String,
    id: TemplateId,
    engine: EngineHandle,
}

impl TemplateScript {
    /// Engine-side identifier of the compiled template.
    #[must_use]
    pub const fn id(&self) -> TemplateId {
        self.id
    }
}

impl Script for TemplateScript {
    fn resource(&self) -> &str {
        &self.resource
    }

    fn invoke(
        &self,
        context: &RenderContext,
        target: &Arc<dyn Node>,
    ) -> Result<Rendered, ScriptError> {
        let body = self
            .engine
            .render(self.id, RenderJob::new(context.clone(), Arc::clone(target)))?;
        Ok(Rendered::new(body, self.content_type.as_str()))
    }
}

impl Drop for TemplateScript {
    fn drop(&mut self) {
        self.engine.release(self.id);
    }
}

#[cfg(test)]
mod tests;
