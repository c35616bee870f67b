//! The template view facet.
//!
//! [`TemplateFacet`] renders views written in any registered
//! [`TemplateLanguage`]. For every class taking part in dispatch it
//! contributes one rule per language, backed by a cached per-class tear-off.
//! Classes defined at runtime additionally get a rule resolving views
//! through the facet's class-info cache, across all languages.

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use trellis::class::Class;
use trellis::class_info::{ClassInfo, ClassInfoCache, ScriptResolver};
use trellis::dispatch::{Dispatcher, ScriptInvokingDispatcher, ScriptLookup, TearOffLookup};
use trellis::error::DispatchError;
use trellis::facet::{ExtensionRegistry, Facet};
use trellis::meta_class::MetaClass;
use trellis::resource::{DirectoryLoader, Resource, ResourceLoader};
use trellis::script::{Script, ScriptEngine, ScriptInvoker, ViewRenderer};
use trellis::tear_off::{TearOff, TearOffType};
use trellis::{Node, Request, Response};
use trellis_config::Config;

use crate::engine::{ENGINE_TARGET, EngineError, EngineHandle};
use crate::language::{TemplateContainer, TemplateLanguage, builtin_languages};

/// Errors raised while building a [`TemplateFacet`].
#[derive(Debug, thiserror::Error)]
pub enum FacetError {
    /// The engine thread could not be started.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// The language registry could not be assembled.
    #[error(transparent)]
    Registration(#[from] trellis::RegistrationError),
}

/// Resolves a view for one class through one container.
struct ContainerResolver {
    container: Arc<TemplateContainer>,
    loader: Arc<dyn ResourceLoader>,
}

impl ContainerResolver {
    fn parse(&self, resource: &Resource) -> Result<Arc<dyn Script>, DispatchError> {
        self.container
            .parse_script(resource)
            .map_err(|error| DispatchError::from_script(resource.path(), error))
    }
}

impl ScriptResolver for ContainerResolver {
    fn resolve(&self, class: &Class, view: &str) -> Result<Option<Arc<dyn Script>>, DispatchError> {
        let Some(path) = class.resource_path(view, self.container.extension()) else {
            return Ok(None);
        };
        self.loader
            .find(&path)?
            .map(|resource| self.parse(&resource))
            .transpose()
    }
}

struct FacetShared {
    resolvers: Vec<ContainerResolver>,
    class_infos: ClassInfoCache,
}

impl ScriptResolver for FacetShared {
    fn resolve(&self, class: &Class, view: &str) -> Result<Option<Arc<dyn Script>>, DispatchError> {
        for resolver in &self.resolvers {
            if let Some(script) = resolver.resolve(class, view)? {
                return Ok(Some(script));
            }
        }
        Ok(None)
    }
}

impl FacetShared {
    fn class_info(&self, class: &Class) -> Result<Arc<ClassInfo>, DispatchError> {
        self.class_infos.get_class_info(class)
    }
}

/// Looks views up by the runtime class of the dispatched node.
struct ClassInfoLookup {
    shared: Arc<FacetShared>,
}

impl ScriptLookup for ClassInfoLookup {
    fn find_script(
        &self,
        node: &Arc<dyn Node>,
        view: &str,
    ) -> Result<Option<Arc<dyn Script>>, DispatchError> {
        self.shared
            .class_info(&node.class())?
            .find_script(view, self.shared.as_ref())
    }
}

/// Per-class view lookup for one language.
#[derive(Debug)]
pub struct TemplateTearOff {
    info: ClassInfo,
    extension: String,
    resolver: ContainerResolver,
}

impl fmt::Debug for ContainerResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerResolver")
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}

impl TearOff for TemplateTearOff {
    fn find_script(&self, view: &str) -> Result<Option<Arc<dyn Script>>, DispatchError> {
        self.info.find_script(view, &self.resolver)
    }

    fn default_extension(&self) -> &str {
        &self.extension
    }
}

/// Creates [`TemplateTearOff`]s for one language.
struct LanguageTearOffType {
    key: String,
    container: Arc<TemplateContainer>,
    loader: Arc<dyn ResourceLoader>,
}

impl TearOffType for LanguageTearOffType {
    fn key(&self) -> &str {
        &self.key
    }

    fn create(&self, class: &Class) -> Arc<dyn TearOff> {
        Arc::new(TemplateTearOff {
            info: ClassInfo::new(class),
            extension: self.container.extension().to_owned(),
            resolver: ContainerResolver {
                container: Arc::clone(&self.container),
                loader: Arc::clone(&self.loader),
            },
        })
    }
}

/// View facet rendering templates through a dedicated engine thread.
pub struct TemplateFacet {
    languages: Vec<Arc<dyn TemplateLanguage>>,
    containers: Vec<Arc<TemplateContainer>>,
    tear_off_types: Vec<LanguageTearOffType>,
    shared: Arc<FacetShared>,
    engine: EngineHandle,
}

impl TemplateFacet {
    /// Creates a facet for `languages`, reading views through `loader`.
    ///
    /// One container per language is created up front; the set of
    /// languages is fixed for the facet's lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`FacetError::Engine`] if the engine thread cannot start.
    pub fn new(
        languages: Vec<Arc<dyn TemplateLanguage>>,
        loader: Arc<dyn ResourceLoader>,
    ) -> Result<Self, FacetError> {
        let engine = EngineHandle::spawn()?;
        let containers: Vec<Arc<TemplateContainer>> = languages
            .iter()
            .map(|language| Arc::new(language.create_container(&engine)))
            .collect();
        let tear_off_types = containers
            .iter()
            .map(|container| LanguageTearOffType {
                key: format!("template{}", container.extension()),
                container: Arc::clone(container),
                loader: Arc::clone(&loader),
            })
            .collect();
        let resolvers = containers
            .iter()
            .map(|container| ContainerResolver {
                container: Arc::clone(container),
                loader: Arc::clone(&loader),
            })
            .collect();
        debug!(
            target: ENGINE_TARGET,
            languages = ?languages.iter().map(|language| language.name()).collect::<Vec<_>>(),
            "template facet ready"
        );
        Ok(Self {
            languages,
            containers,
            tear_off_types,
            shared: Arc::new(FacetShared {
                resolvers,
                class_infos: ClassInfoCache::new(),
            }),
            engine,
        })
    }

    /// Creates a facet for every language in `registry`, in registration
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`FacetError::Engine`] if the engine thread cannot start.
    pub fn discover(
        registry: &ExtensionRegistry<dyn TemplateLanguage>,
        loader: Arc<dyn ResourceLoader>,
    ) -> Result<Self, FacetError> {
        Self::new(registry.discover(), loader)
    }

    /// Creates a facet with the built-in languages serving the configured
    /// view root.
    ///
    /// # Errors
    ///
    /// Returns a [`FacetError`] if the engine thread cannot start.
    pub fn from_config(config: &Config) -> Result<Self, FacetError> {
        let loader = Arc::new(DirectoryLoader::from_config(config));
        Self::discover(&builtin_languages()?, loader)
    }

    /// Languages in priority order.
    #[must_use]
    pub fn languages(&self) -> &[Arc<dyn TemplateLanguage>] {
        &self.languages
    }

    /// Handle to the facet's engine thread.
    #[must_use]
    pub const fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    /// Parses `resource` with the container matching its extension.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnrecognisedExtension`] when no language
    /// handles the extension, or the parse failure tagged with the path.
    pub fn parse_script(&self, resource: &Resource) -> Result<Arc<dyn Script>, DispatchError> {
        let container = resource
            .extension()
            .and_then(|extension| {
                self.containers
                    .iter()
                    .find(|container| container.extension() == extension)
            })
            .ok_or_else(|| DispatchError::unrecognised_extension(resource.path()))?;
        container
            .parse_script(resource)
            .map_err(|error| DispatchError::from_script(resource.path(), error))
    }

    /// Number of classes with a live class-info entry.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Internal`] if the cache lock is poisoned.
    pub fn cached_classes(&self) -> Result<usize, DispatchError> {
        self.shared.class_infos.len()
    }

    fn invoke_index(
        request: &Request,
        response: &mut Response,
        node: &Arc<dyn Node>,
        script: &dyn Script,
    ) -> Result<bool, DispatchError> {
        debug!(target: ENGINE_TARGET, ?node, resource = script.resource(), "invoking index");
        ScriptInvoker::invoke_script(request, response, script, node)?;
        Ok(true)
    }
}

impl Facet for TemplateFacet {
    fn name(&self) -> &str {
        "template"
    }

    fn build_view_dispatchers(
        &self,
        owner: &MetaClass,
        dispatchers: &mut Vec<Arc<dyn Dispatcher>>,
    ) -> Result<(), DispatchError> {
        if owner.class().is_some_and(|class| class.is_dynamic()) {
            dispatchers.push(Arc::new(ScriptInvokingDispatcher::new(ClassInfoLookup {
                shared: Arc::clone(&self.shared),
            })));
        }
        for kind in &self.tear_off_types {
            let tear_off = owner.load_tear_off(kind)?;
            dispatchers.push(Arc::new(ScriptInvokingDispatcher::new(TearOffLookup::new(
                tear_off,
            ))));
        }
        Ok(())
    }

    fn handle_index_request(
        &self,
        request: &mut Request,
        response: &mut Response,
        node: &Arc<dyn Node>,
        owner: &MetaClass,
    ) -> Result<bool, DispatchError> {
        let class = node.class();
        if class.is_dynamic() {
            let info = self.shared.class_info(&class)?;
            if let Some(script) = info.find_script("index", self.shared.as_ref())? {
                return Self::invoke_index(request, response, node, script.as_ref());
            }
        }
        for kind in &self.tear_off_types {
            let tear_off = owner.load_tear_off(kind)?;
            if let Some(script) = tear_off.find_script("index")? {
                return Self::invoke_index(request, response, node, script.as_ref());
            }
        }
        Ok(false)
    }

    fn script_extensions(&self) -> Vec<String> {
        self.languages
            .iter()
            .map(|language| language.extension().to_owned())
            .collect()
    }

    fn create_view_renderer(
        &self,
        owner: &MetaClass,
        view: &str,
    ) -> Result<Option<ViewRenderer>, DispatchError> {
        let Some(primary) = self.tear_off_types.first() else {
            return Ok(None);
        };
        let tear_off = owner.load_tear_off(primary)?;
        Ok(tear_off.find_script(view)?.map(ViewRenderer::new))
    }
}

impl fmt::Debug for TemplateFacet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateFacet")
            .field("extensions", &self.script_extensions())
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}
