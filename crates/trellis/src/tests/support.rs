//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::class::{Class, WeakClass};
use crate::dispatch::{Dispatcher, ScriptInvokingDispatcher, TearOffLookup};
use crate::error::DispatchError;
use crate::facet::Facet;
use crate::meta_class::MetaClass;
use crate::node::Node;
use crate::request::{Request, Response};
use crate::script::{RenderContext, Rendered, Script, ScriptError, ScriptInvoker, ViewRenderer};
use crate::tear_off::{TearOff, TearOffType};

pub(crate) const STUB_EXTENSION: &str = ".stub";

/// Script that substitutes `${name}` with the target's properties.
#[derive(Debug)]
pub(crate) struct StubScript {
    resource: String,
    outcome: Result<String, String>,
}

impl StubScript {
    pub(crate) fn rendering(resource: &str, template: &str) -> Self {
        Self {
            resource: resource.to_owned(),
            outcome: Ok(template.to_owned()),
        }
    }

    pub(crate) fn failing(resource: &str, message: &str) -> Self {
        Self {
            resource: resource.to_owned(),
            outcome: Err(message.to_owned()),
        }
    }
}

impl Script for StubScript {
    fn resource(&self) -> &str {
        &self.resource
    }

    fn invoke(
        &self,
        _context: &RenderContext,
        target: &Arc<dyn Node>,
    ) -> Result<Rendered, ScriptError> {
        let template = self.outcome.as_ref().map_err(ScriptError::execution)?;
        let mut body = String::new();
        let mut rest = template.as_str();
        while let Some((before, after)) = rest.split_once("${") {
            body.push_str(before);
            let (name, tail) = after.split_once('}').unwrap_or((after, ""));
            body.push_str(&target.property(name).unwrap_or_default());
            rest = tail;
        }
        body.push_str(rest);
        Ok(Rendered::new(body, "text/plain"))
    }
}

type Library = HashMap<String, Arc<dyn Script>>;

/// Tear-off resolving `pkg/Type/view.stub` from an in-memory library.
#[derive(Debug)]
pub(crate) struct StubTearOff {
    class: WeakClass,
    library: Arc<Library>,
}

impl TearOff for StubTearOff {
    fn find_script(&self, view: &str) -> Result<Option<Arc<dyn Script>>, DispatchError> {
        let Some(class) = self.class.upgrade() else {
            return Ok(None);
        };
        Ok(class.ancestry().find_map(|candidate| {
            candidate
                .resource_path(view, STUB_EXTENSION)
                .and_then(|path| self.library.get(&path).cloned())
        }))
    }

    fn default_extension(&self) -> &str {
        STUB_EXTENSION
    }
}

struct StubTearOffType {
    library: Arc<Library>,
}

impl TearOffType for StubTearOffType {
    fn key(&self) -> &str {
        "stub"
    }

    fn create(&self, class: &Class) -> Arc<dyn TearOff> {
        Arc::new(StubTearOff {
            class: class.downgrade(),
            library: Arc::clone(&self.library),
        })
    }
}

/// Facet serving scripts from an in-memory library through a tear-off.
pub(crate) struct StubFacet {
    name: String,
    kind: StubTearOffType,
    builds: AtomicUsize,
}

impl StubFacet {
    pub(crate) fn new(name: &str, scripts: Vec<StubScript>) -> Self {
        let library = scripts
            .into_iter()
            .map(|script| {
                let script: Arc<dyn Script> = Arc::new(script);
                (script.resource().to_owned(), script)
            })
            .collect();
        Self {
            name: name.to_owned(),
            kind: StubTearOffType {
                library: Arc::new(library),
            },
            builds: AtomicUsize::new(0),
        }
    }

    pub(crate) fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl Facet for StubFacet {
    fn name(&self) -> &str {
        &self.name
    }

    fn build_view_dispatchers(
        &self,
        owner: &MetaClass,
        dispatchers: &mut Vec<Arc<dyn Dispatcher>>,
    ) -> Result<(), DispatchError> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        let tear_off = owner.load_tear_off(&self.kind)?;
        dispatchers.push(Arc::new(ScriptInvokingDispatcher::new(TearOffLookup::new(
            tear_off,
        ))));
        Ok(())
    }

    fn handle_index_request(
        &self,
        request: &mut Request,
        response: &mut Response,
        node: &Arc<dyn Node>,
        owner: &MetaClass,
    ) -> Result<bool, DispatchError> {
        let tear_off = owner.load_tear_off(&self.kind)?;
        let Some(script) = tear_off.find_script("index")? else {
            return Ok(false);
        };
        ScriptInvoker::invoke_script(request, response, script.as_ref(), node)?;
        Ok(true)
    }

    fn script_extensions(&self) -> Vec<String> {
        vec![STUB_EXTENSION.to_owned()]
    }

    fn create_view_renderer(
        &self,
        owner: &MetaClass,
        view: &str,
    ) -> Result<Option<ViewRenderer>, DispatchError> {
        let tear_off = owner.load_tear_off(&self.kind)?;
        Ok(tear_off.find_script(view)?.map(ViewRenderer::new))
    }
}
