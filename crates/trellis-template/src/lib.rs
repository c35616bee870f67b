//! Template view facet for the trellis dispatcher.
//!
//! Views are template files resolved by class, e.g. `shop/Cart/index.tpl`
//! for view `index` of class `shop.Cart`. Two languages ship built in:
//! interpolated templates (`.tpl`, see [`syntax`]) and verbatim text
//! (`.txt`). All compilation and rendering happens on one engine thread per
//! facet; scripts handed to the dispatcher submit render jobs to it.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use trellis::facet::Facet;
//! use trellis::{Class, ObjectNode, Request, Response, WebApp};
//! use trellis_config::Config;
//! use trellis_template::TemplateFacet;
//!
//! let config = Config::default();
//! let facet: Arc<dyn Facet> = Arc::new(TemplateFacet::from_config(&config).expect("facet"));
//! let app = WebApp::from_config(&config, vec![facet]);
//! let root = ObjectNode::new(Class::new("shop.Shop")).into_shared();
//!
//! let mut response = Response::new();
//! let outcome = app
//!     .dispatch(&root, &mut Request::new("/"), &mut response)
//!     .expect("dispatch");
//! println!("{outcome:?}: {}", response.body());
//! ```

pub mod engine;
pub mod facet;
pub mod language;
pub mod syntax;

pub use engine::{EngineError, EngineHandle, RenderJob, TemplateId};
pub use facet::{FacetError, TemplateFacet, TemplateTearOff};
pub use language::{
    CompiledTemplate, InterpolatedLanguage, TemplateContainer, TemplateLanguage, TemplateScript,
    VerbatimLanguage, builtin_languages,
};

#[cfg(test)]
mod tests;
