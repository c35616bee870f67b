//! Unit tests for template languages and containers.

use rstest::{fixture, rstest};
use trellis::{Class, ObjectNode, Request};

use super::*;
use crate::engine::EngineError;

#[fixture]
fn engine() -> EngineHandle {
    EngineHandle::spawn().expect("spawn engine")
}

fn cart() -> Arc<dyn Node> {
    ObjectNode::new(Class::new("shop.Cart"))
        .with_property("count", "5")
        .into_shared()
}

fn context() -> RenderContext {
    RenderContext::from_request(&Request::new("/cart").with_parameter("sort", "price"))
}

#[rstest]
#[case(Arc::new(InterpolatedLanguage), ".tpl", "text/html")]
#[case(Arc::new(VerbatimLanguage), ".txt", "text/plain")]
fn containers_report_language_details(
    engine: EngineHandle,
    #[case] language: Arc<dyn TemplateLanguage>,
    #[case] extension: &str,
    #[case] content_type: &str,
) {
    let container = language.create_container(&engine);
    assert_eq!(container.extension(), extension);
    assert_eq!(container.language().content_type(), content_type);
}

#[rstest]
fn interpolated_script_renders_with_content_type(engine: EngineHandle) {
    let container = InterpolatedLanguage.create_container(&engine);
    let resource = Resource::memory(
        "shop/Cart/index.tpl",
        "<p>${it.count} sorted by ${param.sort}</p>",
    );

    let script = container.parse_script(&resource).expect("parse");
    let rendered = script.invoke(&context(), &cart()).expect("invoke");

    assert_eq!(script.resource(), "shop/Cart/index.tpl");
    assert_eq!(rendered.body(), "<p>5 sorted by price</p>");
    assert_eq!(rendered.content_type(), "text/html");
}

#[rstest]
fn verbatim_script_ignores_expressions(engine: EngineHandle) {
    let container = VerbatimLanguage.create_container(&engine);
    let resource = Resource::memory("shop/Cart/help.txt", "literal ${it.count}");

    let rendered = container
        .parse_script(&resource)
        .expect("parse")
        .invoke(&context(), &cart())
        .expect("invoke");

    assert_eq!(rendered.body(), "literal ${it.count}");
    assert_eq!(rendered.content_type(), "text/plain");
}

#[rstest]
fn malformed_template_is_syntax_error(engine: EngineHandle) {
    let container = InterpolatedLanguage.create_container(&engine);
    let resource = Resource::memory("shop/Cart/index.tpl", "${unknown}");
    let error = container.parse_script(&resource).expect_err("syntax");
    assert!(matches!(error, ScriptError::Syntax { .. }));
}

#[rstest]
fn unreadable_resource_is_io_error(engine: EngineHandle) {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("gone.tpl");
    let resource = Resource::file(
        "shop/Cart/gone.tpl",
        missing.to_str().expect("utf-8 temp path"),
    );
    let container = InterpolatedLanguage.create_container(&engine);
    let error = container.parse_script(&resource).expect_err("missing file");
    assert!(matches!(error, ScriptError::Io { .. }));
}

#[rstest]
fn dropping_script_releases_template(engine: EngineHandle) {
    let id = engine
        .compile(Arc::new(VerbatimLanguage), "a.txt", String::from("a"))
        .expect("compile");
    let script = TemplateScript {
        resource: String::from("a.txt"),
        content_type: String::from("text/plain"),
        id,
        engine: engine.clone(),
    };
    assert_eq!(
        script.invoke(&context(), &cart()).expect("invoke").body(),
        "a"
    );

    drop(script);

    let error = engine
        .render(id, RenderJob::new(context(), cart()))
        .expect_err("released");
    assert!(matches!(error, EngineError::UnknownTemplate(_)));
}

#[test]
fn builtin_registry_lists_languages_in_priority_order() {
    let registry = builtin_languages().expect("builtin languages");
    assert_eq!(registry.names(), ["interpolated", "verbatim"]);
    let extensions: Vec<String> = registry
        .discover()
        .iter()
        .map(|language| language.extension().to_owned())
        .collect();
    assert_eq!(extensions, [".tpl", ".txt"]);
}
