//! Unit tests for the script invoker.

use std::sync::Arc;

use super::*;
use crate::class::Class;
use crate::node::ObjectNode;
use crate::tests::support::StubScript;

fn node() -> Arc<dyn Node> {
    ObjectNode::new(Class::new("shop.Cart"))
        .with_property("count", "2")
        .into_shared()
}

#[test]
fn render_context_captures_request() {
    let mut request = Request::new("/cart/items").with_parameter("page", "3");
    request.tokens_mut().advance();
    let context = RenderContext::from_request(&request);
    assert_eq!(context.path(), "/cart/items");
    assert_eq!(context.rest(), "/items");
    assert_eq!(context.parameter("page"), Some("3"));
}

#[test]
fn successful_script_commits_response() {
    let script = StubScript::rendering("shop/Cart/index.tpl", "count=${count}");
    let request = Request::new("/");
    let mut response = Response::new();

    ScriptInvoker::invoke_script(&request, &mut response, &script, &node()).expect("invoke");

    assert!(response.is_committed());
    assert_eq!(response.body(), "count=2");
    assert_eq!(response.content_type(), Some("text/plain"));
}

#[test]
fn failing_script_leaves_response_uncommitted() {
    let script = StubScript::failing("shop/Cart/broken.tpl", "division by zero");
    let request = Request::new("/");
    let mut response = Response::new();

    let error = ScriptInvoker::invoke_script(&request, &mut response, &script, &node())
        .expect_err("script should fail");

    assert!(matches!(error, DispatchError::Execution { .. }));
    assert_eq!(error.resource(), Some("shop/Cart/broken.tpl"));
    assert!(!response.is_committed());
    assert_eq!(response.body(), "");
}

#[test]
fn view_renderer_forwards_to_script() {
    let renderer = ViewRenderer::new(Arc::new(StubScript::rendering("shop/Cart/row.tpl", "row")));
    assert_eq!(renderer.resource(), "shop/Cart/row.tpl");
    let mut response = Response::new();
    renderer
        .forward(&Request::new("/"), &mut response, &node())
        .expect("forward");
    assert_eq!(response.body(), "row");
}
