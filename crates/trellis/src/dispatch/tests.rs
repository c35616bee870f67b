//! Unit tests for the built-in and script-invoking dispatchers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rstest::{fixture, rstest};

use super::*;
use crate::class::Class;
use crate::error::ActionError;
use crate::node::ObjectNode;
use crate::tests::support::StubScript;

#[derive(Default)]
struct RecordingLookup {
    calls: AtomicUsize,
    script: Option<Arc<dyn Script>>,
}

impl RecordingLookup {
    fn with_script(script: StubScript) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            script: Some(Arc::new(script)),
        }
    }
}

impl ScriptLookup for Arc<RecordingLookup> {
    fn find_script(
        &self,
        _node: &Arc<dyn Node>,
        view: &str,
    ) -> Result<Option<Arc<dyn Script>>, DispatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .script
            .clone()
            .filter(|script| script.resource().ends_with(&format!("/{view}.tpl"))))
    }
}

#[fixture]
fn cart() -> Arc<dyn Node> {
    ObjectNode::new(Class::new("shop.Cart"))
        .with_property("count", "4")
        .with_child("items", ObjectNode::new(Class::new("shop.Items")))
        .with_action("clear", |_, response| {
            response.send("text/plain", "cleared");
            Ok(())
        })
        .with_action("explode", |_, _| Err(ActionError::new("kaboom")))
        .into_shared()
}

fn assert_declines_without_side_effects(dispatcher: &dyn Dispatcher, node: &Arc<dyn Node>) {
    let mut request = Request::new("/");
    let mut response = Response::new();
    let claim = dispatcher
        .dispatch(&mut request, &mut response, node)
        .expect("dispatch");
    assert!(!claim.is_claimed(), "{dispatcher} should decline");
    assert_eq!(request.tokens().remaining(), 0);
    assert!(!response.is_committed());
    assert_eq!(response, Response::new());
}

#[rstest]
fn builtin_rules_decline_with_no_tokens(cart: Arc<dyn Node>) {
    assert_declines_without_side_effects(&ActionDispatcher, &cart);
    assert_declines_without_side_effects(&ChildDispatcher, &cart);
}

#[rstest]
fn script_rule_declines_with_no_tokens_without_lookup(cart: Arc<dyn Node>) {
    let lookup = Arc::new(RecordingLookup::with_script(StubScript::rendering(
        "shop/Cart/index.tpl",
        "index",
    )));
    let dispatcher = ScriptInvokingDispatcher::new(Arc::clone(&lookup));
    assert_declines_without_side_effects(&dispatcher, &cart);
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
}

#[rstest]
fn action_rule_runs_named_action(cart: Arc<dyn Node>) {
    let mut request = Request::new("/clear/extra");
    let mut response = Response::new();
    let claim = ActionDispatcher
        .dispatch(&mut request, &mut response, &cart)
        .expect("dispatch");
    assert!(matches!(claim, Claim::Handled));
    assert_eq!(response.body(), "cleared");
    assert_eq!(request.rest_of_path(), "/extra");
}

#[rstest]
fn action_rule_declines_unknown_name_without_consuming(cart: Arc<dyn Node>) {
    let mut request = Request::new("/checkout");
    let mut response = Response::new();
    let claim = ActionDispatcher
        .dispatch(&mut request, &mut response, &cart)
        .expect("dispatch");
    assert!(matches!(claim, Claim::Declined));
    assert_eq!(request.tokens().peek(), Some("checkout"));
}

#[rstest]
fn action_failure_is_wrapped(cart: Arc<dyn Node>) {
    let mut request = Request::new("/explode");
    let mut response = Response::new();
    let error = ActionDispatcher
        .dispatch(&mut request, &mut response, &cart)
        .expect_err("action fails");
    assert!(matches!(error, DispatchError::Action { ref name, .. } if name == "explode"));
    assert!(error.to_string().contains("kaboom"));
}

#[rstest]
fn child_rule_continues_into_child(cart: Arc<dyn Node>) {
    let mut request = Request::new("/items");
    let mut response = Response::new();
    let claim = ChildDispatcher
        .dispatch(&mut request, &mut response, &cart)
        .expect("dispatch");
    let Claim::Continue(child) = claim else {
        panic!("expected continue, got {claim:?}");
    };
    assert_eq!(child.class().name(), "shop.Items");
    assert!(!request.tokens().has_more());
    assert!(!response.is_committed());
}

#[rstest]
fn script_rule_renders_matching_view(cart: Arc<dyn Node>) {
    let lookup = Arc::new(RecordingLookup::with_script(StubScript::rendering(
        "shop/Cart/summary.tpl",
        "${count} items",
    )));
    let dispatcher = ScriptInvokingDispatcher::new(lookup);
    let mut request = Request::new("/summary");
    let mut response = Response::new();

    let claim = dispatcher
        .dispatch(&mut request, &mut response, &cart)
        .expect("dispatch");

    assert!(matches!(claim, Claim::Handled));
    assert_eq!(response.body(), "4 items");
    assert!(!request.tokens().has_more());
}

#[rstest]
fn script_rule_declines_missing_view_without_consuming(cart: Arc<dyn Node>) {
    let lookup = Arc::new(RecordingLookup::with_script(StubScript::rendering(
        "shop/Cart/summary.tpl",
        "",
    )));
    let dispatcher = ScriptInvokingDispatcher::new(Arc::clone(&lookup));
    let mut request = Request::new("/details");
    let mut response = Response::new();

    let claim = dispatcher
        .dispatch(&mut request, &mut response, &cart)
        .expect("dispatch");

    assert!(matches!(claim, Claim::Declined));
    assert_eq!(request.tokens().peek(), Some("details"));
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
}

#[rstest]
fn script_failure_propagates_with_resource(cart: Arc<dyn Node>) {
    let lookup = Arc::new(RecordingLookup::with_script(StubScript::failing(
        "shop/Cart/summary.tpl",
        "undefined method",
    )));
    let dispatcher = ScriptInvokingDispatcher::new(lookup);
    let mut request = Request::new("/summary");
    let mut response = Response::new();

    let error = dispatcher
        .dispatch(&mut request, &mut response, &cart)
        .expect_err("script fails");

    assert_eq!(error.resource(), Some("shop/Cart/summary.tpl"));
    assert!(!response.is_committed());
}

#[test]
fn dispatchers_describe_their_url_shape() {
    let lookup = Arc::new(RecordingLookup::default());
    assert_eq!(
        ScriptInvokingDispatcher::new(lookup).to_string(),
        "TOKEN for url=/TOKEN/..."
    );
    assert!(ChildDispatcher.to_string().contains("MEMBER"));
    assert!(ActionDispatcher.to_string().contains("ACTION"));
}
