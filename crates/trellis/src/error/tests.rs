//! Unit tests for dispatch error types.

use std::io;

use rstest::rstest;

use super::*;

#[test]
fn resource_error_message_includes_path() {
    let error = DispatchError::resource_io(
        "shop/Cart/index.tpl",
        io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
    );
    let message = error.to_string();
    assert!(
        message.contains("shop/Cart/index.tpl"),
        "expected path in message: {message}"
    );
    assert!(message.contains("denied"), "expected cause in message: {message}");
    assert_eq!(error.resource(), Some("shop/Cart/index.tpl"));
}

#[rstest]
#[case::syntax(ScriptError::syntax("unterminated expression"), "failed to parse")]
#[case::execution(ScriptError::execution("undefined property"), "failed during execution")]
#[case::engine(ScriptError::engine("engine thread stopped"), "internal error")]
fn script_errors_are_tagged_with_resource(#[case] error: ScriptError, #[case] expected: &str) {
    let error = DispatchError::from_script("shop/Cart/index.tpl", error);
    let message = error.to_string();
    assert!(message.contains(expected), "expected '{expected}' in: {message}");
    assert!(
        message.contains("shop/Cart/index.tpl"),
        "expected resource in: {message}"
    );
}

#[test]
fn script_io_error_becomes_resource_error() {
    let error = DispatchError::from_script(
        "shop/Cart/index.tpl",
        ScriptError::io(io::Error::new(io::ErrorKind::NotFound, "gone")),
    );
    assert!(matches!(error, DispatchError::Resource { .. }));
}

#[rstest]
#[case(DispatchError::execution("a.tpl", "boom"))]
#[case(DispatchError::unrecognised_extension("a.erb"))]
#[case(DispatchError::action("save", "rejected"))]
#[case(DispatchError::internal("lock poisoned"))]
fn every_failure_maps_to_server_error(#[case] error: DispatchError) {
    assert_eq!(error.status_code(), 500);
}

#[test]
fn action_and_internal_errors_have_no_resource() {
    assert_eq!(DispatchError::action("save", "nope").resource(), None);
    assert_eq!(DispatchError::internal("bad").resource(), None);
}

#[test]
fn duplicate_registration_names_the_extension() {
    let error = RegistrationError::Duplicate {
        name: "template".into(),
    };
    assert!(error.to_string().contains("template"));
}
