//! Unit tests for the request cursor and response.

use rstest::rstest;

use super::*;
use crate::script::Rendered;

#[rstest]
#[case("/", &[])]
#[case("", &[])]
#[case("/shop", &["shop"])]
#[case("/shop/cart/", &["shop", "cart"])]
#[case("//shop///cart", &["shop", "cart"])]
#[case("/caf%C3%A9/a%2Fb", &["café", "a/b"])]
fn parses_tokens(#[case] path: &str, #[case] expected: &[&str]) {
    let tokens = Tokens::parse(path);
    assert_eq!(tokens.unconsumed(), expected);
}

#[test]
fn peek_does_not_consume() {
    let mut tokens = Tokens::parse("/a/b");
    assert_eq!(tokens.peek(), Some("a"));
    assert_eq!(tokens.peek(), Some("a"));
    assert_eq!(tokens.remaining(), 2);
    assert_eq!(tokens.advance(), Some("a"));
    assert_eq!(tokens.peek(), Some("b"));
    assert_eq!(tokens.consumed(), ["a"]);
}

#[test]
fn advancing_past_end_yields_none() {
    let mut tokens = Tokens::parse("/a");
    assert_eq!(tokens.advance(), Some("a"));
    assert!(!tokens.has_more());
    assert_eq!(tokens.advance(), None);
    assert_eq!(tokens.remaining(), 0);
}

#[test]
fn rest_of_path_reflects_cursor() {
    let mut request = Request::new("/shop/cart/items");
    assert_eq!(request.rest_of_path(), "/shop/cart/items");
    request.tokens_mut().advance();
    assert_eq!(request.rest_of_path(), "/cart/items");
    request.tokens_mut().advance();
    request.tokens_mut().advance();
    assert_eq!(request.rest_of_path(), "/");
}

#[test]
fn parameters_are_retrievable() {
    let request = Request::new("/").with_parameter("q", "books");
    assert_eq!(request.parameter("q"), Some("books"));
    assert_eq!(request.parameter("missing"), None);
    assert_eq!(request.path(), "/");
}

#[test]
fn response_starts_uncommitted() {
    let response = Response::new();
    assert_eq!(response.status(), 200);
    assert!(!response.is_committed());
    assert_eq!(response.body(), "");
    assert_eq!(response.content_type(), None);
}

#[test]
fn commit_writes_rendered_output() {
    let mut response = Response::new();
    response.commit(Rendered::new("<p>hi</p>", "text/html"));
    assert!(response.is_committed());
    assert_eq!(response.body(), "<p>hi</p>");
    assert_eq!(response.content_type(), Some("text/html"));
}
