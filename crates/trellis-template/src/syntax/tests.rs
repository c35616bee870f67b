//! Unit tests for template parsing and rendering.

use rstest::{fixture, rstest};
use trellis::{Class, ObjectNode, Request};

use super::*;

#[fixture]
fn book() -> ObjectNode {
    ObjectNode::new(Class::new("shop.Book"))
        .with_property("title", "Dune")
        .with_property("page_count", "412")
}

fn context(path: &str, consumed: usize) -> RenderContext {
    let mut request = Request::new(path).with_parameter("lang", "en");
    for _ in 0..consumed {
        request.tokens_mut().advance();
    }
    RenderContext::from_request(&request)
}

#[rstest]
#[case("plain text", "plain text")]
#[case("${it.title}", "Dune")]
#[case("<h1>${ it.title }</h1> (${it.page_count} pages)", "<h1>Dune</h1> (412 pages)")]
#[case("price: $$5 or $ 6", "price: $5 or $ 6")]
#[case("${request.path} -> ${request.rest}", "/books/dune/summary -> /summary")]
#[case("language=${param.lang}", "language=en")]
#[case("trailing $", "trailing $")]
fn renders_expressions(book: ObjectNode, #[case] source: &str, #[case] expected: &str) {
    let template = Template::parse(source).expect("parse");
    let rendered = template
        .render(&context("/books/dune/summary", 2), &book)
        .expect("render");
    assert_eq!(rendered, expected);
}

#[rstest]
#[case("before ${it.title", 7, "unterminated expression")]
#[case("${}", 0, "empty expression")]
#[case("${  }", 0, "empty expression")]
#[case("x ${session.user}", 2, "unknown expression 'session.user'")]
#[case("${request.method}", 0, "unknown request attribute 'method'")]
#[case("${it.}", 0, "unknown expression 'it.'")]
fn rejects_malformed_expressions(
    #[case] source: &str,
    #[case] offset: usize,
    #[case] message: &str,
) {
    let error = Template::parse(source).expect_err("malformed");
    assert_eq!(error.offset(), offset);
    assert_eq!(error.message(), message);
}

#[test]
fn literal_runs_are_merged() {
    let template = Template::parse("a$$b${it.title}c").expect("parse");
    assert_eq!(
        template.segments(),
        [
            Segment::Literal(String::from("a$b")),
            Segment::Expr(Expr::Property(String::from("title"))),
            Segment::Literal(String::from("c")),
        ]
    );
}

#[rstest]
fn missing_property_is_render_error(book: ObjectNode) {
    let template = Template::parse("${it.author}").expect("parse");
    let error = template
        .render(&context("/", 0), &book)
        .expect_err("undefined property");
    assert_eq!(
        error,
        RenderError::MissingProperty {
            name: String::from("author")
        }
    );
}

#[rstest]
fn missing_parameter_is_render_error(book: ObjectNode) {
    let template = Template::parse("${param.page}").expect("parse");
    let error = template
        .render(&context("/", 0), &book)
        .expect_err("undefined parameter");
    assert_eq!(error.to_string(), "undefined request parameter 'param.page'");
}

#[test]
fn expressions_display_as_source() {
    assert_eq!(Expr::Property(String::from("title")).to_string(), "${it.title}");
    assert_eq!(Expr::RequestRest.to_string(), "${request.rest}");
}
