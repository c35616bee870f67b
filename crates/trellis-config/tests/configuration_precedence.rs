//! Precedence of command-line flags over built-in defaults.

use std::ffi::OsString;

use ortho_config::OrthoConfig;
use rstest::rstest;
use trellis_config::{Config, DispatchOrder, LogFormat};

fn args(flags: &[&str]) -> Vec<OsString> {
    std::iter::once("trellis")
        .chain(flags.iter().copied())
        .map(OsString::from)
        .collect()
}

#[test]
fn bare_invocation_yields_defaults() {
    let config = Config::load_from_iter(args(&[])).expect("load defaults");
    assert_eq!(config.dispatch_order(), DispatchOrder::ActionsViewsChildren);
    assert_eq!(config.log_filter(), trellis_config::DEFAULT_LOG_FILTER);
}

#[rstest]
#[case("views-actions-children", DispatchOrder::ViewsActionsChildren)]
#[case("actions-children-views", DispatchOrder::ActionsChildrenViews)]
fn cli_flag_overrides_dispatch_order(#[case] value: &str, #[case] expected: DispatchOrder) {
    let config =
        Config::load_from_iter(args(&["--dispatch-order", value])).expect("load with flag");
    assert_eq!(config.dispatch_order(), expected);
}

#[test]
fn cli_flags_override_logging_and_view_root() {
    let config = Config::load_from_iter(args(&[
        "--log-filter",
        "trellis=debug",
        "--log-format",
        "compact",
        "--view-root",
        "/srv/views",
    ]))
    .expect("load with flags");
    assert_eq!(config.log_filter(), "trellis=debug");
    assert_eq!(config.log_format(), LogFormat::Compact);
    assert_eq!(config.view_root().as_str(), "/srv/views");
}
