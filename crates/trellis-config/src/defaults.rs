use camino::Utf8PathBuf;

use crate::dispatch_order::DispatchOrder;
use crate::logging::LogFormat;

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default directory holding view scripts, relative to the working directory.
pub const DEFAULT_VIEW_ROOT: &str = "views";

/// Default log filter expression.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default view script directory.
#[must_use]
pub fn default_view_root() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_VIEW_ROOT)
}

/// Default ordering of dispatch rule groups.
#[must_use]
pub const fn default_dispatch_order() -> DispatchOrder {
    DispatchOrder::ActionsViewsChildren
}
