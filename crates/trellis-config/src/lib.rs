//! Shared configuration for the trellis dispatch workspace.
//!
//! [`Config`] is assembled by `ortho_config` from command-line flags,
//! `TRELLIS_*` environment variables, and configuration files, in that order
//! of precedence. The core dispatch crate reads the dispatch ordering and the
//! view root from it, and the telemetry layer reads the log settings.

mod defaults;
mod dispatch_order;
mod logging;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use self::defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_VIEW_ROOT, default_dispatch_order, default_log_filter,
    default_log_filter_string, default_log_format, default_view_root,
};
pub use self::dispatch_order::{DispatchOrder, DispatchOrderParseError, RuleGroup};
pub use self::logging::{LogFormat, LogFormatParseError};

/// Resolved configuration shared by every trellis component.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "TRELLIS")]
pub struct Config {
    /// Tracing filter expression, in `EnvFilter` syntax.
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Output format for structured logs.
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
    /// Directory that view scripts are resolved against.
    #[ortho_config(default = defaults::default_view_root())]
    pub view_root: Utf8PathBuf,
    /// Priority of actions, views, and child traversal during dispatch.
    #[ortho_config(default = defaults::default_dispatch_order())]
    pub dispatch_order: DispatchOrder,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            view_root: default_view_root(),
            dispatch_order: default_dispatch_order(),
        }
    }
}

impl Config {
    /// Tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Output format for structured logs.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Directory holding view scripts.
    #[must_use]
    pub fn view_root(&self) -> &Utf8Path {
        &self.view_root
    }

    /// Priority of the dispatch rule groups.
    #[must_use]
    pub const fn dispatch_order(&self) -> DispatchOrder {
        self.dispatch_order
    }
}
