//! Ordering contract between built-in member dispatch and facet views.
//!
//! Each class assembles its dispatcher chain from three rule groups. The
//! relative order of those groups decides whether a view script named `x`
//! shadows an action or child named `x`, so it is configured explicitly rather
//! than falling out of registration order.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A family of dispatch rules contributed to every class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleGroup {
    /// Named actions exposed by the node.
    Actions,
    /// View scripts contributed by the registered facets.
    Views,
    /// Child traversal into nested nodes.
    Children,
}

/// Priority of the dispatch rule groups, highest first.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum DispatchOrder {
    /// Actions, then views, then children.
    #[default]
    ActionsViewsChildren,
    /// Views, then actions, then children.
    ViewsActionsChildren,
    /// Actions, then children, then views.
    ActionsChildrenViews,
}

impl DispatchOrder {
    /// Returns the rule groups in the order dispatchers are consulted.
    #[must_use]
    pub const fn groups(self) -> [RuleGroup; 3] {
        match self {
            Self::ActionsViewsChildren => {
                [RuleGroup::Actions, RuleGroup::Views, RuleGroup::Children]
            }
            Self::ViewsActionsChildren => {
                [RuleGroup::Views, RuleGroup::Actions, RuleGroup::Children]
            }
            Self::ActionsChildrenViews => {
                [RuleGroup::Actions, RuleGroup::Children, RuleGroup::Views]
            }
        }
    }
}

/// Errors encountered while parsing a [`DispatchOrder`] from text.
pub type DispatchOrderParseError = strum::ParseError;
