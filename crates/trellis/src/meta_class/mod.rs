//! Per-class dispatch metadata.
//!
//! A [`MetaClass`] is built once per class the first time an instance of the
//! class takes part in dispatch. It holds the ordered dispatcher chain and
//! the class's tear-off cache. It keeps only a weak reference to its class.

use std::fmt;
use std::sync::Arc;

use tracing::trace;
use trellis_config::{DispatchOrder, RuleGroup};

use crate::class::{Class, WeakClass};
use crate::class_info::CACHE_TARGET;
use crate::dispatch::{ActionDispatcher, ChildDispatcher, Dispatcher};
use crate::error::DispatchError;
use crate::facet::Facet;
use crate::tear_off::{TearOff, TearOffSupport, TearOffType};

/// Dispatch metadata for one class.
pub struct MetaClass {
    class: WeakClass,
    name: String,
    dispatchers: Vec<Arc<dyn Dispatcher>>,
    tear_offs: TearOffSupport,
}

impl MetaClass {
    /// Creates metadata for `class` with an empty dispatcher chain.
    #[must_use]
    pub fn new(class: &Class) -> Self {
        Self {
            class: class.downgrade(),
            name: class.name().to_owned(),
            dispatchers: Vec::new(),
            tear_offs: TearOffSupport::new(),
        }
    }

    /// Builds the dispatcher chain for `class`.
    ///
    /// The built-in action and child rules and the rules contributed by
    /// `facets` are placed according to `order`. Facet rules keep the facet
    /// registration order.
    pub(crate) fn build(
        class: &Class,
        facets: &[Arc<dyn Facet>],
        order: DispatchOrder,
    ) -> Result<Self, DispatchError> {
        let mut meta = Self::new(class);
        let mut views: Vec<Arc<dyn Dispatcher>> = Vec::new();
        for facet in facets {
            facet.build_view_dispatchers(&meta, &mut views)?;
        }

        let mut dispatchers: Vec<Arc<dyn Dispatcher>> = Vec::with_capacity(views.len() + 2);
        for group in order.groups() {
            match group {
                RuleGroup::Actions => dispatchers.push(Arc::new(ActionDispatcher)),
                RuleGroup::Views => dispatchers.append(&mut views),
                RuleGroup::Children => dispatchers.push(Arc::new(ChildDispatcher)),
            }
        }
        trace!(
            target: CACHE_TARGET,
            class = %class,
            %order,
            rules = dispatchers.len(),
            "built dispatcher chain"
        );
        meta.dispatchers = dispatchers;
        Ok(meta)
    }

    /// The class, unless it has been dropped.
    #[must_use]
    pub fn class(&self) -> Option<Class> {
        self.class.upgrade()
    }

    /// Name of the class.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dispatchers in the order they are offered a token.
    #[must_use]
    pub fn dispatchers(&self) -> &[Arc<dyn Dispatcher>] {
        &self.dispatchers
    }

    /// Returns the tear-off of `kind` for this class, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Internal`] if the class has been dropped or
    /// the tear-off cache lock is poisoned.
    pub fn load_tear_off(&self, kind: &dyn TearOffType) -> Result<Arc<dyn TearOff>, DispatchError> {
        let class = self.class().ok_or_else(|| {
            DispatchError::internal(format!("class '{}' has been dropped", self.name))
        })?;
        self.tear_offs.load_tear_off(&class, kind)
    }
}

impl fmt::Debug for MetaClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rules: Vec<String> = self.dispatchers.iter().map(ToString::to_string).collect();
        f.debug_struct("MetaClass")
            .field("name", &self.name)
            .field("dispatchers", &rules)
            .field("tear_offs", &self.tear_offs)
            .finish()
    }
}
