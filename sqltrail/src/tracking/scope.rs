use log::debug;
use std::sync::Arc;

use crate::cache::Cache;
use crate::config::Settings;
use crate::correlation::Correlation;
use crate::domain::ScopeLabels;
use crate::trace_data::ScopeRecord;

/// Starts scopes and registers them in the shared cache.
#[derive(Debug, Clone)]
pub struct ScopeTracker {
    cache: Arc<Cache>,
    settings: Arc<Settings>,
}

impl ScopeTracker {
    #[must_use]
    pub fn new(cache: Arc<Cache>, settings: Arc<Settings>) -> Self {
        Self { cache, settings }
    }

    /// Begin a scope under `parent`.
    ///
    /// The scope is visible in the cache immediately, while still running.
    /// Returns the handle to pass to nested operations and the finisher to
    /// call when the activity ends.
    ///
    /// With tracking disabled, or without a parent, nothing is recorded: the
    /// parent comes back unchanged (or an unbound root) with a no-op finisher.
    pub fn begin(
        &self,
        parent: Option<&Correlation>,
        labels: ScopeLabels,
    ) -> (Correlation, ScopeFinish) {
        let Some(parent) = parent else {
            return (Correlation::root(), ScopeFinish::noop());
        };
        if !self.settings.is_enabled() {
            return (parent.clone(), ScopeFinish::noop());
        }

        let scope = Arc::new(ScopeRecord::start(labels));
        debug!("Scope started: {}", scope.labels());
        self.cache.register(Arc::clone(&scope));

        (Correlation::bound_to(&scope), ScopeFinish { scope: Some(scope) })
    }
}

/// Finisher for a scope.
///
/// Each call to [`finish`](Self::finish) stamps the end time again, so a
/// second call moves it later.
#[derive(Debug)]
#[must_use = "call finish() when the traced activity ends"]
pub struct ScopeFinish {
    scope: Option<Arc<ScopeRecord>>,
}

impl ScopeFinish {
    fn noop() -> Self {
        Self { scope: None }
    }

    pub fn finish(&self) {
        if let Some(scope) = &self.scope {
            scope.finish();
        }
    }

    /// True when this finisher records nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.scope.is_none()
    }
}
