//! Profiler facade owning the cache and both trackers
//!
//! A [`Profiler`] is built once per process (or per test) and cloned wherever
//! tracking happens; clones share the same cache and settings.

use std::sync::Arc;

use crate::cache::Cache;
use crate::caller::{BacktraceResolver, CallerResolver};
use crate::classification::Thresholds;
use crate::config::{ProfilerConfig, Settings};
use crate::correlation::Correlation;
use crate::domain::{ArgValue, ConfigError, ScopeLabels};
use crate::trace_data::ScopeSnapshot;
use crate::tracking::{OperationFinish, OperationTracker, ScopeFinish, ScopeTracker};

#[derive(Debug, Clone)]
pub struct Profiler {
    cache: Arc<Cache>,
    settings: Arc<Settings>,
    scopes: ScopeTracker,
    operations: OperationTracker,
}

impl Profiler {
    /// Build a profiler resolving callers from captured backtraces.
    #[must_use]
    pub fn new(config: &ProfilerConfig) -> Self {
        Self::with_resolver(config, Arc::new(BacktraceResolver))
    }

    #[must_use]
    pub fn with_resolver(config: &ProfilerConfig, resolver: Arc<dyn CallerResolver>) -> Self {
        let cache = Arc::new(Cache::new(config.capacity_limit()));
        let settings = Arc::new(Settings::from_config(config));

        Self {
            scopes: ScopeTracker::new(Arc::clone(&cache), Arc::clone(&settings)),
            operations: OperationTracker::new(Arc::clone(&settings), resolver),
            cache,
            settings,
        }
    }

    /// See [`ScopeTracker::begin`].
    pub fn begin_scope(
        &self,
        parent: Option<&Correlation>,
        labels: ScopeLabels,
    ) -> (Correlation, ScopeFinish) {
        self.scopes.begin(parent, labels)
    }

    /// See [`OperationTracker::begin`].
    #[track_caller]
    pub fn begin_operation(
        &self,
        correlation: &Correlation,
        statement: impl Into<String>,
        args: Vec<ArgValue>,
    ) -> OperationFinish {
        self.operations.begin(correlation, statement, args)
    }

    /// Retained scopes, newest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ScopeSnapshot> {
        self.cache.snapshot()
    }

    /// Replace the cache with an empty one of the given capacity.
    pub fn reconfigure(&self, capacity: Option<usize>) {
        self.cache.reset(capacity);
    }

    /// Apply a whole config: switches, thresholds, and a fresh cache.
    ///
    /// # Errors
    /// Inverted thresholds are rejected before anything changes.
    pub fn apply(&self, config: &ProfilerConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.settings.set_thresholds(config.thresholds)?;
        self.settings.set_enabled(config.enabled);
        self.settings.set_skip_frames(config.skip_frames);
        self.cache.reset(config.capacity_limit());
        Ok(())
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.settings.is_enabled()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.settings.set_enabled(enabled);
    }

    #[must_use]
    pub fn thresholds(&self) -> Thresholds {
        self.settings.thresholds()
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn cache(&self) -> &Cache {
        &self.cache
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new(&ProfilerConfig::default())
    }
}
