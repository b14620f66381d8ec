use chrono::Utc;
use log::debug;
use std::panic::Location;
use std::sync::Arc;

use crate::caller::CallerResolver;
use crate::config::Settings;
use crate::correlation::Correlation;
use crate::domain::ArgValue;
use crate::trace_data::OperationRecord;

/// Starts operations and attaches them to their scope on completion.
#[derive(Debug, Clone)]
pub struct OperationTracker {
    settings: Arc<Settings>,
    resolver: Arc<dyn CallerResolver>,
}

impl OperationTracker {
    #[must_use]
    pub fn new(settings: Arc<Settings>, resolver: Arc<dyn CallerResolver>) -> Self {
        Self { settings, resolver }
    }

    /// Begin an operation owned by whatever scope `correlation` resolves to
    /// when it finishes.
    ///
    /// The caller site is captured here, at the configured skip depth.
    #[track_caller]
    pub fn begin(
        &self,
        correlation: &Correlation,
        statement: impl Into<String>,
        args: Vec<ArgValue>,
    ) -> OperationFinish {
        if !self.settings.is_enabled() {
            return OperationFinish { pending: None };
        }

        let caller = self.resolver.resolve(Location::caller(), self.settings.skip_frames());
        let record = OperationRecord::start(statement, args, caller);

        OperationFinish { pending: Some(Pending { correlation: correlation.child(), record }) }
    }
}

#[derive(Debug)]
struct Pending {
    correlation: Correlation,
    record: OperationRecord,
}

/// Finisher for an operation.
///
/// [`finish`](Self::finish) stamps the end time and appends a copy of the
/// record to the owning scope. If the scope was evicted, discarded or never
/// bound, the operation is dropped silently. Calling it twice appends twice.
#[derive(Debug)]
#[must_use = "call finish() when the traced operation completes"]
pub struct OperationFinish {
    pending: Option<Pending>,
}

impl OperationFinish {
    pub fn finish(&self) {
        let Some(pending) = &self.pending else {
            return;
        };

        let mut record = pending.record.clone();
        record.end_time = Some(Utc::now());

        match pending.correlation.resolve() {
            Some(scope) => scope.append(record),
            None => debug!("Dropping operation with no live scope: {}", record.statement),
        }
    }

    /// True when this finisher records nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.pending.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Cache;
    use crate::caller::LocationResolver;
    use crate::config::ProfilerConfig;
    use crate::domain::ScopeLabels;
    use crate::sql_args;
    use crate::tracking::ScopeTracker;

    struct Fixture {
        cache: Arc<Cache>,
        scopes: ScopeTracker,
        operations: OperationTracker,
        settings: Arc<Settings>,
    }

    fn fixture(capacity: usize) -> Fixture {
        let cache = Arc::new(Cache::new(Some(capacity)));
        let settings = Arc::new(Settings::from_config(&ProfilerConfig::default()));
        Fixture {
            scopes: ScopeTracker::new(Arc::clone(&cache), Arc::clone(&settings)),
            operations: OperationTracker::new(Arc::clone(&settings), Arc::new(LocationResolver)),
            cache,
            settings,
        }
    }

    #[test]
    fn test_finished_operation_lands_in_scope() {
        let fx = fixture(4);
        let (handle, scope_finish) = fx.scopes.begin(Some(&Correlation::root()), ScopeLabels::new("/u", "GET"));

        let op = fx.operations.begin(&handle, "SELECT $1", sql_args![7]);
        op.finish();
        scope_finish.finish();

        let snapshots = fx.cache.snapshot();
        let snapshot = &snapshots[0];
        assert_eq!(snapshot.operations.len(), 1);
        let recorded = &snapshot.operations[0];
        assert_eq!(recorded.statement, "SELECT $1");
        assert_eq!(recorded.args, sql_args![7]);
        assert!(recorded.has_finished());
        assert!(recorded.caller_file.ends_with("operation.rs"));
    }

    #[test]
    fn test_order_is_completion_order() {
        let fx = fixture(4);
        let (handle, _finish) = fx.scopes.begin(Some(&Correlation::root()), ScopeLabels::default());

        let first = fx.operations.begin(&handle, "first", Vec::new());
        let second = fx.operations.begin(&handle.child(), "second", Vec::new());
        second.finish();
        first.finish();

        let statements: Vec<_> =
            fx.cache.snapshot()[0].operations.iter().map(|op| op.statement.clone()).collect();
        assert_eq!(statements, ["second", "first"]);
    }

    #[test]
    fn test_operation_dropped_after_eviction() {
        let fx = fixture(1);
        let (handle, _finish) = fx.scopes.begin(Some(&Correlation::root()), ScopeLabels::new("/a", "GET"));
        let op = fx.operations.begin(&handle, "late", Vec::new());

        // Evicts /a
        let (_other, _other_finish) = fx.scopes.begin(Some(&Correlation::root()), ScopeLabels::new("/b", "GET"));
        op.finish();

        let snapshot = fx.cache.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].labels.path, "/b");
        assert!(snapshot[0].operations.is_empty());
    }

    #[test]
    fn test_unbound_handle_drops_operation() {
        let fx = fixture(4);
        let op = fx.operations.begin(&Correlation::root(), "orphan", Vec::new());
        assert!(!op.is_noop());
        op.finish();
        assert!(fx.cache.is_empty());
    }

    #[test]
    fn test_disabled_operation_is_noop() {
        let fx = fixture(4);
        let (handle, _finish) = fx.scopes.begin(Some(&Correlation::root()), ScopeLabels::default());
        fx.settings.set_enabled(false);

        let op = fx.operations.begin(&handle, "ignored", Vec::new());
        assert!(op.is_noop());
        op.finish();
        assert!(fx.cache.snapshot()[0].operations.is_empty());
    }

    #[test]
    fn test_double_finish_appends_twice() {
        let fx = fixture(4);
        let (handle, _finish) = fx.scopes.begin(Some(&Correlation::root()), ScopeLabels::default());
        let op = fx.operations.begin(&handle, "twice", Vec::new());
        op.finish();
        op.finish();
        assert_eq!(fx.cache.snapshot()[0].operations.len(), 2);
    }

    #[test]
    fn test_concurrent_finishers_lose_nothing() {
        let fx = fixture(4);
        let (handle, _finish) = fx.scopes.begin(Some(&Correlation::root()), ScopeLabels::default());

        std::thread::scope(|s| {
            for _ in 0..8 {
                let handle = handle.child();
                let operations = fx.operations.clone();
                s.spawn(move || {
                    for _ in 0..50 {
                        operations.begin(&handle, "SELECT 1", Vec::new()).finish();
                    }
                });
            }
        });

        assert_eq!(fx.cache.snapshot()[0].operations.len(), 400);
    }
}
