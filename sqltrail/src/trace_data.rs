//! Trace records for scopes and operations
//!
//! [`ScopeRecord`] is the live, shared record registered in the cache while its
//! activity is still running. [`OperationRecord`] is a plain value that is
//! copied into its scope when the operation finishes. [`ScopeSnapshot`] is the
//! immutable read model handed to the inspector and serialized into the raw
//! document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::classification::{Thresholds, Tier};
use crate::domain::{ArgValue, CallerSite, ScopeLabels};

/// Elapsed time between two wall-clock stamps, clamped at zero when the clock
/// stepped backwards.
fn elapsed_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Duration {
    (end - start).to_std().unwrap_or(Duration::ZERO)
}

/// One traced sub-activity (e.g. a database call).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub statement: String,
    pub args: Vec<ArgValue>,
    pub caller_file: String,
    pub caller_func: String,
    pub caller_line: i64,
    pub start_time: DateTime<Utc>,
    /// `None` until the operation finishes
    pub end_time: Option<DateTime<Utc>>,
}

impl OperationRecord {
    /// Start a record stamped with the current time.
    #[must_use]
    pub fn start(statement: impl Into<String>, args: Vec<ArgValue>, caller: CallerSite) -> Self {
        Self {
            statement: statement.into(),
            args,
            caller_file: caller.file,
            caller_func: caller.function,
            caller_line: caller.line,
            start_time: Utc::now(),
            end_time: None,
        }
    }

    #[must_use]
    pub fn caller(&self) -> CallerSite {
        CallerSite {
            file: self.caller_file.clone(),
            function: self.caller_func.clone(),
            line: self.caller_line,
        }
    }

    #[must_use]
    pub fn has_finished(&self) -> bool {
        self.end_time.is_some()
    }

    /// Elapsed time, or `None` while the operation is still running.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        self.end_time.map(|end| elapsed_between(self.start_time, end))
    }

    /// Latency tier, [`Tier::Neutral`] while unfinished.
    #[must_use]
    pub fn tier(&self, thresholds: &Thresholds) -> Tier {
        self.elapsed().map_or(Tier::Neutral, |elapsed| thresholds.operation.classify(elapsed))
    }
}

/// Live record of one traced top-level activity.
///
/// Shared between the cache, the correlation handles bound to it and the
/// finisher returned to the caller.
#[derive(Debug)]
pub struct ScopeRecord {
    labels: ScopeLabels,
    start_time: DateTime<Utc>,
    end_time: Mutex<Option<DateTime<Utc>>>,
    /// Completed operations in completion order; append-only
    operations: Mutex<Vec<OperationRecord>>,
    /// Set once the cache no longer holds this scope
    retired: AtomicBool,
}

impl ScopeRecord {
    /// Create a record stamped with the current time.
    #[must_use]
    pub fn start(labels: ScopeLabels) -> Self {
        Self {
            labels,
            start_time: Utc::now(),
            end_time: Mutex::new(None),
            operations: Mutex::new(Vec::new()),
            retired: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn labels(&self) -> &ScopeLabels {
        &self.labels
    }

    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        *self.end_time.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stamp the end time. Calling again overwrites the previous stamp.
    pub fn finish(&self) {
        *self.end_time.lock().unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());
    }

    /// Append a completed operation.
    pub fn append(&self, operation: OperationRecord) {
        self.operations.lock().unwrap_or_else(PoisonError::into_inner).push(operation);
    }

    pub fn operation_count(&self) -> usize {
        self.operations.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub(crate) fn retire(&self) {
        self.retired.store(true, Ordering::Release);
    }

    /// True once the cache evicted or discarded this scope.
    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }

    /// Point-in-time copy for presentation.
    pub fn snapshot(&self) -> ScopeSnapshot {
        ScopeSnapshot {
            labels: self.labels.clone(),
            operations: self.operations.lock().unwrap_or_else(PoisonError::into_inner).clone(),
            start_time: self.start_time,
            end_time: self.end_time(),
        }
    }
}

/// Immutable copy of a scope as seen by readers.
///
/// Field names and nesting form the raw document contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeSnapshot {
    pub labels: ScopeLabels,
    pub operations: Vec<OperationRecord>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl ScopeSnapshot {
    #[must_use]
    pub fn has_finished(&self) -> bool {
        self.end_time.is_some()
    }

    /// Whole-scope elapsed time, `None` while running.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        self.end_time.map(|end| elapsed_between(self.start_time, end))
    }

    /// Sum of elapsed time across finished operations.
    #[must_use]
    pub fn operations_elapsed(&self) -> Duration {
        self.operations.iter().filter_map(OperationRecord::elapsed).sum()
    }

    #[must_use]
    pub fn scope_tier(&self, thresholds: &Thresholds) -> Tier {
        self.elapsed().map_or(Tier::Neutral, |elapsed| thresholds.scope.classify(elapsed))
    }

    #[must_use]
    pub fn operations_tier(&self, thresholds: &Thresholds) -> Tier {
        thresholds.operations_total.classify(self.operations_elapsed())
    }

    #[must_use]
    pub fn count_tier(&self, thresholds: &Thresholds) -> Tier {
        thresholds.operation_count.classify(self.operations.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn finished_op(start: DateTime<Utc>, millis: i64) -> OperationRecord {
        OperationRecord {
            statement: "SELECT 1".to_string(),
            args: Vec::new(),
            caller_file: String::new(),
            caller_func: String::new(),
            caller_line: -1,
            start_time: start,
            end_time: Some(start + TimeDelta::milliseconds(millis)),
        }
    }

    #[test]
    fn test_unfinished_scope_is_neutral() {
        let scope = ScopeRecord::start(ScopeLabels::new("/users", "GET"));
        let snapshot = scope.snapshot();

        assert!(!snapshot.has_finished());
        assert_eq!(snapshot.elapsed(), None);
        assert_eq!(snapshot.scope_tier(&Thresholds::default()), Tier::Neutral);
    }

    #[test]
    fn test_finish_overwrites_end_time() {
        let scope = ScopeRecord::start(ScopeLabels::new("/users", "GET"));
        scope.finish();
        let first = scope.end_time().unwrap();
        std::thread::sleep(Duration::from_millis(2));
        scope.finish();
        let second = scope.end_time().unwrap();

        assert!(second > first);
        assert!(second >= scope.start_time());
    }

    #[test]
    fn test_operations_keep_completion_order() {
        let scope = ScopeRecord::start(ScopeLabels::default());
        let now = Utc::now();
        let mut slow = finished_op(now, 50);
        slow.statement = "slow".to_string();
        let mut quick = finished_op(now, 5);
        quick.statement = "quick".to_string();

        scope.append(quick);
        scope.append(slow);

        let names: Vec<_> = scope.snapshot().operations.into_iter().map(|op| op.statement).collect();
        assert_eq!(names, ["quick", "slow"]);
    }

    #[test]
    fn test_operation_totals_skip_unfinished() {
        let now = Utc::now();
        let mut running = finished_op(now, 0);
        running.end_time = None;

        let snapshot = ScopeSnapshot {
            labels: ScopeLabels::default(),
            operations: vec![finished_op(now, 60), finished_op(now, 70), running],
            start_time: now,
            end_time: Some(now + TimeDelta::milliseconds(400)),
        };

        let thresholds = Thresholds::default();
        assert_eq!(snapshot.operations_elapsed(), Duration::from_millis(130));
        assert_eq!(snapshot.operations_tier(&thresholds), Tier::Medium);
        assert_eq!(snapshot.count_tier(&thresholds), Tier::Fast);
        assert_eq!(snapshot.scope_tier(&thresholds), Tier::Medium);
    }

    #[test]
    fn test_clock_step_back_clamps_to_zero() {
        let now = Utc::now();
        let op = finished_op(now, -5);
        assert_eq!(op.elapsed(), Some(Duration::ZERO));
    }
}
