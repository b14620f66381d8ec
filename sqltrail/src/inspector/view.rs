//! Template-ready views of retained scopes.
//!
//! Everything the page needs is computed here so the template stays free of
//! logic: tier classes, formatted durations, rendered statements.

use serde::Serialize;

use crate::classification::{format_duration, method_tier, Thresholds};
use crate::statement;
use crate::trace_data::{OperationRecord, ScopeSnapshot};

/// Label shown instead of a duration while a scope or operation is running.
pub const RUNNING: &str = "running";

#[derive(Debug, Clone, Serialize)]
pub struct OperationView {
    pub statement: String,
    pub duration: String,
    pub tier_class: &'static str,
    pub caller: String,
    pub finished: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScopeView {
    pub method: String,
    pub path: String,
    pub method_class: &'static str,
    pub started_at: String,
    pub duration: String,
    pub scope_class: &'static str,
    pub operations_duration: String,
    pub operations_class: &'static str,
    pub operation_count: usize,
    pub count_class: &'static str,
    pub finished: bool,
    pub operations: Vec<OperationView>,
}

impl OperationView {
    #[must_use]
    pub fn build(operation: &OperationRecord, thresholds: &Thresholds) -> Self {
        let caller = operation.caller();
        let caller = if caller.is_resolved() { caller.to_string() } else { String::new() };

        Self {
            statement: statement::render(&operation.statement, &operation.args),
            duration: operation.elapsed().map_or_else(|| RUNNING.to_string(), format_duration),
            tier_class: operation.tier(thresholds).css_class(),
            caller,
            finished: operation.has_finished(),
        }
    }
}

impl ScopeView {
    #[must_use]
    pub fn build(scope: &ScopeSnapshot, thresholds: &Thresholds) -> Self {
        Self {
            method: scope.labels.method.clone(),
            path: scope.labels.path.clone(),
            method_class: method_tier(&scope.labels.method).css_class(),
            started_at: scope.start_time.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            duration: scope.elapsed().map_or_else(|| RUNNING.to_string(), format_duration),
            scope_class: scope.scope_tier(thresholds).css_class(),
            operations_duration: format_duration(scope.operations_elapsed()),
            operations_class: scope.operations_tier(thresholds).css_class(),
            operation_count: scope.operations.len(),
            count_class: scope.count_tier(thresholds).css_class(),
            finished: scope.has_finished(),
            operations: scope
                .operations
                .iter()
                .map(|operation| OperationView::build(operation, thresholds))
                .collect(),
        }
    }
}

/// Views for every snapshot, order preserved.
#[must_use]
pub fn build_views(scopes: &[ScopeSnapshot], thresholds: &Thresholds) -> Vec<ScopeView> {
    scopes.iter().map(|scope| ScopeView::build(scope, thresholds)).collect()
}
