//! Scope and operation lifecycle
//!
//! - `scope`: starts scopes, registers them in the cache, binds them to a
//!   correlation handle and finalizes them
//! - `operation`: starts operations, resolves their caller and attaches them to
//!   the owning scope when they finish
//!
//! Both trackers short-circuit to no-op finishers when tracking is disabled.

pub mod operation;
pub mod scope;

pub use operation::{OperationFinish, OperationTracker};
pub use scope::{ScopeFinish, ScopeTracker};
