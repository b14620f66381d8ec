//! Domain model for sqltrail
//!
//! This module contains the value types carried by traces and the errors
//! surfaced outside the tracking hot path:
//! - Typed statement arguments and scope labels
//! - Caller site with an explicit unresolved sentinel
//! - Structured error handling

pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use types::{ArgValue, CallerSite, ScopeLabels};

pub use errors::{ConfigError, InspectorError};
