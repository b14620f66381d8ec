//! # sqltrail - In-process Request and Query Profiler
//!
//! sqltrail records the statements an application issues while serving a
//! request, groups them under that request, and keeps the most recent requests
//! in memory for inspection over HTTP.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      User Application                        │
//! │      begin_scope(path, method)   begin_operation(sql, args)  │
//! └───────────────┬──────────────────────────────┬───────────────┘
//!                 │ Correlation handle           │ finish()
//!                 ▼                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      sqltrail (this crate)                   │
//! │                                                              │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐      │
//! │  │   Tracking   │──▶│    Cache     │──▶│  Inspector   │      │
//! │  │ scope / op   │   │ (bounded,    │   │ HTML / JSON  │      │
//! │  └──────┬───────┘   │ newest first)│   └──────┬───────┘      │
//! │         │           └──────────────┘          │              │
//! │         ▼                                     ▼              │
//! │  ┌──────────────┐                     ┌──────────────┐       │
//! │  │    Caller    │                     │Classification│       │
//! │  │  resolution  │                     │  + rendering │       │
//! │  └──────────────┘                     └──────────────┘       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`profiler`]: the [`Profiler`] facade owning the cache and settings
//! - [`tracking`]: scope and operation lifecycles with their finishers
//! - [`correlation`]: the handle linking operations to their scope
//! - [`cache`]: bounded newest-first retention with eviction
//! - [`trace_data`]: scope and operation records and their snapshots
//! - [`caller`]: resolving which code started an operation
//! - [`classification`]: latency tiers, method badges, duration display
//! - [`statement`]: argument substitution for display
//! - [`inspector`]: axum routers serving the page and the raw document
//! - [`config`]: loadable configuration and live settings
//! - [`cli`]: arguments of the demo binary
//! - [`domain`]: value types and errors
//!
//! ## Typical Usage
//!
//! ```
//! use sqltrail::{sql_args, Correlation, Profiler, ScopeLabels};
//!
//! let profiler = Profiler::default();
//! let (handle, scope) =
//!     profiler.begin_scope(Some(&Correlation::root()), ScopeLabels::new("/users", "GET"));
//!
//! let op = profiler.begin_operation(&handle, "SELECT * FROM users WHERE id = $1", sql_args![7]);
//! op.finish();
//! scope.finish();
//!
//! let scopes = profiler.snapshot();
//! assert_eq!(scopes[0].operations.len(), 1);
//! ```
//!
//! ## Key Concepts
//!
//! - **Scope**: one top-level unit of work, usually an HTTP request
//! - **Operation**: one statement executed inside a scope
//! - **Eviction**: a full cache drops its oldest scope; later operations
//!   against that scope are discarded

pub mod cache;
pub mod caller;
pub mod classification;
pub mod cli;
pub mod config;
pub mod correlation;
pub mod domain;
pub mod inspector;
pub mod profiler;
pub mod statement;
pub mod trace_data;
pub mod tracking;

pub use classification::{Thresholds, Tier};
pub use config::ProfilerConfig;
pub use correlation::Correlation;
pub use domain::{ArgValue, CallerSite, ConfigError, InspectorError, ScopeLabels};
pub use profiler::Profiler;
pub use trace_data::{OperationRecord, ScopeSnapshot};
pub use tracking::{OperationFinish, ScopeFinish};
