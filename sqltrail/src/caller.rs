//! Caller site resolution for operations
//!
//! Every operation records which piece of code started it. How that is found
//! is pluggable through [`CallerResolver`]:
//!
//! - [`BacktraceResolver`] (default) captures the current stack with
//!   [`std::backtrace::Backtrace`], drops the frames belonging to the backtrace
//!   machinery and to the profiler itself, then walks up `skip` frames.
//!   `skip = 1` is the code that called the tracking function; wrappers around
//!   the tracking call raise it by one per wrapper layer.
//! - [`LocationResolver`] uses the `#[track_caller]` location only. It is cheap
//!   but cannot name the enclosing function.
//!
//! Resolution never fails loudly: anything that cannot be determined degrades
//! to [`CallerSite::unresolved`] fields.
//!
//! ## Frame format
//!
//! The resolver reads the standard library's textual backtrace:
//!
//! ```text
//!    4: sqltrail::tracking::operation::OperationTracker::begin
//!              at ./src/tracking/operation.rs:61:22
//!    5: myapp::repo::find_users
//!              at ./src/repo.rs:42:9
//! ```

use rustc_demangle::demangle;
use std::backtrace::Backtrace;
use std::fmt;
use std::panic::Location;

use crate::domain::CallerSite;

/// Strategy for turning the current call stack into a [`CallerSite`].
pub trait CallerResolver: Send + Sync + fmt::Debug {
    /// `location` is the `#[track_caller]` site of the tracking call; `skip`
    /// is the configured number of frames above it.
    fn resolve(&self, location: &'static Location<'static>, skip: usize) -> CallerSite;
}

/// Resolver reporting only the `#[track_caller]` location.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocationResolver;

impl CallerResolver for LocationResolver {
    fn resolve(&self, location: &'static Location<'static>, _skip: usize) -> CallerSite {
        CallerSite {
            file: location.file().to_string(),
            function: String::new(),
            line: i64::from(location.line()),
        }
    }
}

/// Resolver walking a captured backtrace.
#[derive(Debug, Default, Clone, Copy)]
pub struct BacktraceResolver;

impl CallerResolver for BacktraceResolver {
    fn resolve(&self, _location: &'static Location<'static>, skip: usize) -> CallerSite {
        let rendered = Backtrace::force_capture().to_string();
        select_caller(&parse_frames(&rendered), skip).unwrap_or_else(CallerSite::unresolved)
    }
}

// =============================================================================
// FRAME PARSING
// =============================================================================

/// One frame from a textual backtrace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub function: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

/// Frames produced by the capture machinery or by the profiler itself.
const INTERNAL_PREFIXES: &[&str] = &[
    "std::backtrace::",
    "std::backtrace_rs::",
    "backtrace::",
    "sqltrail::caller::",
    "sqltrail::tracking::",
    "sqltrail::profiler::",
];

fn is_internal(frame: &Frame) -> bool {
    // Trait impls render as `<Type as Trait>::method`
    let name = frame.function.trim_start_matches('<');
    INTERNAL_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

/// Parse the standard library's backtrace text into frames.
#[must_use]
pub fn parse_frames(rendered: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();

    for line in rendered.lines() {
        let line = line.trim();

        if let Some(location) = line.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut() {
                if frame.file.is_none() {
                    let (file, line) = split_location(location);
                    frame.file = Some(file);
                    frame.line = line;
                }
            }
            continue;
        }

        let Some((index, symbol)) = line.split_once(": ") else {
            continue;
        };
        if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        frames.push(Frame { function: clean_symbol(symbol), file: None, line: None });
    }

    frames
}

/// Pick the frame `skip` levels above the profiler's own frames.
///
/// `skip` of 0 and 1 both mean the direct caller.
#[must_use]
pub fn select_caller(frames: &[Frame], skip: usize) -> Option<CallerSite> {
    let frame = frames.iter().skip_while(|f| is_internal(f)).nth(skip.saturating_sub(1))?;

    Some(CallerSite {
        file: frame.file.clone().unwrap_or_default(),
        function: frame.function.clone(),
        line: frame.line.map_or(-1, i64::from),
    })
}

/// Split `path:line:column` (column optional). Paths may contain colons.
fn split_location(location: &str) -> (String, Option<u32>) {
    let mut parts = location.rsplitn(3, ':');
    let last = parts.next();
    let middle = parts.next();
    let rest = parts.next();

    match (rest, middle, last) {
        (Some(file), Some(line), Some(_column)) if line.parse::<u32>().is_ok() => {
            (file.to_string(), line.parse().ok())
        }
        (_, Some(_), Some(line)) if line.parse::<u32>().is_ok() => {
            let file = location.rsplit_once(':').map_or(location, |(file, _)| file);
            (file.to_string(), line.parse().ok())
        }
        _ => (location.to_string(), None),
    }
}

/// Demangle raw symbols and drop the trailing `::h<hash>` when present.
fn clean_symbol(symbol: &str) -> String {
    let symbol = symbol.trim();
    let name = if symbol.starts_with("_ZN") || symbol.starts_with("_R") {
        format!("{:#}", demangle(symbol))
    } else {
        symbol.to_string()
    };

    match name.rsplit_once("::h") {
        Some((path, hash)) if hash.len() == 16 && hash.chars().all(|c| c.is_ascii_hexdigit()) => {
            path.to_string()
        }
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
   0: std::backtrace_rs::backtrace::libunwind::trace
             at /rustc/abc/library/std/src/../../backtrace/src/backtrace/libunwind.rs:116:5
   1: std::backtrace::Backtrace::create
             at /rustc/abc/library/std/src/backtrace.rs:331:13
   2: <sqltrail::caller::BacktraceResolver as sqltrail::caller::CallerResolver>::resolve
             at ./src/caller.rs:64:24
   3: sqltrail::tracking::operation::OperationTracker::begin
             at ./src/tracking/operation.rs:61:22
   4: myapp::repo::query_with_scope
             at ./src/repo.rs:42:9
   5: myapp::handlers::list_users
             at ./src/handlers.rs:17:5
   6: core::ops::function::FnOnce::call_once
";

    #[test]
    fn test_parse_frames_reads_locations() {
        let frames = parse_frames(SAMPLE);
        assert_eq!(frames.len(), 7);
        assert_eq!(frames[4].function, "myapp::repo::query_with_scope");
        assert_eq!(frames[4].file.as_deref(), Some("./src/repo.rs"));
        assert_eq!(frames[4].line, Some(42));
        assert_eq!(frames[6].file, None);
    }

    #[test]
    fn test_skip_one_is_direct_caller() {
        let site = select_caller(&parse_frames(SAMPLE), 1).unwrap();
        assert_eq!(site.function, "myapp::repo::query_with_scope");
        assert_eq!(site.file, "./src/repo.rs");
        assert_eq!(site.line, 42);
    }

    #[test]
    fn test_skip_two_passes_wrapper() {
        let site = select_caller(&parse_frames(SAMPLE), 2).unwrap();
        assert_eq!(site.function, "myapp::handlers::list_users");
        assert_eq!(site.line, 17);
    }

    #[test]
    fn test_frame_without_location_has_sentinel_line() {
        let site = select_caller(&parse_frames(SAMPLE), 3).unwrap();
        assert_eq!(site.function, "core::ops::function::FnOnce::call_once");
        assert_eq!(site.file, "");
        assert_eq!(site.line, -1);
    }

    #[test]
    fn test_skip_past_stack_is_unresolved() {
        assert!(select_caller(&parse_frames(SAMPLE), 50).is_none());
        assert!(select_caller(&[], 1).is_none());
    }

    #[test]
    fn test_clean_symbol_strips_hash() {
        assert_eq!(clean_symbol("myapp::main::h0123456789abcdef"), "myapp::main");
        assert_eq!(clean_symbol("myapp::hello"), "myapp::hello");
    }

    #[test]
    fn test_split_location_with_colon_in_path() {
        assert_eq!(split_location(r"C:\src\main.rs:10:4"), (r"C:\src\main.rs".to_string(), Some(10)));
        assert_eq!(split_location("src/main.rs:7"), ("src/main.rs".to_string(), Some(7)));
        assert_eq!(split_location("<unknown>"), ("<unknown>".to_string(), None));
    }

    #[test]
    fn test_location_resolver_reports_track_caller_site() {
        let site = LocationResolver.resolve(Location::caller(), 1);
        assert!(site.file.ends_with("caller.rs"));
        assert!(site.line > 0);
        assert!(site.function.is_empty());
    }
}
