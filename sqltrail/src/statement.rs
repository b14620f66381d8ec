//! Display rendering of bound statements.
//!
//! Substitutes argument values into the statement text so the inspector can
//! show what actually ran. The output is for reading only: values are not
//! quoted or escaped and must never be executed.
//!
//! Two placeholder dialects are recognised:
//! - **Ordered** (`$1`, `$2`, ...): every `$N` becomes `args[N-1]`
//! - **Unordered** (`?`): each `?` consumes the next argument in order
//!
//! Ordered placeholders win when both appear. A statement using neither is
//! returned as-is (minus leading whitespace).

use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::domain::ArgValue;

static ORDERED_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([1-9][0-9]*)").expect("valid placeholder pattern"));

/// Placeholder dialect detected in a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `$1`, `$2`, ...
    Ordered,
    /// `?`
    Unordered,
    /// No placeholders
    Plain,
}

#[must_use]
pub fn detect_dialect(statement: &str) -> Dialect {
    if ORDERED_PLACEHOLDER.is_match(statement) {
        Dialect::Ordered
    } else if statement.contains('?') {
        Dialect::Unordered
    } else {
        Dialect::Plain
    }
}

/// Substitute `args` into `statement` for display.
#[must_use]
pub fn render(statement: &str, args: &[ArgValue]) -> String {
    let statement = statement.trim_start();

    match detect_dialect(statement) {
        Dialect::Ordered => render_ordered(statement, args),
        Dialect::Unordered => render_unordered(statement, args),
        Dialect::Plain => statement.to_string(),
    }
}

fn render_ordered(statement: &str, args: &[ArgValue]) -> String {
    ORDERED_PLACEHOLDER
        .replace_all(statement, |caps: &Captures<'_>| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|position| args.get(position - 1))
                .map_or_else(|| caps[0].to_string(), ToString::to_string)
        })
        .into_owned()
}

fn render_unordered(statement: &str, args: &[ArgValue]) -> String {
    let mut args = args.iter();
    let mut out = String::with_capacity(statement.len());
    for c in statement.chars() {
        if c == '?' {
            if let Some(arg) = args.next() {
                out.push_str(&arg.to_string());
                continue;
            }
        }
        out.push(c);
    }
    out
}
