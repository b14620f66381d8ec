//! Value types shared by records, trackers and the inspector
//!
//! These wrap the loosely-typed pieces of a trace (bound arguments, scope
//! labels, caller sites) in small types that serialize to the stable raw
//! document shape.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One bound statement argument.
///
/// Serialized untagged, so `ArgValue::Int(5)` becomes `5` and
/// `ArgValue::Text("x")` becomes `"x"` in the raw document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl fmt::Display for ArgValue {
    /// Best-effort human-readable form, used only for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Null => f.write_str("<nil>"),
            ArgValue::Bool(b) => write!(f, "{b}"),
            ArgValue::Int(i) => write!(f, "{i}"),
            ArgValue::UInt(u) => write!(f, "{u}"),
            ArgValue::Float(x) => write!(f, "{x}"),
            ArgValue::Text(s) => f.write_str(s),
            ArgValue::Bytes(bytes) => {
                f.write_str("[")?;
                for (idx, byte) in bytes.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{byte}")?;
                }
                f.write_str("]")
            }
        }
    }
}

macro_rules! arg_value_from {
    ($variant:ident <- $($ty:ty),+) => {
        $(
            impl From<$ty> for ArgValue {
                fn from(value: $ty) -> Self {
                    ArgValue::$variant(value.into())
                }
            }
        )+
    };
}

arg_value_from!(Int <- i8, i16, i32, i64);
arg_value_from!(UInt <- u8, u16, u32, u64);
arg_value_from!(Float <- f32, f64);
arg_value_from!(Bool <- bool);
arg_value_from!(Text <- String, &str);
arg_value_from!(Bytes <- Vec<u8>, &[u8]);

impl From<usize> for ArgValue {
    fn from(value: usize) -> Self {
        ArgValue::UInt(value as u64)
    }
}

impl From<isize> for ArgValue {
    fn from(value: isize) -> Self {
        ArgValue::Int(value as i64)
    }
}

impl<T: Into<ArgValue>> From<Option<T>> for ArgValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ArgValue::Null, Into::into)
    }
}

/// Build a `Vec<ArgValue>` from heterogeneous values.
///
/// ```
/// use sqltrail::{sql_args, ArgValue};
///
/// let args = sql_args![5, "x", None::<i32>];
/// assert_eq!(args, vec![ArgValue::Int(5), ArgValue::Text("x".into()), ArgValue::Null]);
/// ```
#[macro_export]
macro_rules! sql_args {
    () => { ::std::vec::Vec::<$crate::ArgValue>::new() };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::ArgValue::from($arg)),+]
    };
}

/// Labels identifying the activity a scope traces.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScopeLabels {
    pub path: String,
    pub method: String,
}

impl ScopeLabels {
    pub fn new(path: impl Into<String>, method: impl Into<String>) -> Self {
        Self { path: path.into(), method: method.into() }
    }
}

impl fmt::Display for ScopeLabels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Source location of the code that started an operation.
///
/// An unresolved site is `("", "", -1)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerSite {
    pub file: String,
    pub function: String,
    pub line: i64,
}

impl CallerSite {
    #[must_use]
    pub fn unresolved() -> Self {
        Self { file: String::new(), function: String::new(), line: -1 }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.line >= 0
    }
}

impl Default for CallerSite {
    fn default() -> Self {
        Self::unresolved()
    }
}

impl fmt::Display for CallerSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_resolved() {
            return f.write_str("<unknown>");
        }
        write!(f, "{}:{}", self.file, self.line)?;
        if !self.function.is_empty() {
            write!(f, " ({})", self.function)?;
        }
        Ok(())
    }
}
