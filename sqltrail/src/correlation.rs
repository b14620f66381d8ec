//! Explicit correlation handle threaded from a scope to its nested operations.
//!
//! A [`Correlation`] is a small cloneable value the caller passes down the call
//! graph. Beginning a scope binds the new scope to the returned handle under
//! its single reserved slot; operations started from that handle (or from any
//! [`Correlation::child`] of it) resolve their owning scope through it.
//!
//! The handle holds a weak reference, so it never keeps a scope alive on its
//! own, and resolution fails once the cache has retired the scope.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::trace_data::ScopeRecord;

#[derive(Clone, Default)]
pub struct Correlation {
    scope: Option<Weak<ScopeRecord>>,
}

impl Correlation {
    /// Ambient parent with nothing bound, the usual starting point for a
    /// request handler.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Descendant handle inheriting this handle's binding.
    #[must_use]
    pub fn child(&self) -> Self {
        self.clone()
    }

    /// Handle bound to `scope`. Replaces whatever binding the parent carried.
    pub(crate) fn bound_to(scope: &Arc<ScopeRecord>) -> Self {
        Self { scope: Some(Arc::downgrade(scope)) }
    }

    /// True if a scope was ever bound, whether or not it is still live.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.scope.is_some()
    }

    /// Owning scope, if it is still held by the cache.
    #[must_use]
    pub fn resolve(&self) -> Option<Arc<ScopeRecord>> {
        self.scope
            .as_ref()
            .and_then(Weak::upgrade)
            .filter(|scope| !scope.is_retired())
    }
}

impl fmt::Debug for Correlation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.resolve() {
            Some(scope) => write!(f, "Correlation({})", scope.labels()),
            None if self.is_bound() => f.write_str("Correlation(<retired>)"),
            None => f.write_str("Correlation(<unbound>)"),
        }
    }
}
