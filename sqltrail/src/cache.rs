//! Bounded retention cache of recent scopes.
//!
//! The cache keeps the newest scopes first in a [`BoundedDeque`]. Registration
//! follows a two-step overflow policy:
//!
//! ```text
//! push_front(scope)
//!     │ full?
//!     ├─ no  → done
//!     └─ yes → pop_back() (evict oldest, mark it retired)
//!              push_front(scope) again
//! ```
//!
//! The two steps are separate lock acquisitions. Two registrants that both
//! see a full deque may both evict, so the cache can briefly hold fewer than
//! `capacity` scopes. It never holds more.
//!
//! Changing the capacity replaces the whole deque. The swap happens under the
//! write side of `current`, which registrations hold for reading, so no
//! registration can land in a deque that is being discarded.

use log::debug;
use sqltrail_deque::BoundedDeque;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use crate::trace_data::{ScopeRecord, ScopeSnapshot};

type ScopeDeque = BoundedDeque<Arc<ScopeRecord>>;

/// Default number of scopes retained.
pub const DEFAULT_CAPACITY: usize = 50;

/// Newest-first store of scopes.
#[derive(Debug)]
pub struct Cache {
    current: RwLock<Arc<ScopeDeque>>,
}

impl Cache {
    /// Create a cache retaining at most `capacity` scopes (`None` = unbounded).
    #[must_use]
    pub fn new(capacity: Option<usize>) -> Self {
        Self { current: RwLock::new(Arc::new(BoundedDeque::with_limit(capacity))) }
    }

    /// Register a freshly started scope at the front, evicting the oldest one
    /// when full.
    ///
    /// Returns false if the scope could not be placed (zero capacity, or a
    /// concurrent registrant took the freed slot). Such a scope is retired
    /// immediately so operations against it are dropped.
    pub fn register(&self, scope: Arc<ScopeRecord>) -> bool {
        let deque = self.slot();

        let Err(scope) = deque.push_front(scope) else {
            return true;
        };

        if let Some(evicted) = deque.pop_back() {
            evicted.retire();
            debug!("Evicted scope {} to make room", evicted.labels());
        }

        match deque.push_front(scope) {
            Ok(()) => true,
            Err(scope) => {
                debug!("Scope {} not retained: cache is full", scope.labels());
                scope.retire();
                false
            }
        }
    }

    /// Replace the backing store with an empty one of the new capacity.
    ///
    /// All previously retained scopes are retired and disappear from reads.
    pub fn reset(&self, capacity: Option<usize>) {
        let previous = {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *current, Arc::new(BoundedDeque::with_limit(capacity)))
        };

        let view = previous.read();
        for scope in &view {
            scope.retire();
        }
        debug!("Cache reset to capacity {capacity:?}, discarded {} scopes", view.len());
    }

    /// Point-in-time copy of every retained scope, newest first.
    pub fn snapshot(&self) -> Vec<ScopeSnapshot> {
        let deque = self.slot();
        let view = deque.read();
        view.iter().map(|scope| scope.snapshot()).collect()
    }

    /// Live records, newest first.
    pub fn scopes(&self) -> Vec<Arc<ScopeRecord>> {
        self.slot().snapshot()
    }

    pub fn len(&self) -> usize {
        self.slot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slot().is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.slot().capacity()
    }

    fn slot(&self) -> RwLockReadGuard<'_, Arc<ScopeDeque>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::new(Some(DEFAULT_CAPACITY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScopeLabels;

    fn scope(path: &str) -> Arc<ScopeRecord> {
        Arc::new(ScopeRecord::start(ScopeLabels::new(path, "GET")))
    }

    fn paths(cache: &Cache) -> Vec<String> {
        cache.snapshot().into_iter().map(|s| s.labels.path).collect()
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let cache = Cache::new(Some(2));
        let a = scope("A");
        cache.register(Arc::clone(&a));
        cache.register(scope("B"));
        cache.register(scope("C"));

        assert_eq!(paths(&cache), ["C", "B"]);
        assert!(a.is_retired());
    }

    #[test]
    fn test_unbounded_cache_keeps_everything() {
        let cache = Cache::new(None);
        for i in 0..500 {
            assert!(cache.register(scope(&i.to_string())));
        }
        assert_eq!(cache.len(), 500);
        assert_eq!(cache.capacity(), None);
    }

    #[test]
    fn test_zero_capacity_retires_new_scope() {
        let cache = Cache::new(Some(0));
        let s = scope("A");
        assert!(!cache.register(Arc::clone(&s)));
        assert!(cache.is_empty());
        assert!(s.is_retired());
    }

    #[test]
    fn test_reset_discards_history() {
        let cache = Cache::new(Some(5));
        let old = scope("old");
        cache.register(Arc::clone(&old));

        cache.reset(Some(1));
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), Some(1));
        assert!(old.is_retired());

        cache.register(scope("new"));
        assert_eq!(paths(&cache), ["new"]);
    }

    #[test]
    fn test_concurrent_registration_never_exceeds_capacity() {
        let cache = Arc::new(Cache::new(Some(8)));
        std::thread::scope(|s| {
            for t in 0..8 {
                let cache = Arc::clone(&cache);
                s.spawn(move || {
                    for i in 0..200 {
                        cache.register(scope(&format!("{t}-{i}")));
                        assert!(cache.len() <= 8);
                    }
                });
            }
        });
        assert!(cache.len() <= 8);
    }
}
