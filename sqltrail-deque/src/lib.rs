//! # Bounded Deque
//!
//! A head-tail queue backed by a doubly linked list, so pushing or popping at
//! either end is O(1) with no amortized reallocation. An optional capacity
//! limits how many items the queue holds; when the limit is reached the push
//! operations refuse the item and hand it back to the caller.
//!
//! The queue never evicts on its own. Callers that want "keep the newest N"
//! semantics pop from one end and retry the push themselves.
//!
//! ## Concurrency
//!
//! Every operation takes a single [`RwLock`]. Mutations take the write side,
//! size/peek queries and traversals take the read side. A traversal holds the
//! read lock for as long as its [`ReadView`] is alive, so writers wait until the
//! walk is over instead of racing with it.
//!
//! ```
//! use sqltrail_deque::BoundedDeque;
//!
//! let deque = BoundedDeque::with_capacity(2);
//! assert!(deque.push_front("a").is_ok());
//! assert!(deque.push_front("b").is_ok());
//! assert_eq!(deque.push_front("c"), Err("c"));
//!
//! let order: Vec<_> = deque.read().iter().copied().collect();
//! assert_eq!(order, ["b", "a"]);
//! ```

use std::collections::linked_list::{self, LinkedList};
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe double-ended queue with an optional maximum size.
pub struct BoundedDeque<T> {
    items: RwLock<LinkedList<T>>,
    /// `None` means unlimited
    capacity: Option<usize>,
}

impl<T> BoundedDeque<T> {
    /// Create an unbounded deque.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(None)
    }

    /// Create a deque that holds at most `capacity` items.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_limit(Some(capacity))
    }

    /// Create a deque with an explicit limit (`None` = unbounded).
    #[must_use]
    pub fn with_limit(capacity: Option<usize>) -> Self {
        Self { items: RwLock::new(LinkedList::new()), capacity }
    }

    /// Create a deque from a signed limit where any negative value means
    /// unbounded.
    #[must_use]
    pub fn from_signed(capacity: i64) -> Self {
        Self::with_limit(usize::try_from(capacity).ok())
    }

    /// Insert `item` at the front.
    ///
    /// # Errors
    /// Returns the item unchanged when the deque is already full.
    pub fn push_front(&self, item: T) -> Result<(), T> {
        let mut items = self.write();
        if self.has_room(items.len()) {
            items.push_front(item);
            Ok(())
        } else {
            Err(item)
        }
    }

    /// Insert `item` at the back.
    ///
    /// # Errors
    /// Returns the item unchanged when the deque is already full.
    pub fn push_back(&self, item: T) -> Result<(), T> {
        let mut items = self.write();
        if self.has_room(items.len()) {
            items.push_back(item);
            Ok(())
        } else {
            Err(item)
        }
    }

    /// Remove and return the front item.
    pub fn pop_front(&self) -> Option<T> {
        self.write().pop_front()
    }

    /// Remove and return the back item.
    pub fn pop_back(&self) -> Option<T> {
        self.write().pop_back()
    }

    /// Number of items currently stored.
    pub fn len(&self) -> usize {
        self.read_lock().len()
    }

    /// Configured limit, `None` when unbounded.
    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.read_lock().is_empty()
    }

    /// True when a push would be refused.
    pub fn is_full(&self) -> bool {
        !self.has_room(self.read_lock().len())
    }

    /// Drop every item, keeping the capacity.
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Take a read view for front-to-back traversal.
    ///
    /// The view keeps the shared lock until it is dropped; every call to
    /// [`ReadView::iter`] restarts from the front.
    pub fn read(&self) -> ReadView<'_, T> {
        ReadView { items: self.read_lock() }
    }

    fn has_room(&self, len: usize) -> bool {
        self.capacity.map_or(true, |cap| len < cap)
    }

    // A panic while holding the lock cannot leave the list half-linked, so
    // poisoning is ignored.
    fn read_lock(&self) -> RwLockReadGuard<'_, LinkedList<T>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LinkedList<T>> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> BoundedDeque<T> {
    /// Clone of the front item.
    pub fn peek_front(&self) -> Option<T> {
        self.read_lock().front().cloned()
    }

    /// Clone of the back item.
    pub fn peek_back(&self) -> Option<T> {
        self.read_lock().back().cloned()
    }

    /// Collect a full front-to-back traversal.
    pub fn snapshot(&self) -> Vec<T> {
        self.read().iter().cloned().collect()
    }
}

impl<T> Default for BoundedDeque<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for BoundedDeque<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedDeque")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

// =============================================================================
// TRAVERSAL
// =============================================================================

/// Shared-lock view over a [`BoundedDeque`].
pub struct ReadView<'a, T> {
    items: RwLockReadGuard<'a, LinkedList<T>>,
}

impl<T> ReadView<'_, T> {
    /// Lazy front-to-back iterator over the items visible in this view.
    pub fn iter(&self) -> linked_list::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'v, T> IntoIterator for &'v ReadView<'_, T> {
    type Item = &'v T;
    type IntoIter = linked_list::Iter<'v, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
