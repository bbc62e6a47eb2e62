//! Lazily computed values that are dropped on structural change.

use std::cell::OnceCell;
use std::fmt;

/// A memoized value behind a read-only interface.
///
/// The value is computed on first read through [`get_or_compute`] and kept
/// until a mutator calls [`invalidate`]. Invalidation needs `&mut self`, so a
/// cached value can never go stale while someone holds a reference to it.
///
/// The cell is `Send` but not `Sync`; share owners behind a lock.
///
/// [`get_or_compute`]: Cached::get_or_compute
/// [`invalidate`]: Cached::invalidate
pub struct Cached<T> {
    cell: OnceCell<T>,
}

impl<T> Cached<T> {
    /// An empty (stale) cell.
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Return the cached value, computing it first if the cell is stale.
    #[inline]
    pub fn get_or_compute(&self, compute: impl FnOnce() -> T) -> &T {
        self.cell.get_or_init(compute)
    }

    /// The cached value, if it is current.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Drop the cached value so the next read recomputes it.
    #[inline]
    pub fn invalidate(&mut self) {
        self.cell.take();
    }
}

impl<T> Default for Cached<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for Cached<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Cached<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(value) => f.debug_tuple("Cached").field(value).finish(),
            None => f.write_str("Cached(<stale>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_computes_once() {
        let calls = Cell::new(0);
        let cache = Cached::new();

        assert!(!cache.is_valid());
        let first = *cache.get_or_compute(|| {
            calls.set(calls.get() + 1);
            41 + 1
        });
        let second = *cache.get_or_compute(|| {
            calls.set(calls.get() + 1);
            0
        });

        assert_eq!(first, 42);
        assert_eq!(second, 42);
        assert_eq!(calls.get(), 1);
        assert!(cache.is_valid());
    }

    #[test]
    fn test_invalidate_forces_recompute() {
        let mut cache = Cached::new();
        assert_eq!(*cache.get_or_compute(|| 1), 1);

        cache.invalidate();
        assert!(cache.get().is_none());
        assert_eq!(*cache.get_or_compute(|| 2), 2);
    }

    #[test]
    fn test_clone_keeps_value() {
        let cache = Cached::new();
        cache.get_or_compute(|| vec![1, 2, 3]);
        let copy = cache.clone();
        assert_eq!(copy.get(), Some(&vec![1, 2, 3]));
    }
}
