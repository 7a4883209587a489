//! Ordered handler registries.
//!
//! A [`Registry`] keeps handlers in insertion order and identifies them by
//! `Arc` pointer, so the handle returned at registration time is the handle
//! used for removal. Mutation may happen while a dispatch pass is running:
//! passes iterate over a [`snapshot`](Registry::snapshot) taken at the start
//! of the pass, and a change becomes visible from the next pass on.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

/// An ordered, thread-safe list of shared handlers.
pub struct Registry<T: ?Sized> {
    entries: RwLock<Vec<Arc<T>>>,
}

impl<T: ?Sized> Registry<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Appends a handler. Adding the same handle twice registers it twice.
    pub fn add(&self, entry: Arc<T>) {
        self.entries.write().push(entry);
    }

    /// Removes the first registration of `entry`.
    ///
    /// Returns `false` and leaves the registry untouched when the handle was
    /// never registered.
    pub fn remove(&self, entry: &Arc<T>) -> bool {
        let mut entries = self.entries.write();
        match entries.iter().position(|e| Arc::ptr_eq(e, entry)) {
            Some(pos) => {
                entries.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Checks whether `entry` is registered.
    pub fn contains(&self, entry: &Arc<T>) -> bool {
        self.entries.read().iter().any(|e| Arc::ptr_eq(e, entry))
    }

    /// Returns the current handlers in registration order.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl<T: ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named: Send + Sync {
        fn label(&self) -> &'static str;
    }

    struct Fixed(&'static str);

    impl Named for Fixed {
        fn label(&self) -> &'static str {
            self.0
        }
    }

    fn labels(registry: &Registry<dyn Named>) -> Vec<&'static str> {
        registry.snapshot().iter().map(|e| e.label()).collect()
    }

    #[test]
    fn test_insertion_order() {
        let registry: Registry<dyn Named> = Registry::new();
        registry.add(Arc::new(Fixed("a")));
        registry.add(Arc::new(Fixed("b")));
        registry.add(Arc::new(Fixed("c")));
        assert_eq!(labels(&registry), ["a", "b", "c"]);
    }

    #[test]
    fn test_remove_by_identity() {
        let registry: Registry<dyn Named> = Registry::new();
        let a: Arc<dyn Named> = Arc::new(Fixed("x"));
        let b: Arc<dyn Named> = Arc::new(Fixed("x"));
        registry.add(Arc::clone(&a));
        registry.add(Arc::clone(&b));

        assert!(registry.remove(&a));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&b));
        assert!(!registry.contains(&a));
    }

    #[test]
    fn test_remove_unregistered_is_noop() {
        let registry: Registry<dyn Named> = Registry::new();
        registry.add(Arc::new(Fixed("a")));
        let stranger: Arc<dyn Named> = Arc::new(Fixed("a"));

        assert!(!registry.remove(&stranger));
        assert_eq!(labels(&registry), ["a"]);
    }

    #[test]
    fn test_duplicate_registration_removes_first_only() {
        let registry: Registry<dyn Named> = Registry::new();
        let a: Arc<dyn Named> = Arc::new(Fixed("a"));
        registry.add(Arc::clone(&a));
        registry.add(Arc::new(Fixed("b")));
        registry.add(Arc::clone(&a));

        assert!(registry.remove(&a));
        assert_eq!(labels(&registry), ["b", "a"]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let registry: Registry<dyn Named> = Registry::new();
        registry.add(Arc::new(Fixed("a")));
        let snapshot = registry.snapshot();
        registry.clear();

        assert_eq!(snapshot.len(), 1);
        assert!(registry.is_empty());
    }
}
