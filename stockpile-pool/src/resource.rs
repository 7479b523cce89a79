//! Shared handles to pooled instances.

use std::{
    fmt,
    sync::{Arc, Weak},
};

use parking_lot::{Mutex, MutexGuard};

/// Pooled resource instance.
///
/// The pool keeps one clone of every instance it created; callers receive further clones from
/// [`ResourcePool::acquire`]. Two handles are equal when they refer to the same instance, which is
/// how the pool finds the bookkeeping record on return.
///
/// [`ResourcePool::acquire`]: crate::ResourcePool::acquire
pub struct Pooled<R> {
    /// Original resource.
    inner: Arc<Mutex<R>>,
}

impl<R> Pooled<R> {
    /// Wrap a freshly created instance.
    pub(crate) fn new(resource: R) -> Self {
        Self {
            inner: Arc::new(Mutex::new(resource)),
        }
    }

    /// Lock the instance for inspection or mutation.
    ///
    /// Do not hold the guard while calling back into the owning pool.
    pub fn lock(&self) -> MutexGuard<'_, R> {
        self.inner.lock()
    }

    /// Whether both handles refer to the same instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Create a non-owning reference to this instance.
    #[must_use]
    pub fn downgrade(&self) -> WeakPooled<R> {
        WeakPooled {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl<R> Clone for Pooled<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R> PartialEq for Pooled<R> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<R> Eq for Pooled<R> {}

impl<R> fmt::Debug for Pooled<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pooled")
            .field(&Arc::as_ptr(&self.inner))
            .finish()
    }
}

/// Non-owning reference to a pooled instance.
pub struct WeakPooled<R> {
    inner: Weak<Mutex<R>>,
}

impl<R> WeakPooled<R> {
    /// Get a strong handle, if the instance is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Pooled<R>> {
        self.inner.upgrade().map(|inner| Pooled { inner })
    }
}

impl<R> Clone for WeakPooled<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R> fmt::Debug for WeakPooled<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WeakPooled")
            .field(&self.inner.as_ptr())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Equality is identity, not value equality.
    #[test]
    fn pooled_identity() {
        let first = Pooled::new(7_u32);
        let second = Pooled::new(7_u32);
        assert_eq!(first, first.clone());
        assert_ne!(first, second);
    }

    /// Weak handles stop resolving once every strong handle is gone.
    #[test]
    fn pooled_weak_upgrade() {
        let strong = Pooled::new(String::from("shell"));
        let weak = strong.downgrade();
        assert_eq!(weak.upgrade().as_ref(), Some(&strong));
        drop(strong);
        assert!(weak.upgrade().is_none());
    }
}
