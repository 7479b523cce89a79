//! Capabilities a resource type provides so that it can be pooled.

use std::{
    fmt,
    sync::{Arc, Weak},
};

use parking_lot::Mutex;
use tracing::{trace, warn};

use crate::{
    placement::{Placement, Space},
    pool::ResourcePool,
    resource::WeakPooled,
};

/// Resource type that can be managed by a [`ResourcePool`].
///
/// Everything a pool does to an instance goes through this trait: toggling its active state,
/// reparenting it between the pool container and caller scopes, resetting its placement and
/// naming it. The pool never inspects the instance otherwise.
pub trait Poolable: Sized + Send + 'static {
    /// Handle to a node in the host's scope hierarchy.
    type Scope: Clone + fmt::Debug + Send + Sync + 'static;
    /// Grouping key used to select instances for bulk recall.
    type Tag: PartialEq + fmt::Debug;

    /// Human-readable instance name.
    fn name(&self) -> &str;

    /// Rename the instance.
    fn set_name(&mut self, name: String);

    /// Whether the instance is observed as active by the host.
    fn is_active(&self) -> bool;

    /// Activate or deactivate the instance.
    fn set_active(&mut self, active: bool);

    /// Move the instance under a new parent scope, or detach it with `None`.
    fn set_parent(&mut self, parent: Option<&Self::Scope>, keep_world_transform: bool);

    /// Set position and rotation in the given coordinate space.
    fn set_placement(&mut self, placement: Placement, space: Space);

    /// Grouping key the instance currently belongs to.
    ///
    /// Queried every time a filtered recall runs, as it may change while the instance is checked
    /// out.
    fn scope_tag(&self) -> Option<Self::Tag>;

    /// Components reachable from this instance that know how to return themselves to a pool.
    ///
    /// This includes components of the instance itself as well as those of instances from other
    /// pools currently attached to it.
    fn nested_poolables(&self) -> Vec<Arc<dyn NestedPoolable<Self>>> {
        Vec::new()
    }
}

/// Pool-aware component nested inside a pooled instance.
pub trait NestedPoolable<R: Poolable>: Send + Sync {
    /// Remember the pool and instance this component belongs to.
    fn set_owning_pool(&self, link: PoolLink<R>);

    /// Update the cosmetic index of the owning instance.
    fn update_display_index(&self, index: usize);

    /// Return the owning instance to its pool.
    fn return_self_to_pool(&self);
}

/// Non-owning link from a nested component to its pool and instance.
pub struct PoolLink<R: Poolable> {
    pool: Weak<ResourcePool<R>>,
    instance: WeakPooled<R>,
}

impl<R: Poolable> PoolLink<R> {
    pub(crate) fn new(pool: Weak<ResourcePool<R>>, instance: WeakPooled<R>) -> Self {
        Self { pool, instance }
    }

    /// Owning pool, if it is still alive.
    #[must_use]
    pub fn pool(&self) -> Option<Arc<ResourcePool<R>>> {
        self.pool.upgrade()
    }

    /// Owning instance.
    #[must_use]
    pub fn instance(&self) -> &WeakPooled<R> {
        &self.instance
    }

    /// Return the linked instance to the linked pool.
    ///
    /// Returns `false` if either is gone, or if the pool no longer tracks the instance.
    pub fn release(&self) -> bool {
        match (self.pool.upgrade(), self.instance.upgrade()) {
            (Some(pool), Some(instance)) => pool.release(&instance),
            _ => {
                warn!("pool or instance dropped before returning nested member");
                false
            }
        }
    }
}

impl<R: Poolable> Clone for PoolLink<R> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            instance: self.instance.clone(),
        }
    }
}

impl<R: Poolable> fmt::Debug for PoolLink<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolLink")
            .field("pool", &self.pool.upgrade().map(|p| p.name().to_owned()))
            .field("instance", &self.instance)
            .finish()
    }
}

/// Stock [`NestedPoolable`] implementation.
///
/// Attach one to an instance to let it (or anything holding the component) send the instance back
/// to whichever pool registered it.
pub struct PoolMember<R: Poolable> {
    link: Mutex<Option<PoolLink<R>>>,
    display_index: Mutex<Option<usize>>,
}

impl<R: Poolable> PoolMember<R> {
    /// Create a component not yet linked to any pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            link: Mutex::new(None),
            display_index: Mutex::new(None),
        }
    }

    /// Link set by the owning pool, if any.
    #[must_use]
    pub fn link(&self) -> Option<PoolLink<R>> {
        self.link.lock().clone()
    }

    /// Index assigned by the owning pool, if any.
    #[must_use]
    pub fn display_index(&self) -> Option<usize> {
        *self.display_index.lock()
    }
}

impl<R: Poolable> Default for PoolMember<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Poolable> NestedPoolable<R> for PoolMember<R> {
    fn set_owning_pool(&self, link: PoolLink<R>) {
        *self.link.lock() = Some(link);
    }

    fn update_display_index(&self, index: usize) {
        trace!(index, "pool member index updated");
        *self.display_index.lock() = Some(index);
    }

    fn return_self_to_pool(&self) {
        // Clone out of the lock, releasing may reach back into this component.
        let link = self.link.lock().clone();
        match link {
            Some(link) => {
                link.release();
            }
            None => warn!("pool member has no owning pool, not returning"),
        }
    }
}

impl<R: Poolable> fmt::Debug for PoolMember<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolMember")
            .field("link", &*self.link.lock())
            .field("display_index", &*self.display_index.lock())
            .finish()
    }
}
