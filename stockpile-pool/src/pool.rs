use std::{
    fmt,
    sync::{Arc, Weak},
    task::{ready, Poll},
    time::Instant,
};

use futures::FutureExt;
use opentelemetry::KeyValue;
use parking_lot::Mutex;
use tracing::{debug, debug_span, info, warn};

use crate::{
    config::{FillStrategy, PoolConfig, DEFAULT_INITIAL_COUNT},
    error::PoolError,
    events::{FillEvent, FillObservers},
    factory::{BatchCompletion, PendingBatch, ResourceFactory},
    metrics::{pool_kv, Metrics, PoolState, POOL_METRICS},
    placement::{Placement, Space},
    poolable::{NestedPoolable, PoolLink, Poolable},
    resource::{Pooled, WeakPooled},
};

/// Options for checking an instance out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcquireOptions {
    /// Activate the instance before handing it out.
    pub activate: bool,
    /// Deactivate the template while cloning it, if the pool has to expand.
    pub deactivate_template: bool,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            activate: true,
            deactivate_template: false,
        }
    }
}

/// Options for returning an instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReturnOptions {
    /// Keep world position when moving the instance back under the pool container.
    pub keep_world_transform: bool,
    /// Reset position and rotation to identity.
    pub reset_placement: bool,
    /// Reset local rather than world placement.
    pub reset_local: bool,
}

impl Default for ReturnOptions {
    fn default() -> Self {
        Self {
            keep_world_transform: false,
            reset_placement: true,
            reset_local: true,
        }
    }
}

/// Bookkeeping record of a single pooled instance.
struct Slot<R> {
    /// Pooled instance.
    instance: Pooled<R>,
    /// Instance was handed out and not yet returned.
    checked_out: bool,
    /// Checkout time, for use time metrics.
    acquired_at: Option<Instant>,
}

/// Deferred batch shared between the pool state and whoever is polling it.
///
/// Emptied by the poller that sees it complete.
type SharedBatch<R> = Arc<Mutex<Option<PendingBatch<R>>>>;

/// Nested members of a newly registered instance, linked once the state lock is released.
struct Wiring<R: Poolable> {
    index: usize,
    instance: WeakPooled<R>,
    members: Vec<Arc<dyn NestedPoolable<R>>>,
}

/// Work left after the state lock is released.
struct Landing<R: Poolable> {
    event: Option<FillEvent>,
    wiring: Vec<Wiring<R>>,
}

/// Mutable pool state.
struct PoolInner<R: Poolable> {
    /// Archetype cloned to create new instances.
    template: R,
    /// Scope idle instances are parented under.
    container: Option<R::Scope>,
    /// Instances in creation order.
    slots: Vec<Slot<R>>,
    /// Effective initial count, after correction.
    initial_count: usize,
    /// Initial fill has landed.
    initialised: bool,
    /// Asynchronous fill in flight.
    pending: Option<SharedBatch<R>>,
}

/// Pool of reusable instances cloned from a single template.
///
/// Idle instances live inactive under a container scope created on [`Self::initialise`].
/// [`Self::acquire`] hands out the first idle instance, expanding the pool when it is allowed to;
/// [`Self::release`] takes an instance back, deactivating and re-parenting it.
///
/// The pool is meant to be driven by one logical owner. Internal state is guarded by a mutex so
/// the pool can be shared, but acquisition order and fairness between several concurrent callers
/// are unspecified.
pub struct ResourcePool<R: Poolable> {
    /// Self-reference handed to nested pool members.
    this: Weak<Self>,
    /// Pool configuration.
    config: PoolConfig,
    /// Template name, used for container naming and errors.
    template_name: String,
    /// Host-side instance factory.
    factory: Arc<dyn ResourceFactory<R>>,
    /// Pool label.
    label: [KeyValue; 1],
    /// Linked metrics storage.
    metrics: Arc<Metrics>,
    /// Mutable state.
    inner: Mutex<PoolInner<R>>,
    /// Fill completion callbacks.
    observers: FillObservers,
}

impl<R: Poolable> ResourcePool<R> {
    /// Create a new, uninitialised pool.
    #[must_use]
    pub fn new(
        config: PoolConfig,
        template: R,
        factory: Arc<dyn ResourceFactory<R>>,
    ) -> Arc<Self> {
        let template_name = template.name().to_owned();
        let label = pool_kv(config.name.clone());
        let initial_count = config.initial_count;
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            config,
            template_name,
            factory,
            label,
            metrics: Arc::clone(&POOL_METRICS),
            inner: Mutex::new(PoolInner {
                template,
                container: None,
                slots: Vec::new(),
                initial_count,
                initialised: false,
                pending: None,
            }),
            observers: FillObservers::default(),
        })
    }

    /// Pool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Name of the template instances are cloned from.
    #[must_use]
    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    /// Pool configuration.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Effective initial count.
    ///
    /// Differs from configuration once a configured count of zero was corrected.
    #[must_use]
    pub fn initial_count(&self) -> usize {
        self.inner.lock().initial_count
    }

    /// Whether the initial fill has landed.
    #[must_use]
    pub fn is_initialised(&self) -> bool {
        self.inner.lock().initialised
    }

    /// Whether an asynchronous fill is still in flight.
    #[must_use]
    pub fn is_filling(&self) -> bool {
        self.inner.lock().pending.is_some()
    }

    /// Number of instances tracked by the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().slots.len()
    }

    /// Whether the pool tracks no instances at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().slots.is_empty()
    }

    /// Container scope of idle instances, once initialised.
    #[must_use]
    pub fn container(&self) -> Option<R::Scope> {
        self.inner.lock().container.clone()
    }

    /// Snapshot of pool bookkeeping.
    #[must_use]
    pub fn state(&self) -> PoolState {
        Self::snapshot(&self.inner.lock())
    }

    /// All tracked instances, in creation order.
    #[must_use]
    pub fn instances(&self) -> Vec<Pooled<R>> {
        self.inner
            .lock()
            .slots
            .iter()
            .map(|slot| slot.instance.clone())
            .collect()
    }

    /// Checkout state of an instance, or `None` if the pool does not track it.
    #[must_use]
    pub fn is_checked_out(&self, instance: &Pooled<R>) -> Option<bool> {
        self.inner
            .lock()
            .slots
            .iter()
            .find(|slot| slot.instance.ptr_eq(instance))
            .map(|slot| slot.checked_out)
    }

    /// Register a callback fired every time the initial fill lands.
    pub fn on_filled(&self, callback: impl Fn(&FillEvent) + Send + Sync + 'static) {
        self.observers.subscribe(callback);
    }

    /// Create the container scope under `owner` and start the initial fill.
    ///
    /// With [`FillStrategy::Synchronous`] all instances are created before returning. With
    /// [`FillStrategy::Asynchronous`] a batch is requested and the pool becomes initialised only
    /// once it lands, see [`Self::poll_fill`] and [`Self::wait_filled`].
    pub fn initialise(&self, owner: &R::Scope) {
        let _span = debug_span!("pool_initialise", pool = %self.config.name).entered();
        let mut inner = self.inner.lock();
        if inner.initialised || inner.pending.is_some() {
            warn!(
                pool = %self.config.name,
                "pool is already initialised or filling, ignoring repeated initialisation"
            );
            return;
        }
        let container = self
            .factory
            .create_container(&format!("{}_Pool", self.template_name), owner);
        inner.container = Some(container.clone());
        inner.template.set_active(false);
        if inner.initial_count == 0 {
            warn!(
                pool = %self.config.name,
                default = DEFAULT_INITIAL_COUNT,
                "initial count is 0, using default; check pool configuration"
            );
            inner.initial_count = DEFAULT_INITIAL_COUNT;
        }
        let count = inner.initial_count;
        self.metrics.initial.record(count as u64, &self.label);
        let mut wiring = Vec::new();
        let event = match self.config.fill {
            FillStrategy::Synchronous => {
                for _ in 0..count {
                    let instance = self.factory.instantiate(&inner.template, Some(&container));
                    wiring.push(self.register(&mut inner, instance).1);
                }
                Some(self.mark_initialised(&mut inner))
            }
            FillStrategy::Asynchronous => {
                let batch = self
                    .factory
                    .instantiate_batch(&inner.template, count, &container);
                debug!(pool = %self.config.name, count, "requested deferred batch");
                inner.pending = Some(Arc::new(Mutex::new(Some(batch))));
                None
            }
        };
        inner.template.set_active(true);
        self.record_state(&inner);
        drop(inner);
        self.settle(Landing { event, wiring });
    }

    /// Land the asynchronous fill if its batch is ready, without blocking.
    ///
    /// Intended to be called once per tick by the owner. Returns `true` if the pool became
    /// initialised by this call.
    pub fn poll_fill(&self) -> bool {
        match self.drive_fill(|batch| batch.poll_now().map_or(Poll::Pending, Poll::Ready)) {
            Poll::Ready(Some(landing)) => self.settle(landing),
            Poll::Ready(None) | Poll::Pending => false,
        }
    }

    /// Wait until the asynchronous fill lands.
    ///
    /// Returns immediately if no fill is in flight. Returns whether the pool is initialised
    /// afterwards; a batch that completed without being done leaves it uninitialised.
    pub async fn wait_filled(&self) -> bool {
        let landing =
            futures::future::poll_fn(|cx| self.drive_fill(|batch| batch.poll_unpin(cx))).await;
        if let Some(landing) = landing {
            self.settle(landing);
        }
        self.is_initialised()
    }

    /// Check out an idle instance, activating it.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Exhausted`] if the pool is not expandable and every instance is
    /// checked out.
    pub fn acquire(&self) -> Result<Pooled<R>, PoolError> {
        self.acquire_with(AcquireOptions::default())
    }

    /// Check out an idle instance.
    ///
    /// Instances that are not checked out but observed as active are skipped: something
    /// reactivated them behind the pool's back. If nothing is idle, an expandable pool grows by
    /// one instance.
    ///
    /// A pool that has not finished its initial fill always expands, whatever its configuration
    /// says, so that early callers are served.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Exhausted`] if the pool is not expandable and every instance is
    /// checked out.
    pub fn acquire_with(&self, opts: AcquireOptions) -> Result<Pooled<R>, PoolError> {
        let now = Instant::now();
        let _span = debug_span!("pool_acquire", pool = %self.config.name).entered();
        let mut inner = self.inner.lock();
        let (pooled, wiring) = if !inner.initialised {
            warn!(
                pool = %self.config.name,
                "pool has not initialised yet, expanding regardless of configuration; \
                 acquire instances after initialisation"
            );
            let (pooled, wiring) = self.expand_locked(&mut inner, opts);
            (pooled, Some(wiring))
        } else if let Some(pooled) = Self::checkout_idle(&mut inner, opts.activate) {
            (pooled, None)
        } else if self.config.expandable {
            let (pooled, wiring) = self.expand_locked(&mut inner, opts);
            (pooled, Some(wiring))
        } else {
            return Err(PoolError::Exhausted {
                pool: self.config.name.clone(),
                template: self.template_name.clone(),
            });
        };
        self.record_state(&inner);
        drop(inner);
        if let Some(wiring) = wiring {
            self.wire(wiring);
        }
        self.metrics
            .acquire_time
            .record(now.elapsed().as_secs_f64(), &self.label);
        Ok(pooled)
    }

    /// Check out an instance and move it into place.
    ///
    /// The placement is applied in world space. If `parent` is given, the instance is then
    /// re-parented under it.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Exhausted`] if the pool is not expandable and every instance is
    /// checked out.
    pub fn acquire_at(
        &self,
        placement: Placement,
        opts: AcquireOptions,
        parent: Option<&R::Scope>,
        keep_world_transform: bool,
    ) -> Result<Pooled<R>, PoolError> {
        let pooled = self.acquire_with(opts)?;
        {
            let mut instance = pooled.lock();
            instance.set_placement(placement, Space::World);
            if let Some(parent) = parent {
                instance.set_parent(Some(parent), keep_world_transform);
            }
        }
        Ok(pooled)
    }

    /// Grow the pool by a single instance, already checked out.
    pub fn expand(&self, activate: bool, deactivate_template: bool) -> Pooled<R> {
        let mut inner = self.inner.lock();
        let (pooled, wiring) = self.expand_locked(
            &mut inner,
            AcquireOptions {
                activate,
                deactivate_template,
            },
        );
        self.record_state(&inner);
        drop(inner);
        self.wire(wiring);
        pooled
    }

    /// Return an instance to the pool with default options.
    ///
    /// Returns `false` if the instance is not tracked by this pool.
    pub fn release(&self, instance: &Pooled<R>) -> bool {
        self.release_with(instance, ReturnOptions::default())
    }

    /// Return an instance to the pool.
    ///
    /// The instance is moved under the pool container, deactivated and marked idle. Returning an
    /// idle instance again is harmless. Unknown instances are logged and ignored.
    pub fn release_with(&self, instance: &Pooled<R>, opts: ReturnOptions) -> bool {
        let mut inner = self.inner.lock();
        let PoolInner {
            container, slots, ..
        } = &mut *inner;
        let Some(slot) = slots.iter_mut().find(|slot| slot.instance.ptr_eq(instance)) else {
            drop(inner);
            warn!(
                pool = %self.config.name,
                instance = instance.lock().name(),
                "returned instance is not tracked by this pool; make sure it was not removed by mistake"
            );
            return false;
        };
        self.reset_slot(slot, container.as_ref(), opts);
        self.record_state(&inner);
        true
    }

    /// Return every instance, or only those whose scope tag equals `filter`.
    ///
    /// Returns the number of instances processed, idle ones included.
    pub fn release_all(&self, filter: Option<&R::Tag>) -> usize {
        let mut inner = self.inner.lock();
        let PoolInner {
            container, slots, ..
        } = &mut *inner;
        let mut count = 0;
        for slot in slots.iter_mut() {
            if let Some(tag) = filter {
                if slot.instance.lock().scope_tag().as_ref() != Some(tag) {
                    continue;
                }
            }
            self.reset_slot(slot, container.as_ref(), ReturnOptions::default());
            count += 1;
        }
        self.record_state(&inner);
        debug!(pool = %self.config.name, count, ?filter, "returned instances");
        count
    }

    /// Send nested pool members found in this pool's instances back to their own pools.
    ///
    /// Instances without nested members are logged and skipped. Returns the number of members
    /// asked to return.
    pub fn clean_nested(&self) -> usize {
        let members: Vec<_> = {
            let inner = self.inner.lock();
            let mut members = Vec::new();
            for slot in &inner.slots {
                let instance = slot.instance.lock();
                let nested = instance.nested_poolables();
                if nested.is_empty() {
                    warn!(
                        pool = %self.config.name,
                        instance = instance.name(),
                        "no nested pool members found in instance, skipping"
                    );
                    continue;
                }
                members.extend(nested);
            }
            members
        };
        // Members may point back into this pool, so the lock must be released by now.
        for member in &members {
            member.return_self_to_pool();
        }
        members.len()
    }

    /// Forget every instance and reset initialisation.
    ///
    /// Instances themselves stay alive as long as anybody holds them. An in-flight batch is
    /// dropped. Meant for resetting a development session, not for production use.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        if inner.pending.take().is_some() {
            debug!(pool = %self.config.name, "dropping in-flight batch");
        }
        inner.slots.clear();
        inner.initialised = false;
        self.record_state(&inner);
        info!(pool = %self.config.name, "pool cleared");
    }

    /// Find and check out the first idle instance.
    fn checkout_idle(inner: &mut PoolInner<R>, activate: bool) -> Option<Pooled<R>> {
        for slot in inner.slots.iter_mut().filter(|slot| !slot.checked_out) {
            let mut instance = slot.instance.lock();
            if instance.is_active() {
                continue;
            }
            instance.set_active(activate);
            drop(instance);
            slot.checked_out = true;
            slot.acquired_at = Some(Instant::now());
            return Some(slot.instance.clone());
        }
        None
    }

    /// Clone the template once and check the new instance out.
    fn expand_locked(
        &self,
        inner: &mut PoolInner<R>,
        opts: AcquireOptions,
    ) -> (Pooled<R>, Wiring<R>) {
        if opts.deactivate_template {
            inner.template.set_active(false);
        }
        let instance = self
            .factory
            .instantiate(&inner.template, inner.container.as_ref());
        let (pooled, wiring) = self.register(inner, instance);
        pooled.lock().set_active(opts.activate);
        if let Some(slot) = inner.slots.last_mut() {
            slot.checked_out = true;
            slot.acquired_at = Some(Instant::now());
        }
        if opts.deactivate_template {
            inner.template.set_active(true);
        }
        debug!(pool = %self.config.name, size = inner.slots.len(), "pool expanded");
        (pooled, wiring)
    }

    /// Name a new instance and track it as idle.
    ///
    /// Nested members are returned for [`Self::wire`], to be linked without holding the lock.
    fn register(&self, inner: &mut PoolInner<R>, instance: R) -> (Pooled<R>, Wiring<R>) {
        let index = inner.slots.len();
        let pooled = Pooled::new(instance);
        let members = {
            let mut instance = pooled.lock();
            let name = format!("{} - {index}", instance.name());
            instance.set_name(name);
            instance.nested_poolables()
        };
        if members.is_empty() {
            debug!(pool = %self.config.name, index, "no nested pool members in new instance");
        }
        inner.slots.push(Slot {
            instance: pooled.clone(),
            checked_out: false,
            acquired_at: None,
        });
        let wiring = Wiring {
            index,
            instance: pooled.downgrade(),
            members,
        };
        (pooled, wiring)
    }

    /// Link nested members to this pool and their instance.
    ///
    /// Must be called without holding the pool state lock.
    fn wire(&self, wiring: Wiring<R>) {
        for member in wiring.members {
            member.set_owning_pool(PoolLink::new(self.this.clone(), wiring.instance.clone()));
            member.update_display_index(wiring.index);
        }
    }

    /// Poll the asynchronous fill with the state lock released, landing it once complete.
    ///
    /// Resolves to `None` if no fill is in flight, or if it was superseded by [`Self::clear`]
    /// while being polled.
    fn drive_fill(
        &self,
        poll: impl FnOnce(&mut PendingBatch<R>) -> Poll<BatchCompletion<R>>,
    ) -> Poll<Option<Landing<R>>> {
        let Some(shared) = self.inner.lock().pending.clone() else {
            return Poll::Ready(None);
        };
        // Batch lock is taken before the state lock, never the other way around.
        let mut batch = shared.lock();
        let Some(pending) = batch.as_mut() else {
            return Poll::Ready(None);
        };
        let completion = ready!(poll(pending));
        *batch = None;
        let mut inner = self.inner.lock();
        let current = inner
            .pending
            .as_ref()
            .is_some_and(|pending| Arc::ptr_eq(pending, &shared));
        if !current {
            debug!(pool = %self.config.name, "discarding batch of a cleared session");
            return Poll::Ready(None);
        }
        Poll::Ready(Some(self.land(&mut inner, completion)))
    }

    /// Handle completion of the asynchronous fill.
    fn land(&self, inner: &mut PoolInner<R>, completion: BatchCompletion<R>) -> Landing<R> {
        inner.pending = None;
        let mut wiring = Vec::with_capacity(completion.instances.len());
        let event = if completion.done {
            for instance in completion.instances {
                wiring.push(self.register(inner, instance).1);
            }
            Some(self.mark_initialised(inner))
        } else {
            warn!(
                pool = %self.config.name,
                progress = completion.progress,
                "batch completion fired before the operation was done, pool stays uninitialised"
            );
            None
        };
        self.record_state(inner);
        Landing { event, wiring }
    }

    fn mark_initialised(&self, inner: &mut PoolInner<R>) -> FillEvent {
        inner.initialised = true;
        info!(pool = %self.config.name, instances = inner.slots.len(), "pool filled");
        FillEvent {
            pool: self.config.name.clone(),
            instances: inner.slots.len(),
        }
    }

    /// Link nested members, then notify observers. Must be called without holding the lock.
    ///
    /// Returns whether a fill landed.
    fn settle(&self, landing: Landing<R>) -> bool {
        for wiring in landing.wiring {
            self.wire(wiring);
        }
        match landing.event {
            Some(event) => {
                self.observers.notify(&event);
                true
            }
            None => false,
        }
    }

    /// Move an instance back to the container and mark it idle.
    fn reset_slot(&self, slot: &mut Slot<R>, container: Option<&R::Scope>, opts: ReturnOptions) {
        let mut instance = slot.instance.lock();
        instance.set_parent(container, opts.keep_world_transform);
        instance.set_active(false);
        if opts.reset_placement {
            let space = if opts.reset_local {
                Space::Local
            } else {
                Space::World
            };
            instance.set_placement(Placement::IDENTITY, space);
        }
        drop(instance);
        slot.checked_out = false;
        if let Some(acquired_at) = slot.acquired_at.take() {
            // Record time spent outside the pool.
            self.metrics
                .use_time
                .record(acquired_at.elapsed().as_secs_f64(), &self.label);
        }
    }

    fn snapshot(inner: &PoolInner<R>) -> PoolState {
        let in_use = inner.slots.iter().filter(|slot| slot.checked_out).count();
        PoolState {
            size: inner.slots.len(),
            idle: inner.slots.len() - in_use,
            in_use,
            initialised: inner.initialised,
            filling: inner.pending.is_some(),
        }
    }

    fn record_state(&self, inner: &PoolInner<R>) {
        self.metrics.record_state(&self.label, &Self::snapshot(inner));
    }
}

impl<R: Poolable> fmt::Debug for ResourcePool<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourcePool")
            .field("name", &self.config.name)
            .field("template", &self.template_name)
            .field("expandable", &self.config.expandable)
            .field("fill", &self.config.fill)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicBool, AtomicUsize, Ordering},
            mpsc,
        },
        thread,
        time::Duration,
    };

    use futures::executor::block_on;
    use tracing::{
        field::{Field, Visit},
        Event, Level, Subscriber,
    };
    use tracing_subscriber::{
        layer::{Context, SubscriberExt},
        Layer,
    };

    use super::*;
    use crate::{
        placement::{Quat, Vec3},
        poolable::PoolMember,
        testing::{BatchMode, TestFactory, TestNode, TestScope},
    };

    fn root() -> TestScope {
        TestScope::new("root")
    }

    fn make_pool(
        config: PoolConfig,
        template: TestNode,
        mode: BatchMode,
    ) -> (Arc<ResourcePool<TestNode>>, Arc<TestFactory>) {
        let factory = TestFactory::new(mode);
        let pool = ResourcePool::new(config, template, factory.clone());
        (pool, factory)
    }

    fn sync_pool(
        count: usize,
        expandable: bool,
    ) -> (Arc<ResourcePool<TestNode>>, Arc<TestFactory>) {
        let (pool, factory) = make_pool(
            PoolConfig::new("bullets")
                .with_initial_count(count)
                .with_expandable(expandable)
                .with_fill(FillStrategy::Synchronous),
            TestNode::new("Bullet"),
            BatchMode::Immediate,
        );
        pool.initialise(&root());
        (pool, factory)
    }

    fn off_site() -> Placement {
        Placement::new(Vec3::new(1.0, 2.0, 3.0), Quat::new(0.0, 1.0, 0.0, 0.0))
    }

    /// Synchronous fill registers every instance idle, inactive and under the container.
    #[test]
    fn sync_fill() {
        let (pool, factory) = sync_pool(3, false);
        assert_eq!(
            pool.state(),
            PoolState {
                size: 3,
                idle: 3,
                in_use: 0,
                initialised: true,
                filling: false,
            }
        );
        let container = TestScope::new("root/Bullet_Pool");
        assert_eq!(factory.containers(), vec![container.clone()]);
        assert_eq!(pool.container(), Some(container.clone()));
        for (idx, instance) in pool.instances().iter().enumerate() {
            let node = instance.lock();
            assert_eq!(node.name, format!("Bullet(Clone) - {idx}"));
            assert!(!node.active);
            assert_eq!(node.parent.as_ref(), Some(&container));
        }
        // Template must not be observed active while cloning.
        assert_eq!(factory.template_active(), vec![false; 3]);
    }

    /// Zero initial count is corrected to the default.
    #[test]
    fn zero_count_sync() {
        let (pool, _) = sync_pool(0, false);
        assert_eq!(pool.initial_count(), DEFAULT_INITIAL_COUNT);
        assert_eq!(pool.len(), DEFAULT_INITIAL_COUNT);
        assert_eq!(pool.config().initial_count, 0);
    }

    /// Zero initial count, expandable, asynchronous fill.
    #[test]
    fn zero_count_async() {
        let (pool, factory) = make_pool(
            PoolConfig::new("sparks")
                .with_initial_count(0)
                .with_expandable(true),
            TestNode::new("Spark"),
            BatchMode::Immediate,
        );
        pool.initialise(&root());
        assert!(!pool.is_initialised());
        assert!(pool.is_filling());
        assert!(pool.is_empty());
        assert!(pool.poll_fill());
        assert_eq!(pool.len(), 5);
        assert!(pool.is_initialised());
        assert!(!pool.is_filling());
        assert_eq!(factory.batches(), vec![5]);
    }

    /// Batch handles are invisible until the whole batch lands; early callers get expansions.
    #[test]
    fn async_early_acquire() {
        let (pool, factory) = make_pool(
            PoolConfig::new("sparks").with_initial_count(3),
            TestNode::new("Spark"),
            BatchMode::Manual,
        );
        pool.initialise(&root());
        assert!(!pool.poll_fill());
        let early = pool.acquire().unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.is_checked_out(&early), Some(true));
        assert!(early.lock().active);
        assert!(!pool.is_initialised());

        assert!(factory.land_next());
        assert!(pool.poll_fill());
        assert!(pool.is_initialised());
        assert_eq!(
            pool.state(),
            PoolState {
                size: 4,
                idle: 3,
                in_use: 1,
                initialised: true,
                filling: false,
            }
        );
        let names: Vec<_> = pool
            .instances()
            .iter()
            .map(|instance| instance.lock().name.clone())
            .collect();
        assert_eq!(names[0], "Spark(Clone) - 0");
        assert_eq!(names[3], "Spark(Clone) - 3");
    }

    /// Expansion works before the pool was ever initialised.
    #[test]
    fn acquire_before_initialise() {
        let (pool, factory) = make_pool(
            PoolConfig::new("sparks").with_initial_count(2),
            TestNode::new("Spark"),
            BatchMode::Immediate,
        );
        let early = pool.acquire().unwrap();
        assert_eq!(early.lock().parent, None);
        assert_eq!(pool.len(), 1);
        assert!(!pool.is_initialised());
        assert!(factory.containers().is_empty());
    }

    /// A completion that is not done leaves the pool uninitialised and ready for another attempt.
    #[test]
    fn async_incomplete() {
        let (pool, factory) = make_pool(
            PoolConfig::new("sparks").with_initial_count(4),
            TestNode::new("Spark"),
            BatchMode::Incomplete,
        );
        pool.initialise(&root());
        assert!(!pool.poll_fill());
        assert!(!pool.is_initialised());
        assert!(!pool.is_filling());
        assert!(pool.is_empty());
        pool.initialise(&root());
        assert_eq!(factory.batches(), vec![4, 4]);
    }

    /// Dropped batch sender is treated as an incomplete batch.
    #[test]
    fn async_abandoned() {
        let (pool, factory) = make_pool(
            PoolConfig::new("sparks").with_initial_count(2),
            TestNode::new("Spark"),
            BatchMode::Manual,
        );
        pool.initialise(&root());
        assert!(factory.abandon_next());
        assert!(!block_on(pool.wait_filled()));
        assert!(pool.is_empty());
        assert!(!pool.is_filling());
    }

    /// Waiting for a batch delivered from another task.
    #[tokio::test]
    async fn async_wait_filled() {
        let (pool, factory) = make_pool(
            PoolConfig::new("sparks").with_initial_count(3),
            TestNode::new("Spark"),
            BatchMode::Manual,
        );
        pool.initialise(&root());
        let lander = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            factory.land_next()
        });
        assert!(pool.wait_filled().await);
        assert!(lander.await.unwrap());
        assert_eq!(pool.len(), 3);
    }

    /// Waiting without a fill in flight returns immediately.
    #[test]
    fn wait_filled_no_pending() {
        let (pool, _) = sync_pool(1, false);
        assert!(block_on(pool.wait_filled()));
    }

    /// Expandable pool grows by one instance per extra acquisition.
    #[test]
    fn acquire_expandable() {
        let (pool, _) = sync_pool(2, true);
        let acquired: Vec<_> = (0..5).map(|_| pool.acquire().unwrap()).collect();
        assert_eq!(pool.len(), 5);
        assert_eq!(pool.state().in_use, 5);
        for (idx, instance) in acquired.iter().enumerate() {
            assert!(acquired[idx + 1..].iter().all(|other| other != instance));
        }
    }

    /// Non-expandable pool fails hard once exhausted.
    #[test]
    fn acquire_exhausted() {
        let (pool, _) = sync_pool(2, false);
        pool.acquire().unwrap();
        pool.acquire().unwrap();
        match pool.acquire() {
            Err(PoolError::Exhausted { pool, template }) => {
                assert_eq!(pool, "bullets");
                assert_eq!(template, "Bullet");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(pool.len(), 2);
    }

    /// Instances reactivated behind the pool's back are not handed out.
    #[test]
    fn acquire_skips_active() {
        let (pool, _) = sync_pool(2, false);
        let instances = pool.instances();
        instances[0].lock().active = true;
        let acquired = pool.acquire().unwrap();
        assert_eq!(acquired, instances[1]);
        assert_eq!(pool.is_checked_out(&instances[0]), Some(false));
        assert!(pool.acquire().is_err());
    }

    /// Acquisition can leave the instance inactive.
    #[test]
    fn acquire_inactive() {
        let (pool, _) = sync_pool(1, false);
        let acquired = pool
            .acquire_with(AcquireOptions {
                activate: false,
                ..AcquireOptions::default()
            })
            .unwrap();
        assert!(!acquired.lock().active);
        assert_eq!(pool.is_checked_out(&acquired), Some(true));
    }

    /// Placement convenience wrapper.
    #[test]
    fn acquire_at_placement() {
        let (pool, _) = sync_pool(1, false);
        let target = TestScope::new("root/level");
        let acquired = pool
            .acquire_at(off_site(), AcquireOptions::default(), Some(&target), true)
            .unwrap();
        let node = acquired.lock();
        assert_eq!(node.world, off_site());
        assert_eq!(node.parent.as_ref(), Some(&target));
        assert_eq!(node.kept_world_transform, Some(true));
        drop(node);
        assert_eq!(pool.is_checked_out(&acquired), Some(true));
    }

    /// Return restores idle state, parent and placement.
    #[test]
    fn release_round_trip() {
        let (pool, _) = sync_pool(2, false);
        let acquired = pool.acquire().unwrap();
        {
            let mut node = acquired.lock();
            node.parent = Some(TestScope::new("root/level"));
            node.local = off_site();
        }
        assert!(pool.release(&acquired));
        assert_eq!(pool.is_checked_out(&acquired), Some(false));
        let node = acquired.lock();
        assert!(!node.active);
        assert_eq!(node.parent, pool.container());
        assert_eq!(node.local, Placement::IDENTITY);
        assert_eq!(node.kept_world_transform, Some(false));
        drop(node);
        assert_eq!(pool.state().idle, 2);
    }

    /// Returning an idle instance twice is harmless.
    #[test]
    fn release_idempotent() {
        let (pool, _) = sync_pool(2, false);
        let acquired = pool.acquire().unwrap();
        assert!(pool.release(&acquired));
        let state = pool.state();
        assert!(pool.release(&acquired));
        assert_eq!(pool.state(), state);
        assert_eq!(pool.is_checked_out(&acquired), Some(false));
    }

    /// Returning an instance the pool does not know is a no-op.
    #[test]
    fn release_foreign() {
        let (pool, _) = sync_pool(1, false);
        let (other, _) = sync_pool(1, false);
        let foreign = other.acquire().unwrap();
        let state = pool.state();
        assert!(!pool.release(&foreign));
        assert_eq!(pool.state(), state);
        assert_eq!(other.is_checked_out(&foreign), Some(true));
    }

    /// Placement reset flags.
    #[test]
    fn release_options() {
        let (pool, _) = sync_pool(2, false);
        let kept = pool.acquire().unwrap();
        kept.lock().local = off_site();
        pool.release_with(
            &kept,
            ReturnOptions {
                reset_placement: false,
                ..ReturnOptions::default()
            },
        );
        assert_eq!(kept.lock().local, off_site());

        let world = pool.acquire().unwrap();
        world.lock().world = off_site();
        pool.release_with(
            &world,
            ReturnOptions {
                keep_world_transform: true,
                reset_local: false,
                ..ReturnOptions::default()
            },
        );
        let node = world.lock();
        assert_eq!(node.world, Placement::IDENTITY);
        assert_eq!(node.kept_world_transform, Some(true));
    }

    /// Unfiltered bulk return processes every instance, idle ones included.
    #[test]
    fn release_all_unfiltered() {
        let (pool, _) = sync_pool(3, false);
        pool.acquire().unwrap();
        pool.acquire().unwrap();
        assert_eq!(pool.release_all(None), 3);
        assert_eq!(pool.state().in_use, 0);
    }

    /// Filtered bulk return only touches instances tagged with the filter.
    #[test]
    fn release_all_filtered() {
        let (pool, _) = make_pool(
            PoolConfig::new("bullets")
                .with_initial_count(3)
                .with_fill(FillStrategy::Synchronous),
            TestNode::new("Bullet").with_scene("level1"),
            BatchMode::Immediate,
        );
        pool.initialise(&root());
        let acquired: Vec<_> = (0..3).map(|_| pool.acquire().unwrap()).collect();
        acquired[1].lock().scene = Some("level2".into());
        assert_eq!(pool.release_all(Some(&"level1".to_owned())), 2);
        assert_eq!(pool.is_checked_out(&acquired[0]), Some(false));
        assert_eq!(pool.is_checked_out(&acquired[1]), Some(true));
        assert_eq!(pool.is_checked_out(&acquired[2]), Some(false));
        assert_eq!(pool.release_all(Some(&"level3".to_owned())), 0);
    }

    /// Explicit expansion appends a checked out instance.
    #[test]
    fn expand_explicit() {
        let (pool, factory) = sync_pool(1, false);
        let expanded = pool.expand(false, true);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.is_checked_out(&expanded), Some(true));
        assert!(!expanded.lock().active);
        assert_eq!(expanded.lock().name, "Bullet(Clone) - 1");
        assert_eq!(factory.template_active(), vec![false, false]);
        pool.expand(true, false);
        assert_eq!(factory.template_active(), vec![false, false, true]);
    }

    /// Nested members get linked to the pool and indexed on registration.
    #[test]
    fn nested_members_linked() {
        let (pool, _) = make_pool(
            PoolConfig::new("crates")
                .with_initial_count(2)
                .with_fill(FillStrategy::Synchronous),
            TestNode::new("Crate").with_member(),
            BatchMode::Immediate,
        );
        pool.initialise(&root());
        let second = pool.instances()[1].clone();
        let member = second.lock().members[0].clone();
        member.return_self_to_pool();

        let acquired = pool.acquire().unwrap();
        assert_eq!(pool.is_checked_out(&acquired), Some(true));
        let member = acquired.lock().members[0].clone();
        member.return_self_to_pool();
        assert_eq!(pool.is_checked_out(&acquired), Some(false));
    }

    /// Stock member reports its link and index.
    #[test]
    fn pool_member_link() {
        let member = Arc::new(PoolMember::<TestNode>::new());
        let (pool, _) = sync_pool(1, false);
        assert!(member.link().is_none());
        // Unlinked member only warns.
        member.return_self_to_pool();
        let instance = pool.instances()[0].clone();
        member.set_owning_pool(PoolLink::new(Arc::downgrade(&pool), instance.downgrade()));
        member.update_display_index(7);
        assert_eq!(member.display_index(), Some(7));
        let link = member.link().unwrap();
        assert_eq!(link.pool().unwrap().name(), "bullets");
        assert_eq!(link.instance().upgrade(), Some(instance));
    }

    /// Nested members of another pool are sent home.
    #[test]
    fn clean_nested_other_pool() {
        let (hosts, _) = sync_pool(2, false);
        let (crates, _) = make_pool(
            PoolConfig::new("crates")
                .with_initial_count(1)
                .with_expandable(true)
                .with_fill(FillStrategy::Synchronous),
            TestNode::new("Crate").with_member(),
            BatchMode::Immediate,
        );
        crates.initialise(&root());
        let host = hosts.acquire().unwrap();
        let nested = crates.acquire().unwrap();
        nested.lock().parent = Some(TestScope::new("root/Bullet_Pool/host"));
        let member = nested.lock().members[0].clone();
        host.lock().attach(member);

        assert_eq!(hosts.clean_nested(), 1);
        assert_eq!(crates.is_checked_out(&nested), Some(false));
        assert_eq!(nested.lock().parent, crates.container());
        // Host itself is untouched.
        assert_eq!(hosts.is_checked_out(&host), Some(true));
    }

    /// Observers fire once per fill.
    #[test]
    fn fill_observers() {
        let (pool, factory) = make_pool(
            PoolConfig::new("sparks").with_initial_count(2),
            TestNode::new("Spark"),
            BatchMode::Manual,
        );
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        pool.on_filled(move |event| {
            assert_eq!(event.pool, "sparks");
            assert_eq!(event.instances, 2);
            counter.fetch_add(1, Ordering::SeqCst);
        });
        pool.initialise(&root());
        assert!(!pool.poll_fill());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        factory.land_next();
        assert!(pool.poll_fill());
        assert!(!pool.poll_fill());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    /// Repeated initialisation is ignored.
    #[test]
    fn initialise_twice() {
        let (pool, factory) = sync_pool(2, false);
        pool.initialise(&root());
        assert_eq!(factory.containers().len(), 1);
        assert_eq!(pool.len(), 2);
    }

    /// Clearing forgets everything and allows a fresh session.
    #[test]
    fn clear_and_reinitialise() {
        let (pool, factory) = make_pool(
            PoolConfig::new("sparks").with_initial_count(2),
            TestNode::new("Spark"),
            BatchMode::Manual,
        );
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        pool.on_filled(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        pool.initialise(&root());
        factory.land_next();
        pool.poll_fill();
        let old = pool.acquire().unwrap();

        pool.clear();
        assert_eq!(pool.state(), PoolState::default());
        assert_eq!(pool.is_checked_out(&old), None);
        assert!(!pool.release(&old));

        pool.initialise(&root());
        // In-flight batch is dropped by clear.
        pool.clear();
        assert!(!factory.land_next());
        assert!(!pool.poll_fill());

        pool.initialise(&root());
        factory.land_next();
        assert!(pool.poll_fill());
        assert_eq!(pool.len(), 2);
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    /// Messages of WARN events emitted by this crate.
    #[derive(Clone, Default)]
    struct Warnings(Arc<Mutex<Vec<String>>>);

    impl<S: Subscriber> Layer<S> for Warnings {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let meta = event.metadata();
            if *meta.level() == Level::WARN && meta.target().starts_with("stockpile_pool") {
                let mut message = Message::default();
                event.record(&mut message);
                self.0.lock().push(message.0);
            }
        }
    }

    #[derive(Default)]
    struct Message(String);

    impl Visit for Message {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{value:?}");
            }
        }
    }

    /// Run `f` with a subscriber collecting warnings on this thread.
    fn capture_warnings(f: impl FnOnce()) -> Vec<String> {
        let warnings = Warnings::default();
        let subscriber = tracing_subscriber::registry().with(warnings.clone());
        tracing::subscriber::with_default(subscriber, f);
        let messages = warnings.0.lock().clone();
        messages
    }

    /// Run `f` on another thread, failing instead of hanging if it deadlocks.
    fn within_deadline<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(f());
        });
        rx.recv_timeout(Duration::from_secs(5))
            .expect("pool operation deadlocked")
    }

    /// Member recording the pool size visible when it gets linked.
    #[derive(Default)]
    struct PeekingMember {
        seen: Mutex<Option<usize>>,
    }

    impl NestedPoolable<TestNode> for PeekingMember {
        fn set_owning_pool(&self, link: PoolLink<TestNode>) {
            *self.seen.lock() = link.pool().map(|pool| pool.len());
        }

        fn update_display_index(&self, _index: usize) {}

        fn return_self_to_pool(&self) {}
    }

    /// Factory whose members and batches look back into their pool.
    #[derive(Default)]
    struct PeekingFactory {
        pool: Mutex<Weak<ResourcePool<TestNode>>>,
        members: Mutex<Vec<Arc<PeekingMember>>>,
        batch_saw: Arc<Mutex<Option<usize>>>,
        clear_from_batch: AtomicBool,
    }

    impl PeekingFactory {
        fn seen(&self) -> Vec<Option<usize>> {
            self.members
                .lock()
                .iter()
                .map(|member| *member.seen.lock())
                .collect()
        }
    }

    impl ResourceFactory<TestNode> for PeekingFactory {
        fn create_container(&self, name: &str, owner: &TestScope) -> TestScope {
            owner.child(name)
        }

        fn instantiate(&self, template: &TestNode, parent: Option<&TestScope>) -> TestNode {
            let mut node = TestNode::new(template.name.clone());
            node.active = template.active;
            node.parent = parent.cloned();
            let member = Arc::new(PeekingMember::default());
            self.members.lock().push(Arc::clone(&member));
            node.attach(member);
            node
        }

        fn instantiate_batch(
            &self,
            template: &TestNode,
            count: usize,
            parent: &TestScope,
        ) -> PendingBatch<TestNode> {
            let nodes: Vec<_> = (0..count)
                .map(|_| self.instantiate(template, Some(parent)))
                .collect();
            let pool = self.pool.lock().clone();
            let saw = Arc::clone(&self.batch_saw);
            let clear = self.clear_from_batch.load(Ordering::SeqCst);
            PendingBatch::from_future(count, async move {
                let pool = pool.upgrade();
                *saw.lock() = pool.as_ref().map(|pool| pool.len());
                if let Some(pool) = pool.filter(|_| clear) {
                    pool.clear();
                }
                BatchCompletion::done(nodes)
            })
        }
    }

    fn peeking_pool(fill: FillStrategy) -> (Arc<ResourcePool<TestNode>>, Arc<PeekingFactory>) {
        let factory = Arc::new(PeekingFactory::default());
        let pool = ResourcePool::new(
            PoolConfig::new("crates")
                .with_initial_count(3)
                .with_expandable(true)
                .with_fill(fill),
            TestNode::new("Crate"),
            factory.clone(),
        );
        *factory.pool.lock() = Arc::downgrade(&pool);
        (pool, factory)
    }

    /// Nested members may read their pool while being linked.
    #[test]
    fn nested_member_reads_pool() {
        let (pool, factory) = peeking_pool(FillStrategy::Synchronous);
        let worker = Arc::clone(&pool);
        within_deadline(move || worker.initialise(&root()));
        assert_eq!(factory.seen(), vec![Some(3); 3]);

        let worker = Arc::clone(&pool);
        within_deadline(move || worker.expand(true, false));
        assert_eq!(factory.seen().last(), Some(&Some(4)));

        pool.clear();
        let worker = Arc::clone(&pool);
        within_deadline(move || worker.acquire().map(|_| ())).unwrap();
        assert_eq!(factory.seen().last(), Some(&Some(1)));
    }

    /// Deferred batches may read their pool while being polled.
    #[test]
    fn batch_reads_pool() {
        let (pool, factory) = peeking_pool(FillStrategy::Asynchronous);
        pool.initialise(&root());
        assert!(pool.is_filling());
        let worker = Arc::clone(&pool);
        assert!(within_deadline(move || worker.poll_fill()));
        assert_eq!(*factory.batch_saw.lock(), Some(0));
        assert!(pool.is_initialised());
        assert_eq!(pool.len(), 3);
        assert_eq!(factory.seen(), vec![Some(3); 3]);
    }

    /// Awaited deferred batches may read their pool too.
    #[test]
    fn batch_reads_pool_awaited() {
        let (pool, factory) = peeking_pool(FillStrategy::Asynchronous);
        pool.initialise(&root());
        let worker = Arc::clone(&pool);
        assert!(within_deadline(move || block_on(worker.wait_filled())));
        assert_eq!(*factory.batch_saw.lock(), Some(0));
        assert_eq!(pool.len(), 3);
    }

    /// A batch superseded by `clear` while being polled is discarded.
    #[test]
    fn batch_cleared_while_polled() {
        let (pool, factory) = peeking_pool(FillStrategy::Asynchronous);
        factory.clear_from_batch.store(true, Ordering::SeqCst);
        pool.initialise(&root());
        let worker = Arc::clone(&pool);
        assert!(!within_deadline(move || worker.poll_fill()));
        assert!(pool.is_empty());
        assert!(!pool.is_initialised());
        assert!(!pool.is_filling());
        assert_eq!(factory.seen(), vec![None; 3]);

        factory.clear_from_batch.store(false, Ordering::SeqCst);
        pool.initialise(&root());
        assert!(pool.poll_fill());
        assert_eq!(pool.len(), 3);
    }

    /// Fill observers may use the pool, including subscribing more observers.
    #[test]
    fn observer_reads_pool() {
        let (pool, factory) = make_pool(
            PoolConfig::new("sparks").with_initial_count(2),
            TestNode::new("Spark"),
            BatchMode::Manual,
        );
        let seen = Arc::new(AtomicUsize::new(0));
        let (weak, counter) = (Arc::downgrade(&pool), Arc::clone(&seen));
        pool.on_filled(move |_| {
            if let Some(pool) = weak.upgrade() {
                counter.store(pool.len(), Ordering::SeqCst);
                pool.on_filled(|_| {});
            }
        });
        pool.initialise(&root());
        factory.land_next();
        let worker = Arc::clone(&pool);
        assert!(within_deadline(move || worker.poll_fill()));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    /// Acquiring before initialisation is reported.
    #[test]
    fn warns_early_acquire() {
        let (pool, _) = make_pool(
            PoolConfig::new("sparks").with_initial_count(2),
            TestNode::new("Spark"),
            BatchMode::Immediate,
        );
        let warnings = capture_warnings(|| {
            drop(pool.acquire().unwrap());
        });
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("has not initialised yet"));
    }

    /// Zero initial count is reported and corrected.
    #[test]
    fn warns_zero_count() {
        let (pool, _) = make_pool(
            PoolConfig::new("sparks")
                .with_initial_count(0)
                .with_fill(FillStrategy::Synchronous),
            TestNode::new("Spark"),
            BatchMode::Immediate,
        );
        let warnings = capture_warnings(|| pool.initialise(&root()));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("initial count is 0"));
        assert_eq!(pool.len(), DEFAULT_INITIAL_COUNT);
    }

    /// Returning an instance of another pool is reported.
    #[test]
    fn warns_foreign_release() {
        let (pool, _) = sync_pool(1, false);
        let (other, _) = sync_pool(1, false);
        let foreign = other.acquire().unwrap();
        let warnings = capture_warnings(|| {
            assert!(!pool.release(&foreign));
        });
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("not tracked by this pool"));
    }
}
