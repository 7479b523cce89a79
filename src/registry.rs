//! Named collection of resource pools.

use std::{collections::HashMap, fmt, sync::Arc};

use stockpile_pool::{PoolConfig, Poolable, ResourceFactory, ResourcePool};
use tracing::{debug, debug_span, info, warn};

use crate::config::RegistryConfig;

/// Collection of pools owned by a single runtime session.
///
/// Pools are looked up by name once [`Self::initialise_all`] has run. When several pools share a
/// name, the first registered one wins; the others are still initialised and swept by bulk
/// operations, but are only reachable through [`Self::pools`].
pub struct PoolRegistry<R: Poolable> {
    /// All pools, in registration order.
    pools: Vec<Arc<ResourcePool<R>>>,
    /// Name index.
    by_name: HashMap<String, Arc<ResourcePool<R>>>,
}

impl<R: Poolable> PoolRegistry<R> {
    /// Create builder for a registry.
    #[must_use]
    pub fn builder() -> RegistryBuilder<R> {
        RegistryBuilder::new()
    }

    /// Create registry holding the given pools, in order.
    #[must_use]
    pub fn new(pools: Vec<Arc<ResourcePool<R>>>) -> Self {
        Self {
            by_name: HashMap::with_capacity(pools.len()),
            pools,
        }
    }

    /// Initialise every pool under `owner` and index pools by name.
    pub fn initialise_all(&mut self, owner: &R::Scope) {
        let _span = debug_span!("registry_initialise", pools = self.pools.len()).entered();
        for pool in &self.pools {
            pool.initialise(owner);
            match self.by_name.get(pool.name()) {
                Some(existing) if Arc::ptr_eq(existing, pool) => {}
                Some(existing) => {
                    warn!(
                        pool = pool.name(),
                        kept = existing.template_name(),
                        dropped = pool.template_name(),
                        "duplicate pool name, later pool is not reachable by name"
                    );
                }
                None => {
                    self.by_name.insert(pool.name().to_owned(), Arc::clone(pool));
                }
            }
        }
        info!(
            pools = self.pools.len(),
            named = self.by_name.len(),
            "pool registry initialised"
        );
    }

    /// Look a pool up by name.
    ///
    /// A miss is logged and returned as `None`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<ResourcePool<R>>> {
        let pool = self.by_name.get(name).cloned();
        if pool.is_none() {
            warn!(pool = name, "pool not found, check pool names in configuration");
        }
        pool
    }

    /// Look several pools up by name, preserving order and skipping misses.
    #[must_use]
    pub fn get_many<I, S>(&self, names: I) -> Vec<Arc<ResourcePool<R>>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|name| self.get(name.as_ref()))
            .collect()
    }

    /// Return instances to every pool, optionally only those tagged with `filter`.
    ///
    /// Pools sharing a name are swept too. Returns the total number of instances processed.
    pub fn release_all(&self, filter: Option<&R::Tag>) -> usize {
        self.pools.iter().map(|pool| pool.release_all(filter)).sum()
    }

    /// Land every asynchronous fill that is ready, without blocking.
    ///
    /// Returns the number of pools that became initialised.
    pub fn poll_fills(&self) -> usize {
        self.pools.iter().filter(|pool| pool.poll_fill()).count()
    }

    /// Wait for every in-flight asynchronous fill.
    ///
    /// Returns whether all pools are initialised afterwards.
    pub async fn wait_filled(&self) -> bool {
        futures::future::join_all(self.pools.iter().map(|pool| pool.wait_filled()))
            .await
            .into_iter()
            .all(|filled| filled)
    }

    /// Clear every pool, ending the current session.
    ///
    /// The name index is kept, so a subsequent [`Self::initialise_all`] starts a fresh session
    /// with the same lookups.
    pub fn reset_session(&self) {
        for pool in &self.pools {
            pool.clear();
        }
        debug!(pools = self.pools.len(), "session reset");
    }

    /// Whether every pool has finished its initial fill.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.pools.iter().all(|pool| pool.is_initialised())
    }

    /// All pools, in registration order, name collisions included.
    #[must_use]
    pub fn pools(&self) -> &[Arc<ResourcePool<R>>] {
        &self.pools
    }

    /// Names reachable through [`Self::get`].
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of pools, name collisions included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Whether the registry holds no pools.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

impl<R: Poolable> fmt::Debug for PoolRegistry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolRegistry")
            .field("pools", &self.pools)
            .finish_non_exhaustive()
    }
}

/// Builder for [`PoolRegistry`].
#[must_use]
pub struct RegistryBuilder<R: Poolable> {
    pools: Vec<Arc<ResourcePool<R>>>,
}

impl<R: Poolable> Default for RegistryBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Poolable> RegistryBuilder<R> {
    /// Alternative method to construct a registry builder.
    pub fn new() -> Self {
        Self { pools: Vec::new() }
    }

    /// Add an already constructed pool.
    pub fn with_pool(mut self, pool: Arc<ResourcePool<R>>) -> Self {
        self.pools.push(pool);
        self
    }

    /// Construct and add a pool.
    pub fn with_config(
        self,
        config: PoolConfig,
        template: R,
        factory: Arc<dyn ResourceFactory<R>>,
    ) -> Self {
        self.with_pool(ResourcePool::new(config, template, factory))
    }

    /// Add pools described by configuration.
    ///
    /// Templates and factories are not part of configuration, so `resolve` supplies them for
    /// every configured pool. Pools it cannot resolve are logged and skipped.
    pub fn from_config<F>(mut self, config: &RegistryConfig, mut resolve: F) -> Self
    where
        F: FnMut(&PoolConfig) -> Option<(R, Arc<dyn ResourceFactory<R>>)>,
    {
        for pool_cfg in &config.pools {
            match resolve(pool_cfg) {
                Some((template, factory)) => {
                    self = self.with_config(pool_cfg.clone(), template, factory);
                }
                None => {
                    warn!(
                        pool = %pool_cfg.name,
                        "no template for configured pool, skipping"
                    );
                }
            }
        }
        self
    }

    /// Finish building the registry.
    ///
    /// Pools are not initialised yet, see [`PoolRegistry::initialise_all`].
    #[must_use]
    pub fn build(self) -> PoolRegistry<R> {
        PoolRegistry::new(self.pools)
    }
}

impl<R: Poolable> fmt::Debug for RegistryBuilder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("pools", &self.pools.len())
            .finish()
    }
}
