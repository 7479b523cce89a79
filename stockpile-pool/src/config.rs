//! Pool configuration structures.

use serde::{Deserialize, Serialize};

/// Initial count substituted for a configured count of zero.
pub const DEFAULT_INITIAL_COUNT: usize = 5;

/// Strategy used to create the initial pool members.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum FillStrategy {
    /// Create all instances one by one while initialising.
    #[serde(alias = "sync", alias = "eager")]
    Synchronous,
    /// Request a single deferred batch from the factory and register it once it lands.
    #[default]
    #[serde(alias = "async", alias = "deferred")]
    Asynchronous,
}

/// Configuration of a single resource pool.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct PoolConfig {
    /// Pool name, used as a lookup key in registries.
    pub name: String,
    /// Number of instances to create on first fill.
    ///
    /// Zero is corrected to [`DEFAULT_INITIAL_COUNT`] when the pool is initialised.
    #[serde(default = "PoolConfig::default_initial_count")]
    pub initial_count: usize,
    /// Create new instances when every instance is checked out.
    #[serde(default)]
    pub expandable: bool,
    /// Strategy used for the initial fill.
    #[serde(default)]
    pub fill: FillStrategy,
}

impl PoolConfig {
    /// Create configuration with default values for a named pool.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            initial_count: Self::default_initial_count(),
            expandable: false,
            fill: FillStrategy::default(),
        }
    }

    /// Set number of instances to create on first fill.
    #[must_use]
    pub fn with_initial_count(mut self, initial_count: usize) -> Self {
        self.initial_count = initial_count;
        self
    }

    /// Allow or forbid on-demand expansion.
    #[must_use]
    pub fn with_expandable(mut self, expandable: bool) -> Self {
        self.expandable = expandable;
        self
    }

    /// Set initial fill strategy.
    #[must_use]
    pub fn with_fill(mut self, fill: FillStrategy) -> Self {
        self.fill = fill;
        self
    }

    /// Default value for [`Self::initial_count`].
    #[must_use]
    #[inline]
    fn default_initial_count() -> usize {
        DEFAULT_INITIAL_COUNT
    }
}
