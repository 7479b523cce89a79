//! Service configuration structures.

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use stockpile_pool::PoolConfig;
use thiserror::Error;

use crate::logging::LoggingConfig;

/// Root container for pool service configuration.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[non_exhaustive]
pub struct StockpileConfig<C = ()>
where
    C: Clone + std::fmt::Debug + PartialEq,
{
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Pool registry configuration.
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Application-specific configuration.
    #[serde(flatten)]
    pub service: C,
}

impl<C> StockpileConfig<C>
where
    C: Clone + std::fmt::Debug + PartialEq,
{
    /// Start loading configuration from files, environment and custom sources.
    pub fn builder() -> StockpileConfigBuilder<C> {
        StockpileConfigBuilder::new()
    }
}

/// Configuration of all pools owned by a registry.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[non_exhaustive]
pub struct RegistryConfig {
    /// Pools in registration order.
    ///
    /// Order matters when names collide: the first pool wins name lookups.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pools: Vec<PoolConfig>,
}

impl RegistryConfig {
    /// Add a pool configuration.
    #[must_use]
    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pools.push(pool);
        self
    }
}

/// Error loading [`StockpileConfig`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StockpileConfigError {
    /// Source could not be read, or its contents do not match the expected shape.
    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

/// Layered configuration loader.
///
/// Sources added later override values from earlier ones.
#[must_use]
pub struct StockpileConfigBuilder<C>
where
    C: Clone + std::fmt::Debug + PartialEq,
{
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    _type: PhantomData<C>,
}

impl<C> StockpileConfigBuilder<C>
where
    C: Clone + std::fmt::Debug + PartialEq,
{
    /// Loader with no sources.
    pub fn new() -> Self {
        Self {
            builder: config::Config::builder(),
            _type: PhantomData,
        }
    }
}

impl<C> Default for StockpileConfigBuilder<C>
where
    C: Clone + std::fmt::Debug + PartialEq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<C> StockpileConfigBuilder<C>
where
    C: Clone + std::fmt::Debug + PartialEq + for<'de> Deserialize<'de>,
{
    /// Read every source and merge them into a configuration object.
    ///
    /// A fresh object is returned on every call; nothing is cached between sessions.
    ///
    /// # Errors
    ///
    /// Returns `Err` if some configuration loading was unsuccessful.
    pub fn build(self) -> Result<StockpileConfig<C>, StockpileConfigError> {
        self.builder.build()?.try_deserialize().map_err(Into::into)
    }

    /// Add a custom [`config::Source`], such as an in-memory YAML document.
    pub fn with_source<T>(mut self, source: T) -> Self
    where
        T: config::Source + Send + Sync + 'static,
    {
        self.builder = self.builder.add_source(source);
        self
    }

    /// Add a file, its format is guessed from the extension.
    pub fn with_file(self, name: impl AsRef<str>) -> Self {
        self.with_source(config::File::with_name(name.as_ref()))
    }

    /// Add environment variables starting with `prefix` and a double underscore.
    ///
    /// Nested keys are separated by single underscores, e.g. `GAME__LOGGING_...`.
    pub fn with_env(self, prefix: impl AsRef<str>) -> Self {
        self.with_source(
            config::Environment::with_prefix(prefix.as_ref())
                .separator("_")
                .prefix_separator("__"),
        )
    }
}
