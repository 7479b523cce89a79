//! Commonly imported types for use in applications.

pub use crate::{
    reexport::tracing, AcquireOptions, Placement, PoolConfig, PoolError, PoolRegistry, Poolable,
    Pooled, ResourceFactory, ResourcePool, ReturnOptions, Space, StockpileConfig,
};
