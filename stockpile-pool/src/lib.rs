#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![deny(elided_lifetimes_in_paths, unreachable_pub)]
#![warn(
    missing_docs,
    clippy::doc_link_with_quotes,
    clippy::doc_markdown,
    clippy::missing_errors_doc
)]

pub mod config;
pub mod error;
mod events;
pub mod factory;
mod metrics;
pub mod placement;
mod pool;
pub mod poolable;
mod resource;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use crate::{
    config::{FillStrategy, PoolConfig},
    error::PoolError,
    events::FillEvent,
    factory::{BatchCompletion, PendingBatch, ResourceFactory},
    metrics::PoolState,
    placement::{Placement, Quat, Space, Vec3},
    pool::{AcquireOptions, ResourcePool, ReturnOptions},
    poolable::{NestedPoolable, PoolLink, PoolMember, Poolable},
    resource::{Pooled, WeakPooled},
};
