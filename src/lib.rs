#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![deny(elided_lifetimes_in_paths, unreachable_pub)]
#![warn(
    missing_docs,
    clippy::doc_link_with_quotes,
    clippy::doc_markdown,
    clippy::missing_errors_doc
)]

mod config;
mod logging;
pub mod prelude;
pub mod reexport;
mod registry;
mod telemetry;
mod util;

pub use stockpile_pool::{
    AcquireOptions, BatchCompletion, FillEvent, FillStrategy, NestedPoolable, PendingBatch,
    Placement, PoolConfig, PoolError, PoolLink, PoolMember, PoolState, Poolable, Pooled, Quat,
    ResourceFactory, ResourcePool, ReturnOptions, Space, Vec3, WeakPooled,
};

pub use self::{
    config::{RegistryConfig, StockpileConfig, StockpileConfigBuilder, StockpileConfigError},
    logging::{
        LogRotation, LoggingBufferConfig, LoggingConfig, LoggingDestination,
        LoggingDirectoryConfig, LoggingError, LoggingFormat, LoggingLevel, LoggingPrintingConfig,
        LoggingSubscriberConfig,
    },
    registry::{PoolRegistry, RegistryBuilder},
    telemetry::{TelemetryError, TelemetryGuard},
};
