//! Centralized place to re-export dependency crates

pub use config;
pub use futures;
pub use stockpile_pool;
pub use tracing;
pub use tracing_subscriber;
