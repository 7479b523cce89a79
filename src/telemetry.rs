use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

use crate::config::StockpileConfig;

/// Guard for logging subsystem
///
/// Unwritten logs will be flushed when dropping this object. This might help even in case of a
/// panic.
#[allow(dead_code)]
#[must_use = "dropping the guard stops background log writers"]
pub struct TelemetryGuard {
    /// Guards for [`tracing_appender::non_blocking::NonBlocking`]
    buf_guards: Vec<WorkerGuard>,
}

impl std::fmt::Debug for TelemetryGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryGuard")
            .field("writers", &self.buf_guards.len())
            .finish()
    }
}

/// Error type returned on telemetry initialization
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TelemetryError {
    /// Error while setting up logging
    #[error(transparent)]
    Logging(#[from] crate::logging::LoggingError),
    /// Global subscriber was already installed
    #[error("Unable to install global subscriber: {0}")]
    Install(#[from] TryInitError),
}

impl<C> StockpileConfig<C>
where
    C: Clone + std::fmt::Debug + PartialEq,
{
    /// Initialize logging subsystem
    ///
    /// Returns a guard that shouldn't be dropped as long as there is a need for logging.
    ///
    /// # Errors
    ///
    /// Returns `Err` if any log destination cannot be opened, or if a global subscriber was
    /// already installed.
    pub fn init_telemetry(&self) -> Result<TelemetryGuard, TelemetryError> {
        let (registry, buf_guards) = self.logging.make_registry()?;
        registry.try_init()?;
        Ok(TelemetryGuard { buf_guards })
    }
}
