//! Log output configuration built on [`tracing_subscriber`].
//!
//! Pools report every recoverable anomaly as a `WARN` event under the `stockpile_pool` and
//! `stockpile` targets, so even a minimal configuration surfaces them.

use std::{collections::BTreeMap, fs, io, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_appender::{
    non_blocking::{NonBlockingBuilder, WorkerGuard},
    rolling::{InitError, RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    fmt::{self, writer::BoxMakeWriter},
    layer::{Layer, Layered, SubscriberExt},
    registry::{LookupSpan, Registry},
};

/// Target used by pool diagnostics.
const POOL_TARGET: &str = "stockpile_pool";

pub(crate) type LoggingRegistry = Layered<Vec<BoxedLayer<Registry>>, Registry>;

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

/// Error type used in logging configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoggingError {
    /// Log file could not be opened.
    #[error("Unable to open log file: {0}")]
    Io(#[from] io::Error),
    /// Rolling log directory could not be prepared.
    #[error("Unable to prepare log directory: {0}")]
    Directory(#[from] InitError),
}

/// Logging configuration.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[non_exhaustive]
pub struct LoggingConfig {
    /// Independent outputs, each with its own format and filtering.
    #[serde(default = "LoggingConfig::default_subscribers")]
    pub subscribers: Vec<LoggingSubscriberConfig>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            subscribers: Self::default_subscribers(),
        }
    }
}

impl LoggingConfig {
    /// Default value for [`Self::subscribers`].
    #[must_use]
    #[inline]
    fn default_subscribers() -> Vec<LoggingSubscriberConfig> {
        vec![LoggingSubscriberConfig::default()]
    }

    /// Build a subscriber registry with one layer per configured output.
    ///
    /// Background writer guards are returned alongside and must outlive logging.
    ///
    /// # Errors
    ///
    /// Returns `Err` if any output cannot be opened.
    pub(crate) fn make_registry(
        &self,
    ) -> Result<(LoggingRegistry, Vec<WorkerGuard>), LoggingError> {
        let mut layers = Vec::with_capacity(self.subscribers.len());
        let mut guards = Vec::with_capacity(self.subscribers.len());
        for sub_cfg in &self.subscribers {
            let (layer, guard) = sub_cfg.make_layer()?;
            layers.push(layer);
            guards.push(guard);
        }
        Ok((Registry::default().with(layers), guards))
    }
}

/// Configuration of a single log output.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[non_exhaustive]
pub struct LoggingSubscriberConfig {
    /// Line format.
    #[serde(default, flatten)]
    pub format: LoggingFormat,
    /// Minimum severity written by default.
    #[serde(default)]
    pub level: LoggingLevel,
    /// Minimum severity of pool diagnostics, overriding [`Self::level`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_level: Option<LoggingLevel>,
    /// Minimum severity per event target, overriding both of the above.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub targets: BTreeMap<String, LoggingLevel>,
    /// Colorize output with ANSI escape sequences.
    #[serde(default)]
    pub color: bool,
    /// Event metadata to print.
    #[serde(default)]
    pub print: LoggingPrintingConfig,
    /// Background writer buffer.
    #[serde(default)]
    pub buffer: LoggingBufferConfig,
    /// Where lines are written.
    #[serde(default)]
    pub output: LoggingDestination,
}

impl LoggingSubscriberConfig {
    /// Verbose, colorized output suitable for a development session.
    #[must_use]
    pub fn default_for_dev() -> Self {
        Self {
            format: LoggingFormat::Pretty,
            level: LoggingLevel::Debug,
            pool_level: Some(LoggingLevel::Trace),
            color: true,
            print: LoggingPrintingConfig {
                target: true,
                source: true,
                thread: true,
            },
            ..Self::default()
        }
    }

    /// Filter applied to this output.
    fn filter(&self) -> Targets {
        let mut filter = Targets::new().with_default(LevelFilter::from(self.level));
        if let Some(pool_level) = self.pool_level {
            filter = filter.with_target(POOL_TARGET, LevelFilter::from(pool_level));
        }
        filter.with_targets(self.targets.clone())
    }

    /// Make a [`tracing_subscriber::Layer`] writing to the configured output.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the output cannot be opened.
    pub fn make_layer<S>(&self) -> Result<(BoxedLayer<S>, WorkerGuard), LoggingError>
    where
        S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    {
        let (writer, guard) = self.output.make_writer(self.buffer.make_builder())?;
        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(self.color)
            .with_target(self.print.target)
            .with_file(self.print.source)
            .with_line_number(self.print.source)
            .with_thread_names(self.print.thread);
        let layer = match self.format {
            LoggingFormat::Full => layer.boxed(),
            LoggingFormat::Compact => layer.compact().boxed(),
            LoggingFormat::Pretty => layer.pretty().boxed(),
            LoggingFormat::Json {
                flatten_metadata,
                current_span,
                span_list,
            } => layer
                .json()
                .flatten_event(flatten_metadata)
                .with_current_span(current_span)
                .with_span_list(span_list)
                .boxed(),
        };
        Ok((layer.with_filter(self.filter()).boxed(), guard))
    }
}

/// Line format.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[non_exhaustive]
#[serde(rename_all = "lowercase", tag = "format")]
pub enum LoggingFormat {
    /// Span context followed by the message.
    #[default]
    Full,
    /// Message only, span names hidden.
    Compact,
    /// Multiline human-friendly output.
    Pretty,
    /// Newline-delimited JSON objects.
    Json {
        /// Put event fields at the top level of the object.
        #[serde(default)]
        flatten_metadata: bool,
        /// Include the innermost span, e.g. `pool_acquire`.
        #[serde(default)]
        current_span: bool,
        /// Include every entered span.
        #[serde(default)]
        span_list: bool,
    },
}

/// Minimum event severity.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoggingLevel {
    /// Nothing is written.
    #[serde(alias = "off")]
    Off,
    /// Errors only.
    #[serde(alias = "error")]
    Error,
    /// Warnings, including every recoverable pool anomaly.
    #[serde(alias = "warn", alias = "warning")]
    Warn,
    /// Lifecycle events such as fills landing and registries initialising.
    #[serde(alias = "info")]
    #[default]
    Info,
    /// Expansions, deferred batch requests and bulk returns.
    #[serde(alias = "debug")]
    Debug,
    /// Everything.
    #[serde(alias = "trace")]
    Trace,
}

impl From<LoggingLevel> for LevelFilter {
    fn from(value: LoggingLevel) -> Self {
        match value {
            LoggingLevel::Off => LevelFilter::OFF,
            LoggingLevel::Error => LevelFilter::ERROR,
            LoggingLevel::Warn => LevelFilter::WARN,
            LoggingLevel::Info => LevelFilter::INFO,
            LoggingLevel::Debug => LevelFilter::DEBUG,
            LoggingLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Event metadata to print.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct LoggingPrintingConfig {
    /// Event target, e.g. `stockpile_pool::pool`.
    #[serde(default)]
    pub target: bool,
    /// Source file and line.
    #[serde(default)]
    pub source: bool,
    /// Name of the emitting thread.
    #[serde(default)]
    pub thread: bool,
}

/// Background writer buffer.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct LoggingBufferConfig {
    /// Lines kept in memory before the writer catches up.
    #[serde(default = "LoggingBufferConfig::default_lines")]
    pub lines: usize,
    /// Drop lines on overflow instead of stalling the caller.
    ///
    /// Stalling would stall whatever tick is acquiring from a pool.
    #[serde(default = "crate::util::default_true")]
    pub lossy: bool,
}

impl Default for LoggingBufferConfig {
    fn default() -> Self {
        Self {
            lines: Self::default_lines(),
            lossy: true,
        }
    }
}

impl LoggingBufferConfig {
    /// Default value for [`Self::lines`].
    #[must_use]
    #[inline]
    fn default_lines() -> usize {
        64_000
    }

    /// Builder for the non-blocking writer.
    #[must_use]
    pub fn make_builder(&self) -> NonBlockingBuilder {
        NonBlockingBuilder::default()
            .buffered_lines_limit(self.lines)
            .lossy(self.lossy)
            .thread_name("stockpile-log")
    }
}

/// Where log lines are written.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[non_exhaustive]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum LoggingDestination {
    /// Standard output.
    #[default]
    StdOut,
    /// Standard error.
    StdErr,
    /// Single file, appended to.
    File {
        /// Path to the file.
        path: PathBuf,
    },
    /// Rolling files in a directory.
    #[serde(alias = "dir")]
    Directory(LoggingDirectoryConfig),
}

impl LoggingDestination {
    /// Open the destination behind a non-blocking writer.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a file or directory cannot be opened.
    pub fn make_writer(
        &self,
        buffer: NonBlockingBuilder,
    ) -> Result<(BoxMakeWriter, WorkerGuard), LoggingError> {
        let (writer, guard) = match self {
            Self::StdOut => buffer.finish(io::stdout()),
            Self::StdErr => buffer.finish(io::stderr()),
            Self::File { path } => buffer.finish(
                fs::OpenOptions::new()
                    .append(true)
                    .create(true)
                    .open(path)?,
            ),
            Self::Directory(dir_cfg) => buffer.finish(dir_cfg.make_appender()?),
        };
        Ok((BoxMakeWriter::new(writer), guard))
    }
}

/// Rolling files in a directory.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct LoggingDirectoryConfig {
    /// Directory path.
    pub path: PathBuf,
    /// How often to start a new file.
    #[serde(default)]
    pub rotate: LogRotation,
    /// File name prefix.
    #[serde(default = "LoggingDirectoryConfig::default_prefix")]
    pub prefix: String,
    /// Number of files to keep, all if unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep: Option<usize>,
}

impl LoggingDirectoryConfig {
    /// Default value for [`Self::prefix`].
    #[must_use]
    #[inline]
    fn default_prefix() -> String {
        "stockpile".into()
    }

    fn make_appender(&self) -> Result<RollingFileAppender, InitError> {
        let mut builder = RollingFileAppender::builder()
            .rotation(self.rotate.into())
            .filename_prefix(self.prefix.as_str())
            .filename_suffix("log");
        if let Some(keep) = self.keep {
            builder = builder.max_log_files(keep);
        }
        builder.build(&self.path)
    }
}

/// How often to start a new log file.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[non_exhaustive]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    /// Every hour.
    Hourly,
    /// Every day.
    #[default]
    Daily,
    /// Never, a single file grows forever.
    Never,
}

impl From<LogRotation> for Rotation {
    fn from(value: LogRotation) -> Self {
        match value {
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}
