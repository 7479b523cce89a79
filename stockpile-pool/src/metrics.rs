use std::{
    borrow::Cow,
    sync::{Arc, LazyLock},
};

use opentelemetry::{
    global,
    metrics::{Gauge, Histogram},
    Key, KeyValue, StringValue, Value,
};

/// Central metrics singleton for pool metrics.
pub(crate) static POOL_METRICS: LazyLock<Arc<Metrics>> = LazyLock::new(|| Arc::new(Metrics::new()));

const KEY_POOL_NAME: Key = Key::from_static_str("stockpile.pool.name");
const KEY_STATE: Key = Key::from_static_str("stockpile.pool.state");

/// Storage for pool metrics.
pub(crate) struct Metrics {
    /// The number of instances that are currently in state described by the state attribute.
    pub(crate) size: Gauge<u64>,
    /// The number of instances requested by the initial fill.
    pub(crate) initial: Gauge<u64>,
    /// The time it took to obtain an instance from the pool.
    pub(crate) acquire_time: Histogram<f64>,
    /// The time between checking an instance out and returning it to the pool.
    pub(crate) use_time: Histogram<f64>,
}

impl Metrics {
    /// Create new storage for pool metrics.
    ///
    /// You probably don't need this, as all pools use a central metrics singleton for storage.
    pub(crate) fn new() -> Self {
        let meter = global::meter("stockpile");
        // stockpile.pool.name (string)
        // stockpile.pool.state (total / idle / used)
        let size = meter
            .u64_gauge("stockpile.pool.size")
            .with_description(
                "The number of instances that are currently in state described by the state attribute.",
            )
            .build();
        // stockpile.pool.name (string)
        let initial = meter
            .u64_gauge("stockpile.pool.initial")
            .with_description("The number of instances requested by the initial fill.")
            .build();
        // stockpile.pool.name (string)
        let acquire_time = meter
            .f64_histogram("stockpile.pool.acquire.duration")
            .with_unit("s")
            .with_description("The time it took to obtain an instance from the pool.")
            .build();
        // stockpile.pool.name (string)
        let use_time = meter
            .f64_histogram("stockpile.pool.use.duration")
            .with_unit("s")
            .with_description(
                "The time between checking an instance out and returning it to the pool.",
            )
            .build();
        Metrics {
            size,
            initial,
            acquire_time,
            use_time,
        }
    }

    pub(crate) fn record_state(&self, label: &[KeyValue], state: &PoolState) {
        let total_label = status_kv(label[0].clone(), "total");
        self.size.record(state.size as u64, &total_label);
        let idle_label = status_kv(label[0].clone(), "idle");
        self.size.record(state.idle as u64, &idle_label);
        let used_label = status_kv(label[0].clone(), "used");
        self.size.record(state.in_use as u64, &used_label);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Metrics::new()
    }
}

pub(crate) fn pool_kv(name: impl Into<Cow<'static, str>>) -> [KeyValue; 1] {
    [KeyValue::new(KEY_POOL_NAME, name.into())]
}

pub(crate) fn status_kv(name: KeyValue, status: &'static str) -> [KeyValue; 2] {
    [
        name,
        KeyValue::new(KEY_STATE, Value::String(StringValue::from(status))),
    ]
}

/// Snapshot of pool bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolState {
    /// Total (`idle` + `in_use`) number of instances in the pool.
    pub size: usize,
    /// Number of instances not checked out.
    pub idle: usize,
    /// Number of instances checked out.
    pub in_use: usize,
    /// Whether the initial fill has landed.
    pub initialised: bool,
    /// Whether an asynchronous fill is in flight.
    pub filling: bool,
}
