//! Fill completion notifications.

use std::{fmt, sync::Arc};

use parking_lot::Mutex;

/// Notification that a pool finished its initial fill.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct FillEvent {
    /// Pool name.
    pub pool: String,
    /// Number of instances registered once the fill landed.
    pub instances: usize,
}

type Callback = Arc<dyn Fn(&FillEvent) + Send + Sync>;

/// List of callbacks interested in fill completion.
#[derive(Default)]
pub(crate) struct FillObservers {
    callbacks: Mutex<Vec<Callback>>,
}

impl FillObservers {
    pub(crate) fn subscribe(&self, callback: impl Fn(&FillEvent) + Send + Sync + 'static) {
        self.callbacks.lock().push(Arc::new(callback));
    }

    /// Invoke every callback registered so far.
    ///
    /// Must be called without holding the pool state lock. Callbacks run on a snapshot of the
    /// list, so they may subscribe further callbacks; those only see later events.
    pub(crate) fn notify(&self, event: &FillEvent) {
        let callbacks = self.callbacks.lock().clone();
        for callback in &callbacks {
            callback(event);
        }
    }
}

impl fmt::Debug for FillObservers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FillObservers")
            .field("callbacks", &self.callbacks.lock().len())
            .finish()
    }
}
