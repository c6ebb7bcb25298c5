//! Single-slot, latest-wins hand-off between the loop and a consumer.
//!
//! The producer overwrites whatever the consumer has not picked up yet, so a slow consumer
//! sees fewer frames instead of older ones and nothing ever queues.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug)]
struct SlotState<T> {
    value: Mutex<Option<T>>,
    overwritten: AtomicU64,
}

#[derive(Debug)]
pub struct LatestSlot<T> {
    state: Arc<SlotState<T>>,
}

impl<T> Clone for LatestSlot<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LatestSlot<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(SlotState {
                value: Mutex::new(None),
                overwritten: AtomicU64::new(0),
            }),
        }
    }

    /// Stores `value`, returning true when an unread value was replaced.
    pub fn put(&self, value: T) -> bool {
        let previous = self
            .state
            .value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(value);
        if previous.is_some() {
            self.state.overwritten.fetch_add(1, Ordering::Relaxed);
        }
        previous.is_some()
    }

    pub fn take(&self) -> Option<T> {
        self.state
            .value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Runs `f` on the current value without consuming it.
    pub fn peek<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        let guard = self.state.value.lock().unwrap_or_else(PoisonError::into_inner);
        f(guard.as_ref())
    }

    /// Values replaced before anyone took them
    pub fn overwritten(&self) -> u64 {
        self.state.overwritten.load(Ordering::Relaxed)
    }
}
