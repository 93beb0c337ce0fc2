//! Counter store doubles.

use crate::application::ports::{CounterKey, CounterStore, StoreError, StoreErrorKind};
use crate::domain::window::CounterReading;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

/// Store that fails every call with a fixed error kind.
#[derive(Debug, Clone)]
pub struct FailingStore {
    kind: StoreErrorKind,
}

impl FailingStore {
    /// Fail every call as unreachable.
    pub fn unavailable() -> Self {
        Self {
            kind: StoreErrorKind::Unavailable,
        }
    }

    /// Fail every call as timed out.
    pub fn timeout() -> Self {
        Self {
            kind: StoreErrorKind::Timeout,
        }
    }
}

impl CounterStore for FailingStore {
    fn increment_and_get(
        &self,
        key: &CounterKey,
        _window: Duration,
        _now: SystemTime,
    ) -> Result<CounterReading, StoreError> {
        Err(match self.kind {
            StoreErrorKind::Unavailable => {
                StoreError::unavailable(format!("store down while incrementing {key}"))
            }
            StoreErrorKind::Timeout => {
                StoreError::timeout(format!("store timed out while incrementing {key}"))
            }
        })
    }
}

/// Store that panics on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanickingStore;

impl CounterStore for PanickingStore {
    fn increment_and_get(
        &self,
        key: &CounterKey,
        _window: Duration,
        _now: SystemTime,
    ) -> Result<CounterReading, StoreError> {
        panic!("counter store panicked on {key}");
    }
}

/// Wraps a store and counts calls reaching it.
#[derive(Debug)]
pub struct CountingStore<S> {
    inner: S,
    calls: AtomicUsize,
}

impl<S> CountingStore<S> {
    /// Wrap `inner`.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `increment_and_get` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Get a reference to the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: CounterStore> CounterStore for CountingStore<S> {
    fn increment_and_get(
        &self,
        key: &CounterKey,
        window: Duration,
        now: SystemTime,
    ) -> Result<CounterReading, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.increment_and_get(key, window, now)
    }
}
