//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports.

use crate::domain::action::ActionType;
use crate::domain::subject::SubjectId;
use crate::domain::window::CounterReading;
use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Port for obtaining current time.
///
/// Wall-clock time is required because window boundaries are aligned to the
/// Unix epoch and must agree across processes sharing a store.
/// Infrastructure provides concrete implementations (SystemClock, MockClock).
pub trait Clock: Send + Sync + Debug {
    /// Get the current time.
    fn now(&self) -> SystemTime;
}

/// Identity of one counter: a subject performing one action.
///
/// The window is not part of the key; a store keeps one record per key and
/// replaces it when a later window begins.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterKey {
    /// Who is acting
    pub subject: SubjectId,
    /// What they are doing
    pub action: ActionType,
}

impl CounterKey {
    /// Create a counter key.
    pub fn new(subject: SubjectId, action: ActionType) -> Self {
        Self { subject, action }
    }
}

impl fmt::Display for CounterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.action, self.subject)
    }
}

/// Kind of counter store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// The store could not be reached or rejected the operation
    Unavailable,
    /// The store did not answer within its deadline
    Timeout,
}

/// Failure of a counter store operation.
///
/// Never a rate limit outcome: it means the throttling system itself could
/// not answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    kind: StoreErrorKind,
    message: String,
}

impl StoreError {
    /// The store is unreachable.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Unavailable,
            message: message.into(),
        }
    }

    /// The store did not answer in time.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: StoreErrorKind::Timeout,
            message: message.into(),
        }
    }

    /// What went wrong.
    pub fn kind(&self) -> StoreErrorKind {
        self.kind
    }

    /// Human-readable detail from the store.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            StoreErrorKind::Unavailable => write!(f, "counter store unavailable: {}", self.message),
            StoreErrorKind::Timeout => write!(f, "counter store timed out: {}", self.message),
        }
    }
}

impl std::error::Error for StoreError {}

/// Port for atomic, windowed occurrence counting.
///
/// # Contract
///
/// - `increment_and_get` is atomic per key: concurrent calls for the same key
///   never lose an increment, and each call observes a count that includes
///   its own increment and every increment ordered before it.
/// - Windows are fixed and aligned to the epoch (see
///   [`Window`](crate::domain::window::Window)). A call whose window differs
///   from the stored record's, earlier or later, starts a fresh record at 1
///   and reports the start of its own window.
/// - Calls for different keys must not block each other beyond the
///   implementation's internal sharding.
/// - Failures are reported, never retried.
pub trait CounterStore: Send + Sync + Debug {
    /// Record one occurrence for `key` at `now` and return the post-increment
    /// count together with the start of its window.
    ///
    /// # Errors
    /// Returns `StoreError` if the store is unreachable or times out.
    fn increment_and_get(
        &self,
        key: &CounterKey,
        window: Duration,
        now: SystemTime,
    ) -> Result<CounterReading, StoreError>;
}

impl<T> CounterStore for Arc<T>
where
    T: CounterStore + ?Sized,
{
    fn increment_and_get(
        &self,
        key: &CounterKey,
        window: Duration,
        now: SystemTime,
    ) -> Result<CounterReading, StoreError> {
        (**self).increment_and_get(key, window, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::unavailable("connection refused");
        assert_eq!(err.kind(), StoreErrorKind::Unavailable);
        assert_eq!(err.to_string(), "counter store unavailable: connection refused");

        let err = StoreError::timeout("50ms elapsed");
        assert_eq!(err.kind(), StoreErrorKind::Timeout);
        assert_eq!(err.message(), "50ms elapsed");
    }

    #[test]
    fn test_counter_key_display() {
        let key = CounterKey::new(SubjectId::new("u1"), ActionType::CREATE_POST);
        assert_eq!(key.to_string(), "create_post:u1");
    }
}
