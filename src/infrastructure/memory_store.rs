//! In-process counter store.
//!
//! Backed by a sharded concurrent map. Each increment runs inside the map's
//! entry guard, so the read-modify-write of one key is indivisible while
//! other keys (in other shards) proceed in parallel.

use crate::application::ports::{CounterKey, CounterStore, StoreError};
use crate::domain::window::{CounterReading, CounterRecord};
use dashmap::DashMap;
use std::time::{Duration, SystemTime};

/// Thread-safe counter store for single-process deployments.
///
/// Holds one record per (subject, action); a record is replaced in place when
/// a call lands in a different window, so memory grows with the number of active keys, not
/// with traffic. Call [`purge_expired`](Self::purge_expired) periodically
/// (e.g. every [`PolicyRegistry::longest_window`]) to drop keys that have gone
/// quiet.
///
/// [`PolicyRegistry::longest_window`]: crate::application::registry::PolicyRegistry::longest_window
///
/// # Example
/// ```
/// use action_throttle::{ActionType, CounterKey, CounterStore, MemoryCounterStore, SubjectId};
/// use std::time::{Duration, SystemTime};
///
/// let store = MemoryCounterStore::new();
/// let key = CounterKey::new(SubjectId::new("alice"), ActionType::CREATE_POST);
/// let now = SystemTime::now();
///
/// let first = store.increment_and_get(&key, Duration::from_secs(60), now).unwrap();
/// let second = store.increment_and_get(&key, Duration::from_secs(60), now).unwrap();
/// assert_eq!((first.count, second.count), (1, 2));
/// ```
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    map: DashMap<CounterKey, CounterRecord>,
}

impl MemoryCounterStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
        }
    }

    /// Create an empty store with room for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: DashMap::with_capacity(capacity),
        }
    }

    /// Current reading for a key, without incrementing.
    pub fn peek(&self, key: &CounterKey) -> Option<CounterReading> {
        self.map.get(key).map(|record| record.reading())
    }

    /// Drop records whose window ended before `now`.
    ///
    /// Returns the number of records removed.
    pub fn purge_expired(&self, now: SystemTime) -> usize {
        let before = self.map.len();
        self.map.retain(|_, record| !record.is_expired(now));
        let removed = before.saturating_sub(self.map.len());
        if removed > 0 {
            tracing::debug!(removed, remaining = self.map.len(), "purged expired counters");
        }
        removed
    }

    /// Get the number of tracked keys.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Clear all records.
    pub fn clear(&self) {
        self.map.clear();
    }
}

impl CounterStore for MemoryCounterStore {
    fn increment_and_get(
        &self,
        key: &CounterKey,
        window: Duration,
        now: SystemTime,
    ) -> Result<CounterReading, StoreError> {
        let mut record = self
            .map
            .entry(key.clone())
            .or_insert_with(|| CounterRecord::new(now, window));
        Ok(record.increment(now, window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::action::ActionType;
    use crate::domain::subject::SubjectId;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::UNIX_EPOCH;

    const MINUTE: Duration = Duration::from_secs(60);

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn key(subject: &'static str) -> CounterKey {
        CounterKey::new(SubjectId::new(subject), ActionType::SEND_MESSAGE)
    }

    #[test]
    fn test_counts_increase_by_one() {
        let store = MemoryCounterStore::new();
        for expected in 1..=10 {
            let reading = store.increment_and_get(&key("a"), MINUTE, at(0)).unwrap();
            assert_eq!(reading.count, expected);
            assert_eq!(reading.window_start, at(0));
        }
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_rollover_at_window_boundary() {
        let store = MemoryCounterStore::new();
        for _ in 0..7 {
            store.increment_and_get(&key("a"), MINUTE, at(30)).unwrap();
        }

        let reading = store.increment_and_get(&key("a"), MINUTE, at(60)).unwrap();
        assert_eq!(reading.count, 1);
        assert_eq!(reading.window_start, at(60));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_earlier_window_call_starts_fresh() {
        let store = MemoryCounterStore::new();
        let first = store.increment_and_get(&key("a"), MINUTE, at(130)).unwrap();
        assert_eq!(first.count, 1);

        let skewed = store.increment_and_get(&key("a"), MINUTE, at(100)).unwrap();
        assert_eq!(skewed.count, 1);
        assert_eq!(skewed.window_start, at(60));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let store = MemoryCounterStore::new();
        store.increment_and_get(&key("a"), MINUTE, at(0)).unwrap();
        store.increment_and_get(&key("a"), MINUTE, at(0)).unwrap();

        let other_subject = store.increment_and_get(&key("b"), MINUTE, at(0)).unwrap();
        assert_eq!(other_subject.count, 1);

        let other_action = CounterKey::new(SubjectId::new("a"), ActionType::CREATE_POST);
        let reading = store.increment_and_get(&other_action, MINUTE, at(0)).unwrap();
        assert_eq!(reading.count, 1);
    }

    #[test]
    fn test_peek_does_not_increment() {
        let store = MemoryCounterStore::new();
        assert!(store.peek(&key("a")).is_none());

        store.increment_and_get(&key("a"), MINUTE, at(0)).unwrap();
        assert_eq!(store.peek(&key("a")).map(|r| r.count), Some(1));
        assert_eq!(store.peek(&key("a")).map(|r| r.count), Some(1));
    }

    #[test]
    fn test_purge_expired() {
        let store = MemoryCounterStore::new();
        store.increment_and_get(&key("old"), MINUTE, at(0)).unwrap();
        store.increment_and_get(&key("new"), MINUTE, at(60)).unwrap();

        assert_eq!(store.purge_expired(at(61)), 1);
        assert!(store.peek(&key("old")).is_none());
        assert!(store.peek(&key("new")).is_some());
    }

    #[test]
    fn test_clear() {
        let store = MemoryCounterStore::with_capacity(4);
        store.increment_and_get(&key("a"), MINUTE, at(0)).unwrap();
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_concurrent_increments_lose_nothing() {
        const THREADS: usize = 16;
        const PER_THREAD: u64 = 500;

        let store = Arc::new(MemoryCounterStore::new());
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let mut seen = Vec::with_capacity(PER_THREAD as usize);
                    for _ in 0..PER_THREAD {
                        let reading = store.increment_and_get(&key("hot"), MINUTE, at(0)).unwrap();
                        seen.push(reading.count);
                    }
                    seen
                })
            })
            .collect();

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();

        let total = THREADS as u64 * PER_THREAD;
        // Every count from 1 to N observed exactly once
        assert_eq!(all, (1..=total).collect::<Vec<_>>());
        assert_eq!(store.peek(&key("hot")).map(|r| r.count), Some(total));
    }
}
