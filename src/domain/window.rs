//! Fixed counting windows and per-window counter records.
//!
//! Windows are aligned to the Unix epoch: the window containing `now` starts at
//! `floor(now / length) * length`. Boundaries are a pure function of the
//! timestamp, so no timer or background task is needed to roll windows over.
//!
//! Fixed windows admit bursts of up to twice the ceiling across two adjacent
//! windows. That is the accepted price for O(1) state per key.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// A fixed window of a given length, identified by its index since the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    index: u64,
    length: Duration,
}

impl Window {
    /// The window of `length` that contains `now`.
    ///
    /// Timestamps before the Unix epoch fall into window 0. A zero length is
    /// treated as one nanosecond.
    pub fn containing(now: SystemTime, length: Duration) -> Self {
        let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        let length_nanos = length.as_nanos().max(1);
        let index = since_epoch.as_nanos() / length_nanos;

        Self {
            index: u64::try_from(index).unwrap_or(u64::MAX),
            length,
        }
    }

    /// Index of this window since the Unix epoch.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Length of this window.
    pub fn length(&self) -> Duration {
        self.length
    }

    /// Inclusive start of the window.
    pub fn start(&self) -> SystemTime {
        let nanos = self.length.as_nanos().saturating_mul(u128::from(self.index));
        UNIX_EPOCH + duration_from_nanos(nanos)
    }

    /// Exclusive end of the window (start of the next one).
    pub fn end(&self) -> SystemTime {
        self.start() + self.length
    }
}

/// Saturating conversion of a nanosecond count into a `Duration`.
fn duration_from_nanos(nanos: u128) -> Duration {
    let secs = u64::try_from(nanos / NANOS_PER_SEC).unwrap_or(u64::MAX);
    // Always < 1e9, fits in u32
    let subsec = (nanos % NANOS_PER_SEC) as u32;
    Duration::new(secs, subsec)
}

/// Occurrence count of one key within one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterRecord {
    window: Window,
    count: u64,
}

impl CounterRecord {
    /// Start a record for the window containing `now`, with no occurrences.
    pub fn new(now: SystemTime, length: Duration) -> Self {
        Self {
            window: Window::containing(now, length),
            count: 0,
        }
    }

    /// Register one occurrence at `now` and return the resulting reading.
    ///
    /// If `now` falls into any window other than the stored one, earlier or
    /// later, the record restarts at 1 in the window containing `now`.
    pub fn increment(&mut self, now: SystemTime, length: Duration) -> CounterReading {
        let current = Window::containing(now, length);

        if current != self.window {
            self.window = current;
            self.count = 0;
        }

        self.count = self.count.saturating_add(1);
        self.reading()
    }

    /// Current reading without incrementing.
    pub fn reading(&self) -> CounterReading {
        CounterReading {
            count: self.count,
            window_start: self.window.start(),
        }
    }

    /// The window this record counts.
    pub fn window(&self) -> Window {
        self.window
    }

    /// Occurrences counted in the window.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Check if the record's window has ended at `now`.
    pub fn is_expired(&self, now: SystemTime) -> bool {
        now >= self.window.end()
    }
}

/// Result of an atomic increment: post-increment count and its window start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterReading {
    /// Occurrences in the window, including the one just recorded
    pub count: u64,
    /// Start of the window the count belongs to
    pub window_start: SystemTime,
}
