//! Circuit breaker around the counter store.
//!
//! When the store keeps failing, calling it on every request only adds
//! latency before the same `StoreUnavailable` answer. After enough
//! consecutive failures the breaker opens and the admission gate stops
//! calling the engine, applying its failure posture directly. After the
//! recovery timeout a single probe request is let through; its result closes
//! or re-opens the circuit.
//!
//! Opening the circuit never changes what a failure means to the caller:
//! fail-closed actions stay denied, fail-open actions stay permitted.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant};

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Store calls proceed normally
    Closed = 0,
    /// Store calls are skipped and treated as failures
    Open = 1,
    /// One probe call is allowed to test recovery
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }
}

/// Configuration for circuit breaker behavior.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive store failures before the circuit opens
    pub failure_threshold: u32,
    /// How long the circuit stays open before probing
    pub recovery_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(10),
        }
    }
}

/// Tracks consecutive counter store failures.
#[derive(Debug)]
pub struct CircuitBreaker {
    state: AtomicU8,
    consecutive_failures: AtomicU64,
    opened_at_nanos: AtomicU64,
    probe_in_flight: AtomicBool,
    config: CircuitBreakerConfig,
    epoch: Instant,
}

impl CircuitBreaker {
    /// Create a breaker with default configuration.
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    /// Create a breaker with custom configuration.
    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            state: AtomicU8::new(CircuitState::Closed as u8),
            consecutive_failures: AtomicU64::new(0),
            opened_at_nanos: AtomicU64::new(0),
            probe_in_flight: AtomicBool::new(false),
            config,
            epoch: Instant::now(),
        }
    }

    /// Get the current circuit state.
    pub fn state(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::Acquire))
    }

    /// Check whether the store may be called now.
    ///
    /// Returns `false` while the circuit is open, and for every caller but
    /// one once the recovery timeout has elapsed.
    pub fn allow_request(&self) -> bool {
        match self.state() {
            CircuitState::Closed => true,
            CircuitState::Open => {
                if self.elapsed_since_open() < self.config.recovery_timeout {
                    return false;
                }
                let moved = self
                    .state
                    .compare_exchange(
                        CircuitState::Open as u8,
                        CircuitState::HalfOpen as u8,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    )
                    .is_ok();
                moved && self.claim_probe()
            }
            CircuitState::HalfOpen => self.claim_probe(),
        }
    }

    /// Record a store call that completed.
    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::Release);
        if self.state() != CircuitState::Closed {
            self.state.store(CircuitState::Closed as u8, Ordering::Release);
            self.probe_in_flight.store(false, Ordering::Release);
            tracing::info!("counter store recovered, circuit closed");
        }
    }

    /// Record a store call that failed.
    pub fn record_failure(&self) {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;

        match self.state() {
            CircuitState::HalfOpen => {
                self.open();
                self.probe_in_flight.store(false, Ordering::Release);
            }
            CircuitState::Closed if failures >= u64::from(self.config.failure_threshold) => {
                self.open();
                tracing::warn!(
                    failures,
                    recovery_timeout = ?self.config.recovery_timeout,
                    "counter store failing, circuit opened"
                );
            }
            _ => {}
        }
    }

    /// Get the number of consecutive failures.
    pub fn consecutive_failures(&self) -> u64 {
        self.consecutive_failures.load(Ordering::Acquire)
    }

    /// Reset the breaker to closed state.
    pub fn reset(&self) {
        self.state.store(CircuitState::Closed as u8, Ordering::Release);
        self.consecutive_failures.store(0, Ordering::Release);
        self.probe_in_flight.store(false, Ordering::Release);
    }

    fn open(&self) {
        let nanos = u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.opened_at_nanos.store(nanos, Ordering::Release);
        self.state.store(CircuitState::Open as u8, Ordering::Release);
    }

    fn elapsed_since_open(&self) -> Duration {
        let opened_at =
            self.epoch + Duration::from_nanos(self.opened_at_nanos.load(Ordering::Acquire));
        opened_at.elapsed()
    }

    fn claim_probe(&self) -> bool {
        self.probe_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}
