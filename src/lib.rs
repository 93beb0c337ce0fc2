//! # action-throttle
//!
//! Admission control for user-initiated actions: posting, uploading, messaging.
//!
//! Every attempt by a subject to perform a throttled action is counted in a fixed
//! time window. The post-increment count is compared against the action's policy,
//! and the answer depends on how trusted the subject is:
//!
//! - **Allowed**: within the ceiling for the subject's verification tier
//! - **RequiresVerification**: an unverified subject went past its tier ceiling but
//!   is still within the verified ceiling; verifying identity lifts the limit
//! - **Exceeded**: past the verified ceiling, verification would not help
//!
//! When the counter store cannot answer, the engine reports `StoreUnavailable`
//! instead of guessing, and the caller denies the action unless it explicitly
//! opted that action into fail-open.
//!
//! ## Quick Start
//!
//! ```rust
//! use action_throttle::{ActionType, DecisionEngine, Outcome, Subject};
//!
//! // Built-in policies for create_reel, create_post and send_message
//! let engine = DecisionEngine::builder()
//!     .with_standard_policies()
//!     .build()
//!     .unwrap();
//!
//! let subject = Subject::unverified("user-42");
//! let decision = engine.check(&subject, &ActionType::CREATE_REEL).unwrap();
//! assert_eq!(decision.outcome(), Outcome::Allowed);
//! ```
//!
//! ## Policies
//!
//! | action | window | max | unverified max |
//! |---|---|---|---|
//! | `create_reel` | 1 hour | 5 | 2 |
//! | `create_post` | 30 min | 6 | 3 |
//! | `send_message` | 5 min | 40 | 15 |
//!
//! Actions without a policy are never throttled and never touch the store.
//!
//! Policies can also be loaded from TOML:
//!
//! ```rust
//! use action_throttle::PolicyRegistry;
//!
//! let registry = PolicyRegistry::from_toml_str(r#"
//!     [actions.create_post]
//!     window = "30m"
//!     max_count = 6
//!     unverified_max_count = 3
//! "#).unwrap();
//! assert_eq!(registry.len(), 1);
//! ```
//!
//! ## Windows
//!
//! Windows are fixed and aligned to the Unix epoch: a 30 minute window always
//! starts on the hour or the half hour. The count restarts at 1 with the first
//! attempt in a new window. Counts near a boundary can therefore reach up to
//! twice the ceiling across two adjacent windows.
//!
//! ## Caller Adapter
//!
//! [`AdmissionGate`] turns decisions into what a request handler acts on:
//!
//! ```rust
//! use action_throttle::{ActionType, Admission, AdmissionGate, DecisionEngine, Subject};
//!
//! let engine = DecisionEngine::builder()
//!     .with_standard_policies()
//!     .build()
//!     .unwrap();
//! let gate = AdmissionGate::new(engine).with_fail_open(ActionType::SEND_MESSAGE);
//!
//! match gate.admit(&Subject::verified("user-7"), &ActionType::CREATE_POST) {
//!     Admission::Proceed => { /* perform the action */ }
//!     Admission::VerifyIdentity => { /* offer verification */ }
//!     Admission::RetryLater { retry_after } => { /* reject, hint retry_after */ }
//!     Admission::Unavailable => { /* reject, throttling is down */ }
//! }
//! ```
//!
//! ## Distributed Counting
//!
//! With the `redis-storage` feature, [`RedisCounterStore`] shares counters
//! across instances using a single Lua `INCR` + `PEXPIRE` per request.
//!
//! ## Observability
//!
//! ```rust
//! # use action_throttle::DecisionEngine;
//! # let engine = DecisionEngine::builder().with_standard_policies().build().unwrap();
//! let snapshot = engine.metrics().snapshot();
//! println!("Denial rate: {:.2}%", snapshot.denial_rate() * 100.0);
//! println!("Store failures: {}", snapshot.store_failures);
//! ```
//!
//! Decisions are logged at `debug`, store failures at `warn`, via `tracing`.

// Domain layer - pure business logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    action::ActionType,
    decision::{Decision, Outcome, Usage},
    escalation::{Classification, EscalationClassifier},
    policy::{Policy, PolicyError},
    subject::{Subject, SubjectId, VerificationTier},
    window::{CounterReading, CounterRecord, Window},
};

pub use application::{
    circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState},
    config::{PolicyConfig, RegistryConfig},
    engine::{DecisionEngine, EvaluateError},
    gate::{Admission, AdmissionGate, FailurePosture},
    metrics::{Metrics, MetricsSnapshot},
    ports::{Clock, CounterKey, CounterStore, StoreError, StoreErrorKind},
    registry::{PolicyRegistry, RegistryError},
};

pub use infrastructure::{
    builder::{BuildError, EngineBuilder},
    clock::SystemClock,
    memory_store::MemoryCounterStore,
};

#[cfg(feature = "redis-storage")]
pub use infrastructure::redis_store::{RedisCounterStore, RedisCounterStoreConfig};
