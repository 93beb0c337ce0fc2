//! Caller-facing admission gate.
//!
//! Thin adapter between the engine and request handlers. It maps decisions
//! and store failures onto the four answers a handler acts on, applies the
//! per-action failure posture and computes retry-after hints. It produces no
//! user-facing text.

use crate::application::circuit_breaker::CircuitBreaker;
use crate::application::engine::{DecisionEngine, EvaluateError};
use crate::application::ports::CounterStore;
use crate::domain::action::ActionType;
use crate::domain::decision::{Decision, Outcome};
use crate::domain::subject::Subject;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// What to do when the counter store cannot answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePosture {
    /// Deny the action
    #[default]
    FailClosed,
    /// Let the action through unthrottled
    FailOpen,
}

/// The caller-visible answer for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The action may proceed
    Proceed,
    /// Offer identity verification before trying again
    VerifyIdentity,
    /// Throttled until the current window ends
    RetryLater {
        /// Time until the window ends, measured from the evaluation time
        retry_after: Duration,
    },
    /// The throttling system is down and the action fails closed
    Unavailable,
}

impl Admission {
    /// Map an engine decision, computing retry-after against `now`.
    pub fn from_decision(decision: &Decision, now: SystemTime) -> Self {
        match decision.outcome() {
            Outcome::Allowed => Admission::Proceed,
            Outcome::RequiresVerification => Admission::VerifyIdentity,
            Outcome::Exceeded => Admission::RetryLater {
                retry_after: decision
                    .usage()
                    .map_or(Duration::ZERO, |usage| usage.remaining(now)),
            },
        }
    }

    /// Answer for a store failure under a posture.
    pub fn on_failure(posture: FailurePosture) -> Self {
        match posture {
            FailurePosture::FailClosed => Admission::Unavailable,
            FailurePosture::FailOpen => Admission::Proceed,
        }
    }

    /// Check if the action may proceed.
    pub fn is_permitted(&self) -> bool {
        matches!(self, Admission::Proceed)
    }
}

/// Admission gate over a decision engine.
///
/// # Example
/// ```
/// use action_throttle::{ActionType, Admission, AdmissionGate, DecisionEngine, Subject};
///
/// let engine = DecisionEngine::builder()
///     .with_standard_policies()
///     .build()
///     .unwrap();
/// let gate = AdmissionGate::new(engine).with_fail_open(ActionType::SEND_MESSAGE);
///
/// let admission = gate.admit(&Subject::unverified("alice"), &ActionType::CREATE_REEL);
/// assert_eq!(admission, Admission::Proceed);
/// ```
#[derive(Debug, Clone)]
pub struct AdmissionGate<S>
where
    S: CounterStore,
{
    engine: DecisionEngine<S>,
    fail_open: HashSet<ActionType>,
    circuit_breaker: Option<Arc<CircuitBreaker>>,
}

impl<S> AdmissionGate<S>
where
    S: CounterStore,
{
    /// Create a gate where every action fails closed.
    pub fn new(engine: DecisionEngine<S>) -> Self {
        Self {
            engine,
            fail_open: HashSet::new(),
            circuit_breaker: None,
        }
    }

    /// Let `action` through when the store is down.
    ///
    /// Meant for low-stakes actions only.
    pub fn with_fail_open(mut self, action: ActionType) -> Self {
        self.fail_open.insert(action);
        self
    }

    /// Skip the store while it keeps failing.
    pub fn with_circuit_breaker(mut self, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        self.circuit_breaker = Some(circuit_breaker);
        self
    }

    /// The failure posture for an action.
    pub fn posture(&self, action: &ActionType) -> FailurePosture {
        if self.fail_open.contains(action) {
            FailurePosture::FailOpen
        } else {
            FailurePosture::FailClosed
        }
    }

    /// Admit a request at the engine clock's current time.
    pub fn admit(&self, subject: &Subject, action: &ActionType) -> Admission {
        self.admit_at(subject, action, self.engine.clock().now())
    }

    /// Admit a request at an explicit time.
    pub fn admit_at(&self, subject: &Subject, action: &ActionType, now: SystemTime) -> Admission {
        let throttled = self.engine.registry().contains(action);

        if throttled {
            if let Some(cb) = &self.circuit_breaker {
                if !cb.allow_request() {
                    tracing::debug!(action = %action, "circuit open, skipping counter store");
                    return self.failure(subject, action);
                }
            }
        }

        let result = self.engine.evaluate(subject, action, now);

        if throttled {
            if let Some(cb) = &self.circuit_breaker {
                match &result {
                    Ok(_) => cb.record_success(),
                    Err(_) => cb.record_failure(),
                }
            }
        }

        self.resolve(subject, action, &result, now)
    }

    /// Answer for a request whose evaluation the caller abandoned on timeout.
    ///
    /// Treated exactly like a store failure.
    pub fn on_timeout(&self, subject: &Subject, action: &ActionType) -> Admission {
        tracing::warn!(action = %action, subject = %subject.id, "admission check timed out");
        self.failure(subject, action)
    }

    /// Map an evaluation result under this gate's posture for `action`.
    pub fn resolve(
        &self,
        subject: &Subject,
        action: &ActionType,
        result: &Result<Decision, EvaluateError>,
        now: SystemTime,
    ) -> Admission {
        match result {
            Ok(decision) => Admission::from_decision(decision, now),
            Err(_) => self.failure(subject, action),
        }
    }

    /// Get a reference to the engine.
    pub fn engine(&self) -> &DecisionEngine<S> {
        &self.engine
    }

    /// Get a reference to the circuit breaker, if any.
    pub fn circuit_breaker(&self) -> Option<&Arc<CircuitBreaker>> {
        self.circuit_breaker.as_ref()
    }

    fn failure(&self, subject: &Subject, action: &ActionType) -> Admission {
        let posture = self.posture(action);
        if posture == FailurePosture::FailOpen {
            tracing::warn!(
                action = %action,
                subject = %subject.id,
                "counter store unavailable, admitting unthrottled (fail-open)"
            );
        }
        Admission::on_failure(posture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::circuit_breaker::{CircuitBreakerConfig, CircuitState};
    use crate::application::registry::PolicyRegistry;
    use crate::domain::decision::Usage;
    use crate::infrastructure::clock::SystemClock;
    use crate::infrastructure::memory_store::MemoryCounterStore;
    use crate::infrastructure::mocks::{CountingStore, FailingStore};
    use std::time::UNIX_EPOCH;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn memory_gate() -> AdmissionGate<Arc<MemoryCounterStore>> {
        AdmissionGate::new(DecisionEngine::new(
            PolicyRegistry::standard(),
            Arc::new(MemoryCounterStore::new()),
            Arc::new(SystemClock::new()),
        ))
    }

    fn failing_gate() -> AdmissionGate<Arc<CountingStore<FailingStore>>> {
        AdmissionGate::new(DecisionEngine::new(
            PolicyRegistry::standard(),
            Arc::new(CountingStore::new(FailingStore::unavailable())),
            Arc::new(SystemClock::new()),
        ))
    }

    #[test]
    fn test_maps_outcomes() {
        let gate = memory_gate();
        let subject = Subject::unverified("alice");
        let action = ActionType::CREATE_REEL;

        assert_eq!(gate.admit_at(&subject, &action, at(3600)), Admission::Proceed);
        assert_eq!(gate.admit_at(&subject, &action, at(3600)), Admission::Proceed);
        assert_eq!(
            gate.admit_at(&subject, &action, at(3600)),
            Admission::VerifyIdentity
        );
        gate.admit_at(&subject, &action, at(3600));
        gate.admit_at(&subject, &action, at(3600));

        // 6th call: over the verified ceiling of 5, 15 minutes into the hour
        assert_eq!(
            gate.admit_at(&subject, &action, at(3600 + 900)),
            Admission::RetryLater {
                retry_after: Duration::from_secs(2700)
            }
        );
    }

    #[test]
    fn test_retry_after_from_decision() {
        let decision = Decision::new(
            Outcome::Exceeded,
            ActionType::SEND_MESSAGE,
            Usage {
                count: 41,
                threshold: 40,
                window_start: at(300),
                window: Duration::from_secs(300),
            },
        );

        assert_eq!(
            Admission::from_decision(&decision, at(420)),
            Admission::RetryLater {
                retry_after: Duration::from_secs(180)
            }
        );
    }

    #[test]
    fn test_fail_closed_by_default() {
        let gate = failing_gate();
        let admission = gate.admit_at(&Subject::verified("bob"), &ActionType::CREATE_POST, at(0));

        assert_eq!(admission, Admission::Unavailable);
        assert!(!admission.is_permitted());
    }

    #[test]
    fn test_fail_open_opt_in_is_per_action() {
        let gate = failing_gate().with_fail_open(ActionType::SEND_MESSAGE);
        let subject = Subject::verified("carol");

        assert_eq!(
            gate.admit_at(&subject, &ActionType::SEND_MESSAGE, at(0)),
            Admission::Proceed
        );
        assert_eq!(
            gate.admit_at(&subject, &ActionType::CREATE_POST, at(0)),
            Admission::Unavailable
        );
        assert_eq!(gate.posture(&ActionType::SEND_MESSAGE), FailurePosture::FailOpen);
        assert_eq!(gate.posture(&ActionType::CREATE_POST), FailurePosture::FailClosed);
    }

    #[test]
    fn test_timeout_treated_as_store_failure() {
        let gate = memory_gate().with_fail_open(ActionType::SEND_MESSAGE);
        let subject = Subject::verified("dave");

        assert_eq!(
            gate.on_timeout(&subject, &ActionType::CREATE_POST),
            Admission::Unavailable
        );
        assert_eq!(
            gate.on_timeout(&subject, &ActionType::SEND_MESSAGE),
            Admission::Proceed
        );
    }

    #[test]
    fn test_unconfigured_action_proceeds_even_when_store_down() {
        let gate = failing_gate();
        assert_eq!(
            gate.admit_at(&Subject::unverified("erin"), &ActionType::new("like"), at(0)),
            Admission::Proceed
        );
        assert_eq!(gate.engine().store().calls(), 0);
    }

    #[test]
    fn test_circuit_breaker_skips_store_when_open() {
        let cb = Arc::new(CircuitBreaker::with_config(CircuitBreakerConfig {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(60),
        }));
        let gate = failing_gate().with_circuit_breaker(Arc::clone(&cb));
        let subject = Subject::verified("frank");

        for _ in 0..10 {
            assert_eq!(
                gate.admit_at(&subject, &ActionType::CREATE_POST, at(0)),
                Admission::Unavailable
            );
        }

        assert_eq!(cb.state(), CircuitState::Open);
        assert_eq!(gate.engine().store().calls(), 3);
    }

    #[test]
    fn test_circuit_breaker_keeps_posture() {
        let cb = Arc::new(CircuitBreaker::with_config(CircuitBreakerConfig {
            failure_threshold: 1,
            recovery_timeout: Duration::from_secs(60),
        }));
        let gate = failing_gate()
            .with_fail_open(ActionType::SEND_MESSAGE)
            .with_circuit_breaker(cb);
        let subject = Subject::verified("gina");

        gate.admit_at(&subject, &ActionType::CREATE_POST, at(0));
        assert_eq!(
            gate.admit_at(&subject, &ActionType::SEND_MESSAGE, at(0)),
            Admission::Proceed
        );
        assert_eq!(
            gate.admit_at(&subject, &ActionType::CREATE_POST, at(0)),
            Admission::Unavailable
        );
    }
}
