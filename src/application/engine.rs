//! Decision engine.
//!
//! The engine decides whether a subject may perform an action right now. It
//! owns no persistent state: each evaluation resolves the action's policy,
//! performs exactly one atomic increment in the counter store and classifies
//! the resulting count.

use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, CounterKey, CounterStore, StoreError, StoreErrorKind};
use crate::application::registry::PolicyRegistry;
use crate::domain::action::ActionType;
use crate::domain::decision::{Decision, Usage};
use crate::domain::escalation::EscalationClassifier;
use crate::domain::subject::Subject;
use std::fmt;
use std::panic;
use std::sync::Arc;
use std::time::SystemTime;

/// Failure to produce a decision.
///
/// Distinct from the rate limit outcomes: it means the throttling system is
/// down, not that the subject is throttled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluateError {
    /// The counter store could not record the occurrence
    StoreUnavailable(StoreError),
}

impl EvaluateError {
    /// The underlying store failure.
    pub fn store_error(&self) -> &StoreError {
        match self {
            EvaluateError::StoreUnavailable(e) => e,
        }
    }

    /// Check if the failure was a store timeout.
    pub fn is_timeout(&self) -> bool {
        self.store_error().kind() == StoreErrorKind::Timeout
    }
}

impl fmt::Display for EvaluateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluateError::StoreUnavailable(e) => write!(f, "admission check failed: {}", e),
        }
    }
}

impl std::error::Error for EvaluateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EvaluateError::StoreUnavailable(e) => Some(e),
        }
    }
}

impl From<StoreError> for EvaluateError {
    fn from(e: StoreError) -> Self {
        EvaluateError::StoreUnavailable(e)
    }
}

/// Evaluates admission requests against the policy registry.
///
/// Cheap to clone; clones share the registry, store, clock and metrics.
#[derive(Clone)]
pub struct DecisionEngine<S>
where
    S: CounterStore,
{
    registry: Arc<PolicyRegistry>,
    store: S,
    classifier: EscalationClassifier,
    clock: Arc<dyn Clock>,
    metrics: Metrics,
}

impl<S> fmt::Debug for DecisionEngine<S>
where
    S: CounterStore,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecisionEngine")
            .field("actions", &self.registry.len())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl<S> DecisionEngine<S>
where
    S: CounterStore,
{
    /// Create a new engine.
    ///
    /// # Arguments
    /// * `registry` - Policies per action type, fixed for the engine's lifetime
    /// * `store` - Counter store honoring the atomic increment contract
    /// * `clock` - Time source for [`check`](Self::check)
    pub fn new(registry: PolicyRegistry, store: S, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry: Arc::new(registry),
            store,
            classifier: EscalationClassifier::new(),
            clock,
            metrics: Metrics::new(),
        }
    }

    /// Use a shared metrics tracker instead of a private one.
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Decide whether `subject` may perform `action` at `now`.
    ///
    /// # Returns
    /// - `Allowed` without usage if the action has no policy; the store is
    ///   not touched.
    /// - Otherwise the classification of the post-increment count against the
    ///   subject's tier.
    ///
    /// # Errors
    /// Returns `EvaluateError::StoreUnavailable` if the increment fails. The
    /// engine never retries and never guesses an outcome; a store that panics
    /// is reported the same way.
    pub fn evaluate(
        &self,
        subject: &Subject,
        action: &ActionType,
        now: SystemTime,
    ) -> Result<Decision, EvaluateError> {
        let Some(policy) = self.registry.lookup(action) else {
            tracing::debug!(
                action = %action,
                subject = %subject.id,
                "no policy configured, action not throttled"
            );
            self.metrics.record_unthrottled();
            return Ok(Decision::unthrottled(action.clone()));
        };

        let key = CounterKey::new(subject.id.clone(), action.clone());
        let window = policy.window();

        let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
            self.store.increment_and_get(&key, window, now)
        }))
        .unwrap_or_else(|_| Err(StoreError::unavailable("counter store panicked")));

        let reading = match result {
            Ok(reading) => reading,
            Err(e) => {
                self.metrics.record_store_failure();
                tracing::warn!(
                    error = %e,
                    action = %action,
                    subject = %subject.id,
                    "counter store failure, no decision made"
                );
                return Err(EvaluateError::StoreUnavailable(e));
            }
        };

        let classification = self
            .classifier
            .classify(reading.count, policy, subject.tier);
        self.metrics.record_outcome(classification.outcome);

        tracing::debug!(
            action = %action,
            subject = %subject.id,
            tier = %subject.tier,
            count = reading.count,
            threshold = classification.threshold,
            outcome = %classification.outcome,
            "admission evaluated"
        );

        Ok(Decision::new(
            classification.outcome,
            action.clone(),
            Usage {
                count: reading.count,
                threshold: classification.threshold,
                window_start: reading.window_start,
                window,
            },
        ))
    }

    /// Decide using the engine's clock for the current time.
    ///
    /// # Errors
    /// As [`evaluate`](Self::evaluate).
    pub fn check(&self, subject: &Subject, action: &ActionType) -> Result<Decision, EvaluateError> {
        self.evaluate(subject, action, self.clock.now())
    }

    /// Get a reference to the policy registry.
    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    /// Get a reference to the counter store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get a reference to the clock.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}
