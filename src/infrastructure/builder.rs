//! Engine builder.
//!
//! Assembles a [`DecisionEngine`] from a policy source, a clock and a counter
//! store, validating the policy set at `build()`.

use crate::application::engine::DecisionEngine;
use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, CounterStore};
use crate::application::registry::{PolicyRegistry, RegistryError};
use crate::domain::action::ActionType;
use crate::domain::policy::Policy;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::memory_store::MemoryCounterStore;
use std::sync::Arc;

/// Error returned when building an engine fails.
#[derive(Debug)]
pub enum BuildError {
    /// No policy source was configured
    NoPolicies,
    /// The policy set is invalid
    Registry(RegistryError),
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::NoPolicies => write!(
                f,
                "no policies configured; use with_standard_policies, with_registry or with_policy"
            ),
            BuildError::Registry(e) => write!(f, "invalid policy set: {}", e),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::NoPolicies => None,
            BuildError::Registry(e) => Some(e),
        }
    }
}

impl From<RegistryError> for BuildError {
    fn from(e: RegistryError) -> Self {
        BuildError::Registry(e)
    }
}

/// Builder for configuring a [`DecisionEngine`].
///
/// Policies added with [`with_policy`](Self::with_policy) are layered over
/// the base set (standard or explicit registry), replacing base entries for
/// the same action.
#[derive(Debug)]
pub struct EngineBuilder {
    base: Option<PolicyRegistry>,
    policies: Vec<(ActionType, Policy)>,
    clock: Option<Arc<dyn Clock>>,
    metrics: Option<Metrics>,
}

impl EngineBuilder {
    fn new() -> Self {
        Self {
            base: None,
            policies: Vec::new(),
            clock: None,
            metrics: None,
        }
    }

    /// Start from the built-in policy set.
    pub fn with_standard_policies(mut self) -> Self {
        self.base = Some(PolicyRegistry::standard());
        self
    }

    /// Start from an explicit registry, e.g. one loaded from a file.
    pub fn with_registry(mut self, registry: PolicyRegistry) -> Self {
        self.base = Some(registry);
        self
    }

    /// Add or replace the policy for one action.
    pub fn with_policy(mut self, action: impl Into<ActionType>, policy: Policy) -> Self {
        self.policies.push((action.into(), policy));
        self
    }

    /// Set a custom clock (default: `SystemClock`).
    ///
    /// Only affects [`DecisionEngine::check`]; `evaluate` takes the time
    /// explicitly.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Share a metrics tracker with other components.
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build an engine over a fresh in-memory store.
    ///
    /// # Errors
    /// Returns `BuildError::NoPolicies` if no policy source was given, or
    /// `BuildError::Registry` if `with_policy` named the same action twice.
    pub fn build(self) -> Result<DecisionEngine<Arc<MemoryCounterStore>>, BuildError> {
        self.build_with_store(Arc::new(MemoryCounterStore::new()))
    }

    /// Build an engine over a caller-supplied store.
    ///
    /// # Errors
    /// As [`build`](Self::build).
    pub fn build_with_store<S>(self, store: S) -> Result<DecisionEngine<S>, BuildError>
    where
        S: CounterStore,
    {
        if self.base.is_none() && self.policies.is_empty() {
            return Err(BuildError::NoPolicies);
        }

        let overrides = PolicyRegistry::new(self.policies)?;
        let registry = match self.base {
            Some(base) => {
                let inherited = base
                    .iter()
                    .filter(|(action, _)| !overrides.contains(action))
                    .map(|(action, policy)| (action.clone(), *policy));
                let merged: Vec<_> = inherited
                    .chain(overrides.iter().map(|(a, p)| (a.clone(), *p)))
                    .collect();
                PolicyRegistry::new(merged)?
            }
            None => overrides,
        };

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock::new()));
        let engine = DecisionEngine::new(registry, store, clock);
        Ok(match self.metrics {
            Some(metrics) => engine.with_metrics(metrics),
            None => engine,
        })
    }
}

impl DecisionEngine<Arc<MemoryCounterStore>> {
    /// Create a builder for configuring an engine.
    ///
    /// # Example
    /// ```
    /// use action_throttle::{ActionType, DecisionEngine, Outcome, Policy, Subject};
    /// use std::time::Duration;
    ///
    /// let engine = DecisionEngine::builder()
    ///     .with_standard_policies()
    ///     .with_policy("send_gift", Policy::new(Duration::from_secs(60), 3, 1).unwrap())
    ///     .build()
    ///     .unwrap();
    ///
    /// let decision = engine
    ///     .check(&Subject::unverified("alice"), &ActionType::new("send_gift"))
    ///     .unwrap();
    /// assert_eq!(decision.outcome(), Outcome::Allowed);
    /// ```
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }
}
