//! Decisions produced by the engine.

use crate::domain::action::ActionType;
use std::fmt;
use std::time::{Duration, SystemTime};

/// Three-way admission outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The action may proceed
    Allowed,
    /// Over the unverified ceiling but within the verified one; the subject
    /// can get through by verifying their identity
    RequiresVerification,
    /// Over the ceiling with no escalation path; wait for the window to end
    Exceeded,
}

impl Outcome {
    /// Check if this outcome is `Allowed`.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Outcome::Allowed)
    }

    /// Stable lowercase name, suitable for log fields and metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Allowed => "allowed",
            Outcome::RequiresVerification => "requires_verification",
            Outcome::Exceeded => "exceeded",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counter state behind a decision, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    /// Post-increment occurrence count in the window
    pub count: u64,
    /// Ceiling the count was compared against
    pub threshold: u64,
    /// Start of the counting window
    pub window_start: SystemTime,
    /// Length of the counting window
    pub window: Duration,
}

impl Usage {
    /// Time left in the window at `now`, zero if it already ended.
    pub fn remaining(&self, now: SystemTime) -> Duration {
        (self.window_start + self.window)
            .duration_since(now)
            .unwrap_or(Duration::ZERO)
    }
}

/// The engine's answer for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    outcome: Outcome,
    action: ActionType,
    usage: Option<Usage>,
}

impl Decision {
    /// Decision backed by a counter reading.
    pub fn new(outcome: Outcome, action: ActionType, usage: Usage) -> Self {
        Self {
            outcome,
            action,
            usage: Some(usage),
        }
    }

    /// Allowed because no policy is configured for the action.
    pub fn unthrottled(action: ActionType) -> Self {
        Self {
            outcome: Outcome::Allowed,
            action,
            usage: None,
        }
    }

    /// The outcome.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// The action the decision is about.
    pub fn action(&self) -> &ActionType {
        &self.action
    }

    /// Counter state, or `None` when the action is not throttled.
    pub fn usage(&self) -> Option<&Usage> {
        self.usage.as_ref()
    }

    /// Check if the action may proceed.
    pub fn is_allowed(&self) -> bool {
        self.outcome.is_allowed()
    }
}
