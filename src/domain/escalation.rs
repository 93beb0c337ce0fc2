//! Tier escalation: turning a count into an outcome.
//!
//! Kept separate from counting so the three-way split can be tested without
//! any storage involved.

use crate::domain::decision::Outcome;
use crate::domain::policy::Policy;
use crate::domain::subject::VerificationTier;

/// Outcome of classifying a count, with the ceiling that decided it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// The admission outcome
    pub outcome: Outcome,
    /// Ceiling the count was compared against
    pub threshold: u64,
}

/// Maps a post-increment count and a tier onto an [`Outcome`].
///
/// - `count <= ceiling(tier)` is `Allowed` (ceilings are inclusive).
/// - An unverified subject over its own ceiling but within the verified one
///   gets `RequiresVerification`.
/// - Anything over the verified ceiling is `Exceeded`, whatever the tier.
///
/// # Example
/// ```
/// use action_throttle::{EscalationClassifier, Outcome, Policy, VerificationTier};
/// use std::time::Duration;
///
/// let policy = Policy::new(Duration::from_secs(60), 5, 2).unwrap();
/// let classifier = EscalationClassifier::new();
///
/// let c = classifier.classify(3, &policy, VerificationTier::Unverified);
/// assert_eq!(c.outcome, Outcome::RequiresVerification);
/// assert_eq!(c.threshold, 2);
///
/// let c = classifier.classify(3, &policy, VerificationTier::Verified);
/// assert_eq!(c.outcome, Outcome::Allowed);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct EscalationClassifier;

impl EscalationClassifier {
    /// Create a classifier.
    pub fn new() -> Self {
        Self
    }

    /// Classify a count under a policy for a tier. Pure.
    pub fn classify(&self, count: u64, policy: &Policy, tier: VerificationTier) -> Classification {
        let ceiling = policy.ceiling(tier);

        if count <= ceiling {
            return Classification {
                outcome: Outcome::Allowed,
                threshold: ceiling,
            };
        }

        match tier {
            VerificationTier::Unverified if count <= policy.max_count() => Classification {
                outcome: Outcome::RequiresVerification,
                threshold: ceiling,
            },
            _ => Classification {
                outcome: Outcome::Exceeded,
                threshold: policy.max_count(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn policy(max: u64, unverified: u64) -> Policy {
        Policy::new(Duration::from_secs(60), max, unverified).unwrap()
    }

    #[test]
    fn test_within_ceiling_is_allowed_for_both_tiers() {
        let p = policy(5, 2);
        let c = EscalationClassifier::new();

        for count in 1..=2 {
            assert_eq!(
                c.classify(count, &p, VerificationTier::Unverified).outcome,
                Outcome::Allowed
            );
        }
        for count in 1..=5 {
            assert_eq!(
                c.classify(count, &p, VerificationTier::Verified).outcome,
                Outcome::Allowed
            );
        }
    }

    #[test]
    fn test_unverified_between_ceilings_requires_verification() {
        let p = policy(5, 2);
        let c = EscalationClassifier::new();

        for count in 3..=5 {
            let result = c.classify(count, &p, VerificationTier::Unverified);
            assert_eq!(result.outcome, Outcome::RequiresVerification);
            assert_eq!(result.threshold, 2);
        }
    }

    #[test]
    fn test_above_max_is_exceeded_for_both_tiers() {
        let p = policy(5, 2);
        let c = EscalationClassifier::new();

        for tier in [VerificationTier::Unverified, VerificationTier::Verified] {
            for count in [6, 7, 100, u64::MAX] {
                let result = c.classify(count, &p, tier);
                assert_eq!(result.outcome, Outcome::Exceeded, "tier {tier}, count {count}");
                assert_eq!(result.threshold, 5);
            }
        }
    }

    #[test]
    fn test_equal_ceilings_have_no_escalation_band() {
        let p = policy(3, 3);
        let c = EscalationClassifier::new();

        assert_eq!(
            c.classify(3, &p, VerificationTier::Unverified).outcome,
            Outcome::Allowed
        );
        assert_eq!(
            c.classify(4, &p, VerificationTier::Unverified).outcome,
            Outcome::Exceeded
        );
    }

    #[test]
    fn test_allowed_reports_applicable_ceiling() {
        let p = policy(40, 15);
        let c = EscalationClassifier::new();

        assert_eq!(c.classify(1, &p, VerificationTier::Unverified).threshold, 15);
        assert_eq!(c.classify(1, &p, VerificationTier::Verified).threshold, 40);
    }
}
