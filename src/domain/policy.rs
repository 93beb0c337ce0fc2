//! Rate limiting policies for throttled actions.
//!
//! A policy bounds how many times a subject may perform one action within a
//! fixed time window, with a lower ceiling for unverified subjects.

use crate::domain::subject::VerificationTier;
use std::fmt;
use std::time::Duration;

/// Errors that can occur when constructing a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// Window duration must be greater than zero
    ZeroWindow,
    /// Verified ceiling must be greater than zero
    ZeroMaxCount,
    /// Unverified ceiling must be greater than zero
    ZeroUnverifiedMaxCount,
    /// Unverified ceiling must not exceed the verified ceiling
    UnverifiedAboveVerified {
        /// Configured verified ceiling
        max_count: u64,
        /// Configured unverified ceiling
        unverified_max_count: u64,
    },
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyError::ZeroWindow => write!(f, "window must be greater than 0"),
            PolicyError::ZeroMaxCount => write!(f, "max_count must be greater than 0"),
            PolicyError::ZeroUnverifiedMaxCount => {
                write!(f, "unverified_max_count must be greater than 0")
            }
            PolicyError::UnverifiedAboveVerified {
                max_count,
                unverified_max_count,
            } => write!(
                f,
                "unverified_max_count ({}) must not exceed max_count ({})",
                unverified_max_count, max_count
            ),
        }
    }
}

impl std::error::Error for PolicyError {}

/// Per-action rate limit configuration.
///
/// # Example
/// ```
/// use action_throttle::{Policy, VerificationTier};
/// use std::time::Duration;
///
/// let policy = Policy::new(Duration::from_secs(3600), 5, 2).unwrap();
/// assert_eq!(policy.ceiling(VerificationTier::Unverified), 2);
/// assert_eq!(policy.ceiling(VerificationTier::Verified), 5);
///
/// // The unverified ceiling may never exceed the verified one
/// assert!(Policy::new(Duration::from_secs(60), 2, 5).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    window: Duration,
    max_count: u64,
    unverified_max_count: u64,
}

impl Policy {
    /// Create a validated policy.
    ///
    /// # Arguments
    /// * `window` - Length of the counting window
    /// * `max_count` - Ceiling for verified subjects
    /// * `unverified_max_count` - Ceiling for unverified subjects
    ///
    /// # Errors
    /// Returns `PolicyError` if either ceiling or the window is zero, or if the
    /// unverified ceiling is above the verified one.
    pub fn new(
        window: Duration,
        max_count: u64,
        unverified_max_count: u64,
    ) -> Result<Self, PolicyError> {
        if window.is_zero() {
            return Err(PolicyError::ZeroWindow);
        }
        if max_count == 0 {
            return Err(PolicyError::ZeroMaxCount);
        }
        if unverified_max_count == 0 {
            return Err(PolicyError::ZeroUnverifiedMaxCount);
        }
        if unverified_max_count > max_count {
            return Err(PolicyError::UnverifiedAboveVerified {
                max_count,
                unverified_max_count,
            });
        }

        Ok(Self {
            window,
            max_count,
            unverified_max_count,
        })
    }

    /// Policy from constants that are valid by construction.
    pub(crate) const fn fixed(window: Duration, max_count: u64, unverified_max_count: u64) -> Self {
        Self {
            window,
            max_count,
            unverified_max_count,
        }
    }

    /// Length of the counting window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Ceiling for verified subjects.
    pub fn max_count(&self) -> u64 {
        self.max_count
    }

    /// Ceiling for unverified subjects.
    pub fn unverified_max_count(&self) -> u64 {
        self.unverified_max_count
    }

    /// The inclusive ceiling that applies to a tier.
    pub fn ceiling(&self, tier: VerificationTier) -> u64 {
        match tier {
            VerificationTier::Unverified => self.unverified_max_count,
            VerificationTier::Verified => self.max_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_policy() {
        let policy = Policy::new(Duration::from_secs(300), 40, 15).unwrap();
        assert_eq!(policy.window(), Duration::from_secs(300));
        assert_eq!(policy.max_count(), 40);
        assert_eq!(policy.unverified_max_count(), 15);
    }

    #[test]
    fn test_equal_ceilings_allowed() {
        let policy = Policy::new(Duration::from_secs(1), 3, 3).unwrap();
        assert_eq!(policy.ceiling(VerificationTier::Unverified), 3);
        assert_eq!(policy.ceiling(VerificationTier::Verified), 3);
    }

    #[test]
    fn test_zero_window_rejected() {
        assert_eq!(
            Policy::new(Duration::ZERO, 5, 2),
            Err(PolicyError::ZeroWindow)
        );
    }

    #[test]
    fn test_zero_ceilings_rejected() {
        let window = Duration::from_secs(60);
        assert_eq!(Policy::new(window, 0, 0), Err(PolicyError::ZeroMaxCount));
        assert_eq!(
            Policy::new(window, 5, 0),
            Err(PolicyError::ZeroUnverifiedMaxCount)
        );
    }

    #[test]
    fn test_unverified_above_verified_rejected() {
        let err = Policy::new(Duration::from_secs(60), 2, 3).unwrap_err();
        assert_eq!(
            err,
            PolicyError::UnverifiedAboveVerified {
                max_count: 2,
                unverified_max_count: 3
            }
        );
        assert_eq!(
            err.to_string(),
            "unverified_max_count (3) must not exceed max_count (2)"
        );
    }
}
