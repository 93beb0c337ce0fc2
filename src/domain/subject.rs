//! Subjects: the identities being rate limited.

use std::borrow::Cow;
use std::fmt;

/// Opaque identifier of a rate-limited subject (typically a user id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubjectId(Cow<'static, str>);

impl SubjectId {
    /// Create a subject id from any string-like value.
    pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for SubjectId {
    fn from(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }
}

impl From<String> for SubjectId {
    fn from(id: String) -> Self {
        Self(Cow::Owned(id))
    }
}

/// Identity verification tier of a subject.
///
/// Determined by the caller's identity subsystem and passed on every call;
/// the core never caches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationTier {
    /// Identity not verified; the lower ceiling applies.
    Unverified,
    /// Identity verified; the full ceiling applies.
    Verified,
}

impl VerificationTier {
    /// Check if this is the verified tier.
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationTier::Verified)
    }
}

impl fmt::Display for VerificationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationTier::Unverified => f.write_str("unverified"),
            VerificationTier::Verified => f.write_str("verified"),
        }
    }
}

/// A subject as seen by a single decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    /// Unique identifier
    pub id: SubjectId,
    /// Verification tier at the time of the call
    pub tier: VerificationTier,
}

impl Subject {
    /// Create a subject with an explicit tier.
    pub fn new(id: impl Into<SubjectId>, tier: VerificationTier) -> Self {
        Self {
            id: id.into(),
            tier,
        }
    }

    /// Create an unverified subject.
    pub fn unverified(id: impl Into<SubjectId>) -> Self {
        Self::new(id, VerificationTier::Unverified)
    }

    /// Create a verified subject.
    pub fn verified(id: impl Into<SubjectId>) -> Self {
        Self::new(id, VerificationTier::Verified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_constructors() {
        let s = Subject::unverified("alice");
        assert_eq!(s.id.as_str(), "alice");
        assert!(!s.tier.is_verified());

        let s = Subject::verified(String::from("bob"));
        assert_eq!(s.id, SubjectId::new("bob"));
        assert!(s.tier.is_verified());
    }

    #[test]
    fn test_tier_display() {
        assert_eq!(VerificationTier::Unverified.to_string(), "unverified");
        assert_eq!(VerificationTier::Verified.to_string(), "verified");
    }
}
