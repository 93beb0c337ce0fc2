//! Registry of per-action policies.
//!
//! The registry is built once at start-up and never mutated afterwards. An
//! action with no entry is deliberately unthrottled: the engine allows it
//! without touching the counter store.

use crate::application::config::RegistryConfig;
use crate::domain::action::ActionType;
use crate::domain::policy::{Policy, PolicyError};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Errors that can occur when building a registry.
#[derive(Debug)]
pub enum RegistryError {
    /// A configured policy violates a policy invariant
    InvalidPolicy {
        /// Action the policy was configured for
        action: ActionType,
        /// The violated invariant
        source: PolicyError,
    },
    /// The same action was configured twice
    DuplicateAction(ActionType),
    /// The configuration document could not be parsed
    Parse(toml::de::Error),
    /// The configuration file could not be read
    Io(std::io::Error),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::InvalidPolicy { action, source } => {
                write!(f, "invalid policy for action '{}': {}", action, source)
            }
            RegistryError::DuplicateAction(action) => {
                write!(f, "action '{}' configured more than once", action)
            }
            RegistryError::Parse(e) => write!(f, "failed to parse policy configuration: {}", e),
            RegistryError::Io(e) => write!(f, "failed to read policy configuration: {}", e),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::InvalidPolicy { source, .. } => Some(source),
            RegistryError::DuplicateAction(_) => None,
            RegistryError::Parse(e) => Some(e),
            RegistryError::Io(e) => Some(e),
        }
    }
}

impl From<toml::de::Error> for RegistryError {
    fn from(e: toml::de::Error) -> Self {
        RegistryError::Parse(e)
    }
}

impl From<std::io::Error> for RegistryError {
    fn from(e: std::io::Error) -> Self {
        RegistryError::Io(e)
    }
}

/// Immutable mapping from action type to policy.
///
/// # Example
/// ```
/// use action_throttle::{ActionType, PolicyRegistry};
/// use std::time::Duration;
///
/// let registry = PolicyRegistry::standard();
/// let policy = registry.lookup(&ActionType::CREATE_REEL).unwrap();
/// assert_eq!(policy.window(), Duration::from_secs(3600));
/// assert_eq!(policy.max_count(), 5);
///
/// assert!(registry.lookup(&ActionType::new("like")).is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyRegistry {
    policies: HashMap<ActionType, Policy>,
}

impl PolicyRegistry {
    /// Build a registry from action/policy pairs.
    ///
    /// # Errors
    /// Returns `RegistryError::DuplicateAction` if an action appears twice.
    pub fn new(
        entries: impl IntoIterator<Item = (ActionType, Policy)>,
    ) -> Result<Self, RegistryError> {
        let mut policies = HashMap::new();
        for (action, policy) in entries {
            if policies.contains_key(&action) {
                return Err(RegistryError::DuplicateAction(action));
            }
            policies.insert(action, policy);
        }
        Ok(Self { policies })
    }

    /// A registry with no policies; every action is unthrottled.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The application's built-in policy set.
    ///
    /// | action | window | max | unverified max |
    /// |---|---|---|---|
    /// | `create_reel` | 1 hour | 5 | 2 |
    /// | `create_post` | 30 min | 6 | 3 |
    /// | `send_message` | 5 min | 40 | 15 |
    pub fn standard() -> Self {
        let policies = HashMap::from([
            (
                ActionType::CREATE_REEL,
                Policy::fixed(Duration::from_secs(60 * 60), 5, 2),
            ),
            (
                ActionType::CREATE_POST,
                Policy::fixed(Duration::from_secs(30 * 60), 6, 3),
            ),
            (
                ActionType::SEND_MESSAGE,
                Policy::fixed(Duration::from_secs(5 * 60), 40, 15),
            ),
        ]);
        Self { policies }
    }

    /// Build a registry from parsed configuration, validating every policy.
    ///
    /// # Errors
    /// Returns `RegistryError::InvalidPolicy` naming the first invalid action.
    pub fn from_config(config: &RegistryConfig) -> Result<Self, RegistryError> {
        let mut entries = Vec::with_capacity(config.actions.len());
        for (name, policy_config) in &config.actions {
            let action = ActionType::new(name.clone());
            match policy_config.to_policy() {
                Ok(policy) => entries.push((action, policy)),
                Err(source) => return Err(RegistryError::InvalidPolicy { action, source }),
            }
        }

        let registry = Self::new(entries)?;
        tracing::info!(actions = registry.len(), "policy registry loaded");
        Ok(registry)
    }

    /// Parse and validate a TOML document.
    ///
    /// # Errors
    /// Returns `RegistryError::Parse` for malformed documents and
    /// `RegistryError::InvalidPolicy` for invalid values.
    pub fn from_toml_str(source: &str) -> Result<Self, RegistryError> {
        let config = RegistryConfig::from_toml_str(source)?;
        Self::from_config(&config)
    }

    /// Read, parse and validate a TOML file.
    ///
    /// # Errors
    /// Returns `RegistryError::Io` if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Look up the policy for an action. `None` means the action is not throttled.
    pub fn lookup(&self, action: &ActionType) -> Option<&Policy> {
        self.policies.get(action)
    }

    /// Check if an action has a policy.
    pub fn contains(&self, action: &ActionType) -> bool {
        self.policies.contains_key(action)
    }

    /// Get the number of configured actions.
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Iterate over all configured actions and their policies.
    pub fn iter(&self) -> impl Iterator<Item = (&ActionType, &Policy)> {
        self.policies.iter()
    }

    /// Longest window of any configured policy, if any.
    ///
    /// Useful as the horizon when purging expired counters.
    pub fn longest_window(&self) -> Option<Duration> {
        self.policies.values().map(Policy::window).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_policies() {
        let registry = PolicyRegistry::standard();
        assert_eq!(registry.len(), 3);

        let post = registry.lookup(&ActionType::CREATE_POST).unwrap();
        assert_eq!(post.window(), Duration::from_secs(1800));
        assert_eq!(post.max_count(), 6);
        assert_eq!(post.unverified_max_count(), 3);

        let message = registry.lookup(&ActionType::SEND_MESSAGE).unwrap();
        assert_eq!(message.window(), Duration::from_secs(300));
        assert_eq!(message.max_count(), 40);
        assert_eq!(message.unverified_max_count(), 15);
    }

    #[test]
    fn test_standard_policies_satisfy_invariants() {
        for (action, policy) in PolicyRegistry::standard().iter() {
            let validated = Policy::new(
                policy.window(),
                policy.max_count(),
                policy.unverified_max_count(),
            );
            assert_eq!(validated.as_ref(), Ok(policy), "policy for {action}");
        }
    }

    #[test]
    fn test_lookup_is_stable() {
        let registry = PolicyRegistry::standard();
        let first = *registry.lookup(&ActionType::CREATE_REEL).unwrap();
        for _ in 0..100 {
            assert_eq!(registry.lookup(&ActionType::CREATE_REEL), Some(&first));
        }
    }

    #[test]
    fn test_unknown_action_not_configured() {
        let registry = PolicyRegistry::standard();
        assert!(registry.lookup(&ActionType::new("upload_avatar")).is_none());
        assert!(!registry.contains(&ActionType::new("upload_avatar")));
    }

    #[test]
    fn test_duplicate_action_rejected() {
        let policy = Policy::new(Duration::from_secs(60), 5, 2).unwrap();
        let result = PolicyRegistry::new([
            (ActionType::CREATE_POST, policy),
            (ActionType::new(String::from("create_post")), policy),
        ]);

        assert!(matches!(
            result,
            Err(RegistryError::DuplicateAction(action)) if action == ActionType::CREATE_POST
        ));
    }

    #[test]
    fn test_from_toml_str() {
        let registry = PolicyRegistry::from_toml_str(
            r#"
            [actions.create_reel]
            window = "1h"
            max_count = 5
            unverified_max_count = 2
            "#,
        )
        .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.lookup(&ActionType::CREATE_REEL).map(Policy::max_count),
            Some(5)
        );
    }

    #[test]
    fn test_invalid_policy_names_action() {
        let err = PolicyRegistry::from_toml_str(
            r#"
            [actions.send_message]
            window = "5m"
            max_count = 10
            unverified_max_count = 20
            "#,
        )
        .unwrap_err();

        match &err {
            RegistryError::InvalidPolicy { action, source } => {
                assert_eq!(action, &ActionType::SEND_MESSAGE);
                assert!(matches!(source, PolicyError::UnverifiedAboveVerified { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("send_message"));
    }

    #[test]
    fn test_parse_error() {
        let err = PolicyRegistry::from_toml_str("[actions.create_post\n").unwrap_err();
        assert!(matches!(err, RegistryError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = PolicyRegistry::load("/nonexistent/throttle-policies.toml").unwrap_err();
        assert!(matches!(err, RegistryError::Io(_)));
    }

    #[test]
    fn test_longest_window() {
        assert_eq!(
            PolicyRegistry::standard().longest_window(),
            Some(Duration::from_secs(3600))
        );
        assert_eq!(PolicyRegistry::empty().longest_window(), None);
    }
}
