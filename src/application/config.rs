//! Static configuration for the policy registry.
//!
//! Policies are read once at start-up, typically from TOML:
//!
//! ```toml
//! [actions.create_reel]
//! window = "1h"
//! max_count = 5
//! unverified_max_count = 2
//!
//! [actions.send_message]
//! window = 300          # plain integers are seconds
//! max_count = 40
//! unverified_max_count = 15
//! ```

use crate::domain::policy::{Policy, PolicyError};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::time::Duration;

/// Raw policy values for one action, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Window length: humantime string ("30m", "1h") or integer seconds
    #[serde(deserialize_with = "deserialize_window")]
    pub window: Duration,
    /// Ceiling for verified subjects
    pub max_count: u64,
    /// Ceiling for unverified subjects
    pub unverified_max_count: u64,
}

impl PolicyConfig {
    /// Validate into a policy.
    ///
    /// # Errors
    /// Returns `PolicyError` if the values violate a policy invariant.
    pub fn to_policy(&self) -> Result<Policy, PolicyError> {
        Policy::new(self.window, self.max_count, self.unverified_max_count)
    }
}

/// Mapping from action name to its policy values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Policies keyed by action name
    #[serde(default)]
    pub actions: BTreeMap<String, PolicyConfig>,
}

impl RegistryConfig {
    /// Parse a TOML document.
    ///
    /// # Errors
    /// Returns the parser error if the document is malformed or has unknown keys.
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }
}

fn deserialize_window<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawWindow {
        Seconds(u64),
        Human(String),
    }

    match RawWindow::deserialize(deserializer)? {
        RawWindow::Seconds(secs) => Ok(Duration::from_secs(secs)),
        RawWindow::Human(text) => {
            humantime::parse_duration(&text).map_err(serde::de::Error::custom)
        }
    }
}
