//! Action types: the operations subject to throttling.

use std::borrow::Cow;
use std::fmt;

/// Named key identifying a throttled operation.
///
/// The application's well-known actions are available as associated
/// constants. Any other name may be configured in the policy registry; a
/// name with no policy is not throttled.
///
/// # Example
/// ```
/// use action_throttle::ActionType;
///
/// assert_eq!(ActionType::CREATE_POST.as_str(), "create_post");
/// assert_eq!(ActionType::new("create_post"), ActionType::CREATE_POST);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionType(Cow<'static, str>);

impl ActionType {
    /// Publishing a short video.
    pub const CREATE_REEL: ActionType = ActionType(Cow::Borrowed("create_reel"));
    /// Publishing a post.
    pub const CREATE_POST: ActionType = ActionType(Cow::Borrowed("create_post"));
    /// Sending a direct message.
    pub const SEND_MESSAGE: ActionType = ActionType(Cow::Borrowed("send_message"));

    /// Create an action type from a name.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Borrow the action name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ActionType {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for ActionType {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}
