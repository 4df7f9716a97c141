use std::fmt;

use serde::{Deserialize, Serialize};

/// The calling identity, as resolved by the host application.
///
/// Only the user-routed sharding strategy cares about this: anonymous
/// callers share one subtree while authenticated callers get a subtree
/// keyed by their stable identity key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Principal {
    /// Unauthenticated caller.
    Anonymous,
    /// Authenticated caller with its stable per-user key.
    User(String),
}

impl Principal {
    /// Create an authenticated principal.
    pub fn user(key: impl Into<String>) -> Self {
        Self::User(key.into())
    }

    /// Returns `true` for unauthenticated callers.
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    /// The stable per-user key, if authenticated.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::User(key) => Some(key),
        }
    }
}

impl Default for Principal {
    fn default() -> Self {
        Self::Anonymous
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::User(key) => write!(f, "user:{key}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_has_no_key() {
        let p = Principal::Anonymous;
        assert!(p.is_anonymous());
        assert_eq!(p.key(), None);
    }

    #[test]
    fn user_carries_key() {
        let p = Principal::user("alice");
        assert!(!p.is_anonymous());
        assert_eq!(p.key(), Some("alice"));
    }

    #[test]
    fn default_is_anonymous() {
        assert!(Principal::default().is_anonymous());
    }

    #[test]
    fn display_formats() {
        assert_eq!(Principal::Anonymous.to_string(), "anonymous");
        assert_eq!(Principal::user("bob").to_string(), "user:bob");
    }
}
