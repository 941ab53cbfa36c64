//! The resolved caller identity.
//!
//! The session/identity provider in front of this service resolves every
//! request to either an authenticated user id or an anonymous session token
//! before it reaches us. Both shapes collapse into one tagged value here so
//! downstream code never branches on "which kind of credential was this" -
//! cart rows are keyed by [`Identity::key`] regardless of the variant.

use serde::{Deserialize, Serialize};

/// A caller identity resolved by the upstream session/identity provider.
///
/// Cart line items are always keyed by the concrete string inside the
/// variant. Orders additionally require the `User` variant - anonymous
/// sessions can build carts but cannot check out.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Identity {
    /// A stable authenticated user id.
    User(String),
    /// A client-held anonymous session token.
    Anonymous(String),
}

impl Identity {
    /// The concrete identity string used to key cart rows.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::User(id) | Self::Anonymous(id) => id,
        }
    }

    /// Whether this identity belongs to an authenticated user.
    #[must_use]
    pub const fn is_user(&self) -> bool {
        matches!(self, Self::User(_))
    }

    /// The authenticated user id, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::User(id) => Some(id),
            Self::Anonymous(_) => None,
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{id}"),
            Self::Anonymous(token) => write!(f, "anon:{token}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_ignores_variant() {
        assert_eq!(Identity::User("u1".into()).key(), "u1");
        assert_eq!(Identity::Anonymous("s1".into()).key(), "s1");
    }

    #[test]
    fn test_user_id_only_for_users() {
        assert_eq!(Identity::User("u1".into()).user_id(), Some("u1"));
        assert_eq!(Identity::Anonymous("s1".into()).user_id(), None);
        assert!(Identity::User("u1".into()).is_user());
        assert!(!Identity::Anonymous("s1".into()).is_user());
    }
}
