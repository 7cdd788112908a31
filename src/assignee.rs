// Copyright 2025 Cowboy AI, LLC.

//! Assignee token codec
//!
//! Task permission entries are stored as opaque strings of the form
//! `{class}:{id}` where the class selects an actor population: a single
//! user, or every member of a role, department, or post. Strings without a
//! recognized class prefix are legacy bare user ids. The token is decoded
//! into a closed tagged union exactly once at the resolution boundary
//! instead of prefix-matching at every call site.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between the actor class and the group or user id
const CLASS_SEPARATOR: char = ':';

/// An assignment token attached to a task's permission list
///
/// # Examples
///
/// ```rust
/// use flow_domain::AssigneeToken;
///
/// assert_eq!(AssigneeToken::decode("role:7"), AssigneeToken::Role("7".into()));
/// assert_eq!(AssigneeToken::decode("42"), AssigneeToken::RawLegacy("42".into()));
/// assert_eq!(AssigneeToken::User("9".into()).encode(), "user:9");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssigneeToken {
    /// A single user
    User(String),

    /// Every member of a role
    Role(String),

    /// Every member of a department
    Dept(String),

    /// Every holder of a post
    Post(String),

    /// Legacy bare id, treated as a user id
    RawLegacy(String),
}

impl AssigneeToken {
    /// Decode a stored permission entry
    ///
    /// Total: an entry without a recognized class prefix decodes to
    /// [`AssigneeToken::RawLegacy`] for compatibility with records written
    /// before class prefixes existed.
    pub fn decode(raw: &str) -> Self {
        match raw.split_once(CLASS_SEPARATOR) {
            Some(("user", id)) => AssigneeToken::User(id.to_string()),
            Some(("role", id)) => AssigneeToken::Role(id.to_string()),
            Some(("dept", id)) => AssigneeToken::Dept(id.to_string()),
            Some(("post", id)) => AssigneeToken::Post(id.to_string()),
            _ => AssigneeToken::RawLegacy(raw.to_string()),
        }
    }

    /// Encode to the stored string form
    pub fn encode(&self) -> String {
        match self {
            AssigneeToken::User(id) => format!("user{CLASS_SEPARATOR}{id}"),
            AssigneeToken::Role(id) => format!("role{CLASS_SEPARATOR}{id}"),
            AssigneeToken::Dept(id) => format!("dept{CLASS_SEPARATOR}{id}"),
            AssigneeToken::Post(id) => format!("post{CLASS_SEPARATOR}{id}"),
            AssigneeToken::RawLegacy(id) => id.clone(),
        }
    }

    /// The group or user id carried by the token
    pub fn id(&self) -> &str {
        match self {
            AssigneeToken::User(id)
            | AssigneeToken::Role(id)
            | AssigneeToken::Dept(id)
            | AssigneeToken::Post(id)
            | AssigneeToken::RawLegacy(id) => id,
        }
    }

    /// Whether this token resolves to a single user without a group lookup
    pub fn is_single_user(&self) -> bool {
        matches!(self, AssigneeToken::User(_) | AssigneeToken::RawLegacy(_))
    }
}

impl fmt::Display for AssigneeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl FromStr for AssigneeToken {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(AssigneeToken::decode(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("user:17", AssigneeToken::User("17".to_string()))]
    #[test_case("role:admin", AssigneeToken::Role("admin".to_string()))]
    #[test_case("dept:304", AssigneeToken::Dept("304".to_string()))]
    #[test_case("post:cfo", AssigneeToken::Post("cfo".to_string()))]
    #[test_case("17", AssigneeToken::RawLegacy("17".to_string()))]
    #[test_case("group:9", AssigneeToken::RawLegacy("group:9".to_string()); "unrecognized prefix stays legacy")]
    fn test_decode(raw: &str, expected: AssigneeToken) {
        assert_eq!(AssigneeToken::decode(raw), expected);
    }

    #[test]
    fn test_encode_matches_decode() {
        for raw in ["user:17", "role:admin", "dept:304", "post:cfo", "17"] {
            assert_eq!(AssigneeToken::decode(raw).encode(), raw);
        }
    }

    #[test]
    fn test_empty_id_is_preserved() {
        // A malformed "role:" entry keeps its class; the resolver treats the
        // empty group as an unknown group rather than failing decode.
        assert_eq!(
            AssigneeToken::decode("role:"),
            AssigneeToken::Role(String::new())
        );
    }

    #[test]
    fn test_single_user_classification() {
        assert!(AssigneeToken::decode("user:1").is_single_user());
        assert!(AssigneeToken::decode("1").is_single_user());
        assert!(!AssigneeToken::decode("dept:1").is_single_user());
    }
}
