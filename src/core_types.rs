//! Core types used throughout the engine
//!
//! Fundamental aliases and the validated `Principal` identity type.
//! Aliases give semantic meaning and leave room for future type evolution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Resource ID - unique key of a registered resource pool.
///
/// # Constraints:
/// - **Immutable**: Once registered, NEVER changes
/// - **Never recycled**: A pool can be frozen but not deleted
pub type ResourceId = u32;

/// Allocation request ID - assigned sequentially at submission.
///
/// Starts at 1 and is strictly increasing. Failed submissions do not
/// consume an id, so the sequence is also gap-free per engine instance.
pub type RequestId = u64;

/// Amount of resource units. All supply/balance arithmetic is checked.
pub type Amount = u64;

/// Timestamp in unix seconds.
pub type Timestamp = u64;

/// Maximum accepted length of a principal identity string.
pub const MAX_PRINCIPAL_LEN: usize = 64;

/// Current wall-clock time in unix seconds.
#[inline]
pub fn now_ts() -> Timestamp {
    chrono::Utc::now().timestamp().max(0) as Timestamp
}

/// Opaque, globally unique account identity.
///
/// The transport layer authenticates the caller; by the time a value of
/// this type exists it is a well-formed identity: non-empty, at most
/// [`MAX_PRINCIPAL_LEN`] bytes, no interior whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(String);

impl Principal {
    /// Validate and wrap an identity string.
    pub fn new(id: impl Into<String>) -> Result<Self, PrincipalError> {
        let id = id.into();
        if id.is_empty() {
            return Err(PrincipalError::Empty);
        }
        if id.len() > MAX_PRINCIPAL_LEN {
            return Err(PrincipalError::TooLong(id.len()));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(PrincipalError::Whitespace);
        }
        Ok(Self(id))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Principal {
    type Err = PrincipalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Principal::new(s)
    }
}

impl TryFrom<String> for Principal {
    type Error = PrincipalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Principal::new(value)
    }
}

impl From<Principal> for String {
    fn from(p: Principal) -> Self {
        p.0
    }
}

/// Rejection reasons for malformed identity strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrincipalError {
    #[error("principal must not be empty")]
    Empty,

    #[error("principal exceeds maximum length ({0} bytes)")]
    TooLong(usize),

    #[error("principal must not contain whitespace")]
    Whitespace,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_accepts_plain_ids() {
        let p = Principal::new("acct-42").unwrap();
        assert_eq!(p.as_str(), "acct-42");
        assert_eq!(p.to_string(), "acct-42");
    }

    #[test]
    fn test_principal_rejects_empty() {
        assert_eq!(Principal::new(""), Err(PrincipalError::Empty));
    }

    #[test]
    fn test_principal_rejects_whitespace() {
        assert_eq!(Principal::new("acct 42"), Err(PrincipalError::Whitespace));
    }

    #[test]
    fn test_principal_rejects_oversized() {
        let long = "x".repeat(MAX_PRINCIPAL_LEN + 1);
        assert!(matches!(
            Principal::new(long),
            Err(PrincipalError::TooLong(_))
        ));
    }

    #[test]
    fn test_principal_parses_from_str() {
        let p: Principal = "ops-admin".parse().unwrap();
        assert_eq!(p.as_str(), "ops-admin");
    }
}
