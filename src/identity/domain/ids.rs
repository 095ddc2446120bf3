//! Canonical user identifier.

use super::{IdentityDomainError, UserProfile};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque identifier of a user owned by the identity provider.
///
/// The canonical textual form is the lower-case hyphenated UUID. All
/// membership and ownership comparisons go through [`AsUserId`] so that a
/// bare identifier and an expanded profile compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random user identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a user identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parses a textual identifier, tolerating case and surrounding
    /// whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDomainError::InvalidUserId`] when the value is not a
    /// UUID.
    pub fn parse(value: &str) -> Result<Self, IdentityDomainError> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| IdentityDomainError::InvalidUserId(value.to_owned()))
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }

    /// Returns the canonical string form used for equality across
    /// representations.
    #[must_use]
    pub fn canonical(self) -> String {
        self.0.hyphenated().to_string()
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for UserId {
    type Err = IdentityDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Anything that can stand in for a user when checking membership.
///
/// Implemented for raw identifiers and for expanded profiles; callers never
/// compare mixed representations directly.
pub trait AsUserId {
    /// Extracts the canonical user identifier.
    fn user_id(&self) -> UserId;
}

impl AsUserId for UserId {
    fn user_id(&self) -> UserId {
        *self
    }
}

impl AsUserId for UserProfile {
    fn user_id(&self) -> UserId {
        self.id()
    }
}

impl<T: AsUserId + ?Sized> AsUserId for &T {
    fn user_id(&self) -> UserId {
        (**self).user_id()
    }
}
