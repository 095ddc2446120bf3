//! Boundary classification shared by every service error.
//!
//! Services keep their own detailed error enums; the boundary only needs to
//! know which family a failure belongs to.

use serde::Serialize;
use std::fmt;

/// Family of a service failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The addressed entity does not exist.
    NotFound,
    /// The caller is authenticated but not allowed to perform the action.
    Permission,
    /// The action conflicts with current state or a uniqueness rule.
    Conflict,
    /// The input is malformed.
    Validation,
    /// A time-bound action was attempted past its deadline.
    Expired,
    /// Infrastructure failure outside the caller's control.
    Internal,
}

impl ErrorKind {
    /// Returns the snake-case label used in response bodies.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Permission => "permission",
            Self::Conflict => "conflict",
            Self::Validation => "validation",
            Self::Expired => "expired",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
