//! Error types for identity value validation.

use thiserror::Error;

/// Errors returned while constructing identity values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityDomainError {
    /// The textual user identifier is not a valid UUID.
    #[error("invalid user identifier: '{0}'")]
    InvalidUserId(String),

    /// The username is empty after trimming.
    #[error("username must not be empty")]
    EmptyUsername,

    /// The search fragment is too short to be useful.
    #[error("username search requires at least {min} characters")]
    SearchFragmentTooShort {
        /// Minimum accepted fragment length.
        min: usize,
    },
}
