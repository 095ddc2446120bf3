//! Read-only directory port backed by the external identity provider.

use crate::identity::domain::{UserId, UserProfile, Username};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for identity directory operations.
pub type IdentityDirectoryResult<T> = Result<T, IdentityDirectoryError>;

/// Identity lookup contract.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Resolves a user by identifier.
    ///
    /// Returns `None` when the user does not exist.
    async fn find_by_id(&self, id: UserId) -> IdentityDirectoryResult<Option<UserProfile>>;

    /// Resolves a user by exact username.
    ///
    /// Returns `None` when no user has the username.
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> IdentityDirectoryResult<Option<UserProfile>>;

    /// Returns users whose username contains `fragment`, ignoring case.
    ///
    /// `exclude` is never part of the result and at most `limit` profiles
    /// are returned, ordered by username.
    async fn search(
        &self,
        fragment: &str,
        exclude: UserId,
        limit: usize,
    ) -> IdentityDirectoryResult<Vec<UserProfile>>;
}

/// Errors returned by identity directory implementations.
#[derive(Debug, Clone, Error)]
pub enum IdentityDirectoryError {
    /// The identity provider could not be reached.
    #[error("identity provider error: {0}")]
    Provider(Arc<dyn std::error::Error + Send + Sync>),
}

impl IdentityDirectoryError {
    /// Wraps a provider error.
    pub fn provider(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Provider(Arc::new(err))
    }
}
