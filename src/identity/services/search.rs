//! Profile lookup and username search on top of the identity directory.

use crate::{
    error::ErrorKind,
    identity::{
        domain::{IdentityDomainError, UserId, UserProfile},
        ports::{IdentityDirectory, IdentityDirectoryError},
    },
};
use std::sync::Arc;
use thiserror::Error;

/// Shortest accepted search fragment, in characters.
pub const MIN_SEARCH_FRAGMENT: usize = 2;

/// Largest number of profiles returned by one search.
pub const MAX_SEARCH_RESULTS: usize = 10;

/// Errors returned by [`UserSearchService`].
#[derive(Debug, Error)]
pub enum UserSearchError {
    /// Input validation failed.
    #[error(transparent)]
    Domain(#[from] IdentityDomainError),
    /// The directory lookup failed.
    #[error(transparent)]
    Directory(#[from] IdentityDirectoryError),
    /// The directory has no profile for the user.
    #[error("user not found: {0}")]
    UserNotFound(UserId),
}

impl UserSearchError {
    /// Classifies the error for the boundary.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_) => ErrorKind::Validation,
            Self::Directory(_) => ErrorKind::Internal,
            Self::UserNotFound(_) => ErrorKind::NotFound,
        }
    }
}

/// Searches the directory on behalf of an authenticated caller.
pub struct UserSearchService<D>
where
    D: IdentityDirectory + ?Sized,
{
    directory: Arc<D>,
}

impl<D> Clone for UserSearchService<D>
where
    D: IdentityDirectory + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
        }
    }
}

impl<D> UserSearchService<D>
where
    D: IdentityDirectory + ?Sized,
{
    /// Creates a new search service.
    #[must_use]
    pub const fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// Returns the profile of `user`.
    ///
    /// # Errors
    ///
    /// Returns [`UserSearchError::UserNotFound`] when the directory does not
    /// know the user, or [`UserSearchError::Directory`] when the lookup
    /// fails.
    pub async fn profile(&self, user: UserId) -> Result<UserProfile, UserSearchError> {
        self.directory
            .find_by_id(user)
            .await?
            .ok_or(UserSearchError::UserNotFound(user))
    }

    /// Finds users whose username contains `fragment`, excluding the caller.
    ///
    /// # Errors
    ///
    /// Returns [`UserSearchError::Domain`] when the trimmed fragment is
    /// shorter than [`MIN_SEARCH_FRAGMENT`] characters, or
    /// [`UserSearchError::Directory`] when the lookup fails.
    pub async fn search(
        &self,
        requester: UserId,
        fragment: &str,
    ) -> Result<Vec<UserProfile>, UserSearchError> {
        let trimmed = fragment.trim();
        if trimmed.chars().count() < MIN_SEARCH_FRAGMENT {
            return Err(IdentityDomainError::SearchFragmentTooShort {
                min: MIN_SEARCH_FRAGMENT,
            }
            .into());
        }
        Ok(self
            .directory
            .search(trimmed, requester, MAX_SEARCH_RESULTS)
            .await?)
    }
}
