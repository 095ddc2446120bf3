//! In-memory identity directory for tests and local development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::identity::{
    domain::{UserId, UserProfile, Username},
    ports::{IdentityDirectory, IdentityDirectoryError, IdentityDirectoryResult},
};

/// Thread-safe in-memory identity directory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityDirectory {
    users: Arc<RwLock<HashMap<UserId, UserProfile>>>,
}

impl InMemoryIdentityDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a user profile.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityDirectoryError::Provider`] when the directory lock
    /// is poisoned.
    pub fn register(&self, profile: UserProfile) -> IdentityDirectoryResult<()> {
        let mut users = self.users.write().map_err(|err| {
            IdentityDirectoryError::provider(std::io::Error::other(err.to_string()))
        })?;
        users.insert(profile.id(), profile);
        Ok(())
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryIdentityDirectory {
    async fn find_by_id(&self, id: UserId) -> IdentityDirectoryResult<Option<UserProfile>> {
        let users = self.users.read().map_err(|err| {
            IdentityDirectoryError::provider(std::io::Error::other(err.to_string()))
        })?;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> IdentityDirectoryResult<Option<UserProfile>> {
        let users = self.users.read().map_err(|err| {
            IdentityDirectoryError::provider(std::io::Error::other(err.to_string()))
        })?;
        Ok(users
            .values()
            .find(|profile| profile.username() == username)
            .cloned())
    }

    async fn search(
        &self,
        fragment: &str,
        exclude: UserId,
        limit: usize,
    ) -> IdentityDirectoryResult<Vec<UserProfile>> {
        let users = self.users.read().map_err(|err| {
            IdentityDirectoryError::provider(std::io::Error::other(err.to_string()))
        })?;
        let needle = fragment.to_lowercase();
        let mut matches: Vec<UserProfile> = users
            .values()
            .filter(|profile| profile.id() != exclude)
            .filter(|profile| profile.username().as_str().to_lowercase().contains(&needle))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.username().as_str().cmp(b.username().as_str()));
        matches.truncate(limit);
        Ok(matches)
    }
}
