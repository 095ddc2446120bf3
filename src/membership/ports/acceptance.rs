//! Atomic acceptance port spanning the invitation and project stores.

use crate::invitation::{
    domain::{Invitation, InvitationId, InvitationStatus},
    ports::InvitationRepositoryError,
};
use crate::project::{
    domain::{Project, ProjectId},
    ports::ProjectRepositoryError,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for acceptance store operations.
pub type AcceptanceStoreResult<T> = Result<T, AcceptanceStoreError>;

/// Commits invitation acceptance and project membership as one unit.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AcceptanceStore: Send + Sync {
    /// Persists an accepted invitation together with the invitee's
    /// membership.
    ///
    /// `invitation` carries the already-transitioned `accepted` state. The
    /// stored invitation must still be pending; the invitee is added to the
    /// project if absent and the project version is bumped when the member
    /// was added. Either both writes are committed or neither is. Returns
    /// the committed project.
    ///
    /// # Errors
    ///
    /// Returns [`AcceptanceStoreError::InvitationNotFound`] when the
    /// invitation was deleted, [`AcceptanceStoreError::InvitationNotPending`]
    /// when another writer resolved it first, and
    /// [`AcceptanceStoreError::ProjectNotFound`] when the project is gone.
    async fn commit_acceptance(&self, invitation: &Invitation) -> AcceptanceStoreResult<Project>;

    /// Adds the invitee of an accepted invitation to its project if absent.
    ///
    /// Returns `true` when membership had to be restored.
    ///
    /// # Errors
    ///
    /// Returns [`AcceptanceStoreError::ProjectNotFound`] when the project is
    /// gone.
    async fn repair_membership(&self, invitation: &Invitation) -> AcceptanceStoreResult<bool>;
}

/// Errors returned by acceptance store implementations.
#[derive(Debug, Clone, Error)]
pub enum AcceptanceStoreError {
    /// The invitation no longer exists.
    #[error("invitation not found: {0}")]
    InvitationNotFound(InvitationId),

    /// The invitation left the pending state before the commit.
    #[error("invitation {id} is no longer pending (status: {status})")]
    InvitationNotPending {
        /// Invitation identifier.
        id: InvitationId,
        /// Stored status.
        status: InvitationStatus,
    },

    /// The project referenced by the invitation no longer exists.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl AcceptanceStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Translates an invitation store failure raised while resolving
    /// `invitation`.
    #[must_use]
    pub fn from_invitation(invitation: &Invitation, err: InvitationRepositoryError) -> Self {
        match err {
            InvitationRepositoryError::NotFound(id) => Self::InvitationNotFound(id),
            InvitationRepositoryError::NotPending(status) => Self::InvitationNotPending {
                id: invitation.id(),
                status,
            },
            other => Self::persistence(other),
        }
    }
}

impl From<ProjectRepositoryError> for AcceptanceStoreError {
    fn from(err: ProjectRepositoryError) -> Self {
        match err {
            ProjectRepositoryError::NotFound(id) => Self::ProjectNotFound(id),
            other => Self::persistence(other),
        }
    }
}
