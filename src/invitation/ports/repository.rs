//! Repository port for invitation persistence.

use crate::identity::domain::UserId;
use crate::invitation::domain::{Invitation, InvitationId, InvitationStatus};
use crate::project::domain::ProjectId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for invitation repository operations.
pub type InvitationRepositoryResult<T> = Result<T, InvitationRepositoryError>;

/// Invitation persistence contract.
///
/// Implementations enforce that at most one `pending` invitation exists per
/// project and invitee. Status writes are compare-and-set on `pending`, so
/// two concurrent resolutions of the same invitation cannot both succeed.
#[async_trait]
pub trait InvitationRepository: Send + Sync {
    /// Stores a new invitation.
    ///
    /// # Errors
    ///
    /// Returns [`InvitationRepositoryError::DuplicateInvitation`] when the
    /// identifier exists, or [`InvitationRepositoryError::DuplicatePending`]
    /// when a pending invitation already targets the same invitee for the
    /// same project.
    async fn store(&self, invitation: &Invitation) -> InvitationRepositoryResult<()>;

    /// Finds an invitation by identifier.
    ///
    /// Returns `None` when the invitation does not exist.
    async fn find_by_id(&self, id: InvitationId) -> InvitationRepositoryResult<Option<Invitation>>;

    /// Returns pending invitations addressed to `invitee`, newest first.
    async fn list_pending_for_invitee(
        &self,
        invitee: UserId,
    ) -> InvitationRepositoryResult<Vec<Invitation>>;

    /// Returns pending invitations for `project_id`, newest first.
    async fn list_pending_for_project(
        &self,
        project_id: ProjectId,
    ) -> InvitationRepositoryResult<Vec<Invitation>>;

    /// Persists the status and timestamp of `invitation` provided the stored
    /// record is still pending.
    ///
    /// # Errors
    ///
    /// Returns [`InvitationRepositoryError::NotFound`] when the record is
    /// gone, or [`InvitationRepositoryError::NotPending`] when another writer
    /// resolved it first.
    async fn resolve(&self, invitation: &Invitation) -> InvitationRepositoryResult<()>;

    /// Hard-deletes a pending invitation.
    ///
    /// # Errors
    ///
    /// Returns [`InvitationRepositoryError::NotFound`] when the record is
    /// gone, or [`InvitationRepositoryError::NotPending`] when it has been
    /// resolved.
    async fn delete_pending(&self, id: InvitationId) -> InvitationRepositoryResult<()>;

    /// Deletes every invitation whose expiry is at or before `now`,
    /// whatever its status. Returns the number of records removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> InvitationRepositoryResult<usize>;
}

/// Errors returned by invitation repository implementations.
#[derive(Debug, Clone, Error)]
pub enum InvitationRepositoryError {
    /// An invitation with the same identifier already exists.
    #[error("duplicate invitation identifier: {0}")]
    DuplicateInvitation(InvitationId),

    /// A pending invitation already exists for the project and invitee.
    #[error("a pending invitation for user {invitee} to project {project_id} already exists")]
    DuplicatePending {
        /// Target project.
        project_id: ProjectId,
        /// Invited user.
        invitee: UserId,
    },

    /// The invitation was not found.
    #[error("invitation not found: {0}")]
    NotFound(InvitationId),

    /// The invitation is no longer pending.
    #[error("invitation is no longer pending (status: {0})")]
    NotPending(InvitationStatus),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl InvitationRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
