//! Invitation creation, listing, cancellation and expiry sweep.

use crate::{
    error::ErrorKind,
    identity::{
        domain::UserId,
        ports::{IdentityDirectory, IdentityDirectoryError},
    },
    invitation::{
        domain::{Invitation, InvitationDomainError, InvitationId, InvitationMessage, NewInvitation},
        ports::{InvitationRepository, InvitationRepositoryError},
    },
    project::{
        domain::{Project, ProjectId},
        ports::{ProjectRepository, ProjectRepositoryError},
    },
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Request payload for inviting a user to a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateInvitationRequest {
    invitee: UserId,
    message: Option<String>,
}

impl CreateInvitationRequest {
    /// Creates a request addressed to `invitee` with the default message.
    #[must_use]
    pub const fn new(invitee: UserId) -> Self {
        Self {
            invitee,
            message: None,
        }
    }

    /// Sets a custom message. A blank message falls back to the default.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Service-level errors for invitation ledger operations.
#[derive(Debug, Error)]
pub enum InvitationServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] InvitationDomainError),
    /// Invitation persistence failed.
    #[error(transparent)]
    Repository(#[from] InvitationRepositoryError),
    /// Project lookup failed.
    #[error(transparent)]
    Projects(#[from] ProjectRepositoryError),
    /// Identity lookup failed.
    #[error(transparent)]
    Directory(#[from] IdentityDirectoryError),
    /// The project does not exist.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),
    /// The invitee does not exist.
    #[error("user not found: {0}")]
    UserNotFound(UserId),
    /// The invitation does not exist.
    #[error("invitation not found: {0}")]
    InvitationNotFound(InvitationId),
    /// Only the project owner may perform the action.
    #[error("only the project owner can {action}")]
    NotOwner {
        /// Refused action, for the message.
        action: &'static str,
    },
    /// Only the inviter may cancel the invitation.
    #[error("only the inviter can cancel this invitation")]
    NotInviter,
    /// The invitee already belongs to the project.
    #[error("user {0} is already a member of this project")]
    AlreadyMember(UserId),
    /// A pending invitation already exists for the invitee.
    #[error("an invitation is already pending for user {invitee}")]
    AlreadyInvited {
        /// Invited user.
        invitee: UserId,
    },
    /// The invitation has already been accepted or rejected.
    #[error("invitation has already been processed")]
    AlreadyProcessed(InvitationId),
}

impl InvitationServiceError {
    /// Classifies the error for the boundary.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(InvitationDomainError::AlreadyProcessed { .. })
            | Self::AlreadyMember(_)
            | Self::AlreadyInvited { .. }
            | Self::AlreadyProcessed(_)
            | Self::Repository(
                InvitationRepositoryError::DuplicateInvitation(_)
                | InvitationRepositoryError::DuplicatePending { .. }
                | InvitationRepositoryError::NotPending(_),
            ) => ErrorKind::Conflict,
            Self::Domain(_) => ErrorKind::Validation,
            Self::ProjectNotFound(_)
            | Self::UserNotFound(_)
            | Self::InvitationNotFound(_)
            | Self::Repository(InvitationRepositoryError::NotFound(_))
            | Self::Projects(ProjectRepositoryError::NotFound(_)) => ErrorKind::NotFound,
            Self::NotOwner { .. } | Self::NotInviter => ErrorKind::Permission,
            Self::Repository(InvitationRepositoryError::Persistence(_))
            | Self::Projects(_)
            | Self::Directory(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for invitation ledger service operations.
pub type InvitationServiceResult<T> = Result<T, InvitationServiceError>;

/// Invitation ledger orchestration service.
pub struct InvitationLedgerService<I, P, D, C>
where
    I: InvitationRepository + ?Sized,
    P: ProjectRepository + ?Sized,
    D: IdentityDirectory + ?Sized,
    C: Clock + Send + Sync,
{
    invitations: Arc<I>,
    projects: Arc<P>,
    directory: Arc<D>,
    clock: Arc<C>,
}

impl<I, P, D, C> Clone for InvitationLedgerService<I, P, D, C>
where
    I: InvitationRepository + ?Sized,
    P: ProjectRepository + ?Sized,
    D: IdentityDirectory + ?Sized,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            invitations: Arc::clone(&self.invitations),
            projects: Arc::clone(&self.projects),
            directory: Arc::clone(&self.directory),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<I, P, D, C> InvitationLedgerService<I, P, D, C>
where
    I: InvitationRepository + ?Sized,
    P: ProjectRepository + ?Sized,
    D: IdentityDirectory + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates a new invitation ledger service.
    #[must_use]
    pub const fn new(invitations: Arc<I>, projects: Arc<P>, directory: Arc<D>, clock: Arc<C>) -> Self {
        Self {
            invitations,
            projects,
            directory,
            clock,
        }
    }

    /// Invites a user to a project on behalf of its owner.
    ///
    /// Preconditions are checked in order and the first failure wins:
    /// project exists, inviter owns it, invitee exists, invitee is not a
    /// member, no pending invitation already targets the invitee. The last
    /// check is enforced again by the store, so concurrent duplicates still
    /// fail with a conflict.
    ///
    /// # Errors
    ///
    /// Returns [`InvitationServiceError::ProjectNotFound`],
    /// [`InvitationServiceError::NotOwner`],
    /// [`InvitationServiceError::UserNotFound`],
    /// [`InvitationServiceError::AlreadyMember`] or
    /// [`InvitationServiceError::AlreadyInvited`] for the respective failed
    /// precondition, and [`InvitationServiceError::Domain`] when the message
    /// is too long.
    pub async fn create(
        &self,
        project_id: ProjectId,
        inviter: UserId,
        request: CreateInvitationRequest,
    ) -> InvitationServiceResult<Invitation> {
        let CreateInvitationRequest {
            invitee,
            message: custom_message,
        } = request;
        let project = self.find_project(project_id).await?;
        if !project.is_owner(&inviter) {
            return Err(InvitationServiceError::NotOwner {
                action: "send invitations",
            });
        }
        if self.directory.find_by_id(invitee).await?.is_none() {
            return Err(InvitationServiceError::UserNotFound(invitee));
        }
        if project.is_member(&invitee) {
            return Err(InvitationServiceError::AlreadyMember(invitee));
        }
        let already_pending = self
            .invitations
            .list_pending_for_project(project_id)
            .await?
            .iter()
            .any(|invitation| invitation.invitee() == invitee);
        if already_pending {
            return Err(InvitationServiceError::AlreadyInvited { invitee });
        }

        let message = custom_message
            .filter(|text| !text.trim().is_empty())
            .map_or_else(
                || InvitationMessage::default_for(project.name().as_str()),
                InvitationMessage::new,
            )?;
        let invitation = Invitation::new(
            NewInvitation {
                project_id,
                inviter,
                invitee,
                message,
            },
            &*self.clock,
        );
        match self.invitations.store(&invitation).await {
            Ok(()) => {}
            Err(InvitationRepositoryError::DuplicatePending { .. }) => {
                return Err(InvitationServiceError::AlreadyInvited { invitee });
            }
            Err(err) => return Err(err.into()),
        }
        info!(
            invitation_id = %invitation.id(),
            project_id = %project_id,
            invitee = %invitee,
            "invitation created"
        );
        Ok(invitation)
    }

    /// Loads an invitation without an access check.
    ///
    /// # Errors
    ///
    /// Returns [`InvitationServiceError::Repository`] when persistence lookup
    /// fails.
    pub async fn find(&self, id: InvitationId) -> InvitationServiceResult<Option<Invitation>> {
        Ok(self.invitations.find_by_id(id).await?)
    }

    /// Returns the pending invitations addressed to `invitee`, newest first.
    ///
    /// Expired invitations that have not been swept yet are included.
    ///
    /// # Errors
    ///
    /// Returns [`InvitationServiceError::Repository`] when persistence lookup
    /// fails.
    pub async fn list_for_invitee(&self, invitee: UserId) -> InvitationServiceResult<Vec<Invitation>> {
        Ok(self.invitations.list_pending_for_invitee(invitee).await?)
    }

    /// Returns the pending invitations of a project for its owner.
    ///
    /// # Errors
    ///
    /// Returns [`InvitationServiceError::ProjectNotFound`] when the project
    /// does not exist or [`InvitationServiceError::NotOwner`] when
    /// `requester` does not own it.
    pub async fn list_for_project(
        &self,
        project_id: ProjectId,
        requester: UserId,
    ) -> InvitationServiceResult<Vec<Invitation>> {
        let project = self.find_project(project_id).await?;
        if !project.is_owner(&requester) {
            return Err(InvitationServiceError::NotOwner {
                action: "view project invitations",
            });
        }
        Ok(self.invitations.list_pending_for_project(project_id).await?)
    }

    /// Hard-deletes a pending invitation on behalf of its inviter.
    ///
    /// Returns the invitation as it was before deletion.
    ///
    /// # Errors
    ///
    /// Returns [`InvitationServiceError::InvitationNotFound`] when the
    /// invitation does not exist (or was deleted concurrently),
    /// [`InvitationServiceError::NotInviter`] when `requester` did not send
    /// it, and [`InvitationServiceError::AlreadyProcessed`] when it has been
    /// accepted or rejected.
    pub async fn cancel(
        &self,
        id: InvitationId,
        requester: UserId,
    ) -> InvitationServiceResult<Invitation> {
        let invitation = self
            .invitations
            .find_by_id(id)
            .await?
            .ok_or(InvitationServiceError::InvitationNotFound(id))?;
        if invitation.inviter() != requester {
            return Err(InvitationServiceError::NotInviter);
        }
        if !invitation.is_pending() {
            return Err(InvitationServiceError::AlreadyProcessed(id));
        }
        match self.invitations.delete_pending(id).await {
            Ok(()) => {}
            Err(InvitationRepositoryError::NotFound(_)) => {
                return Err(InvitationServiceError::InvitationNotFound(id));
            }
            Err(InvitationRepositoryError::NotPending(_)) => {
                return Err(InvitationServiceError::AlreadyProcessed(id));
            }
            Err(err) => return Err(err.into()),
        }
        info!(invitation_id = %id, project_id = %invitation.project_id(), "invitation cancelled");
        Ok(invitation)
    }

    /// Physically removes every invitation whose expiry is at or before now.
    ///
    /// # Errors
    ///
    /// Returns [`InvitationServiceError::Repository`] when the sweep fails.
    pub async fn purge_expired(&self) -> InvitationServiceResult<usize> {
        let removed = self.invitations.purge_expired(self.clock.utc()).await?;
        if removed > 0 {
            info!(removed, "expired invitations purged");
        }
        Ok(removed)
    }

    async fn find_project(&self, id: ProjectId) -> InvitationServiceResult<Project> {
        self.projects
            .find_by_id(id)
            .await?
            .ok_or(InvitationServiceError::ProjectNotFound(id))
    }
}
