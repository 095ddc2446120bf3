//! Invitation resolution: accept, reject, and repair of half-applied
//! acceptances.

use crate::{
    error::ErrorKind,
    identity::domain::UserId,
    invitation::{
        domain::{Invitation, InvitationDomainError, InvitationId, InvitationStatus},
        ports::{InvitationRepository, InvitationRepositoryError},
    },
    membership::ports::{AcceptanceStore, AcceptanceStoreError},
    notification::{
        domain::{MembershipChange, ProjectEvent},
        ports::NotificationSink,
        publish_best_effort,
    },
    project::domain::{Project, ProjectId},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Result of a successful acceptance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedInvitation {
    /// Invitation in its accepted state.
    pub invitation: Invitation,
    /// Project as committed, with the invitee among its members.
    pub project: Project,
}

/// Service-level errors for invitation resolution.
#[derive(Debug, Error)]
pub enum MembershipServiceError {
    /// Domain transition failed.
    #[error(transparent)]
    Domain(#[from] InvitationDomainError),
    /// Invitation persistence failed.
    #[error(transparent)]
    Invitations(#[from] InvitationRepositoryError),
    /// The atomic acceptance commit failed.
    #[error(transparent)]
    Acceptance(#[from] AcceptanceStoreError),
    /// The invitation does not exist.
    #[error("invitation not found: {0}")]
    InvitationNotFound(InvitationId),
    /// The project referenced by the invitation does not exist.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),
    /// Only the invitee may resolve the invitation.
    #[error("this invitation is not addressed to you")]
    NotInvitee,
    /// The invitation has already been accepted or rejected.
    #[error("invitation has already been processed (status: {status})")]
    AlreadyProcessed {
        /// Invitation identifier.
        id: InvitationId,
        /// Current status.
        status: InvitationStatus,
    },
    /// The invitation can no longer be accepted.
    #[error("invitation expired at {expires_at}")]
    Expired {
        /// Invitation identifier.
        id: InvitationId,
        /// Expiry deadline that has passed.
        expires_at: DateTime<Utc>,
    },
}

impl MembershipServiceError {
    /// Classifies the error for the boundary.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvitationNotFound(_)
            | Self::ProjectNotFound(_)
            | Self::Invitations(InvitationRepositoryError::NotFound(_))
            | Self::Acceptance(
                AcceptanceStoreError::InvitationNotFound(_)
                | AcceptanceStoreError::ProjectNotFound(_),
            ) => ErrorKind::NotFound,
            Self::NotInvitee => ErrorKind::Permission,
            Self::AlreadyProcessed { .. }
            | Self::Domain(InvitationDomainError::AlreadyProcessed { .. })
            | Self::Invitations(InvitationRepositoryError::NotPending(_))
            | Self::Acceptance(AcceptanceStoreError::InvitationNotPending { .. }) => {
                ErrorKind::Conflict
            }
            Self::Domain(_) => ErrorKind::Validation,
            Self::Expired { .. } => ErrorKind::Expired,
            Self::Invitations(_) | Self::Acceptance(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for membership coordinator operations.
pub type MembershipServiceResult<T> = Result<T, MembershipServiceError>;

/// Resolves invitations on behalf of their invitees.
pub struct MembershipCoordinator<I, A, N, C>
where
    I: InvitationRepository + ?Sized,
    A: AcceptanceStore + ?Sized,
    N: NotificationSink + ?Sized,
    C: Clock + Send + Sync,
{
    invitations: Arc<I>,
    acceptance: Arc<A>,
    notifications: Arc<N>,
    clock: Arc<C>,
}

impl<I, A, N, C> Clone for MembershipCoordinator<I, A, N, C>
where
    I: InvitationRepository + ?Sized,
    A: AcceptanceStore + ?Sized,
    N: NotificationSink + ?Sized,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            invitations: Arc::clone(&self.invitations),
            acceptance: Arc::clone(&self.acceptance),
            notifications: Arc::clone(&self.notifications),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<I, A, N, C> MembershipCoordinator<I, A, N, C>
where
    I: InvitationRepository + ?Sized,
    A: AcceptanceStore + ?Sized,
    N: NotificationSink + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates a new coordinator.
    #[must_use]
    pub const fn new(
        invitations: Arc<I>,
        acceptance: Arc<A>,
        notifications: Arc<N>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            invitations,
            acceptance,
            notifications,
            clock,
        }
    }

    /// Accepts an invitation and adds the invitee to the project.
    ///
    /// The status change and the membership change are committed together.
    /// An expired invitation is refused and left pending. When the
    /// invitation is already accepted but the invitee is missing from the
    /// project, membership is restored before the conflict is reported.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipServiceError::InvitationNotFound`] when the
    /// invitation does not exist (including when it is cancelled
    /// concurrently), [`MembershipServiceError::NotInvitee`] when
    /// `requester` is not the invitee,
    /// [`MembershipServiceError::AlreadyProcessed`] when the invitation is
    /// no longer pending, and [`MembershipServiceError::Expired`] once the
    /// expiry deadline has passed.
    pub async fn accept(
        &self,
        id: InvitationId,
        requester: UserId,
    ) -> MembershipServiceResult<AcceptedInvitation> {
        let mut invitation = self.load_for_invitee(id, requester).await?;
        if invitation.status() == InvitationStatus::Accepted {
            self.repair(&invitation).await;
        }
        ensure_pending(&invitation)?;

        let now = self.clock.utc();
        if invitation.is_expired(now) {
            info!(invitation_id = %id, expires_at = %invitation.expires_at(), "refused expired invitation");
            return Err(MembershipServiceError::Expired {
                id,
                expires_at: invitation.expires_at(),
            });
        }

        invitation.accept(&*self.clock)?;
        let project = self
            .acceptance
            .commit_acceptance(&invitation)
            .await
            .map_err(|err| match err {
                AcceptanceStoreError::InvitationNotFound(_) => {
                    MembershipServiceError::InvitationNotFound(id)
                }
                AcceptanceStoreError::InvitationNotPending { status, .. } => {
                    MembershipServiceError::AlreadyProcessed { id, status }
                }
                AcceptanceStoreError::ProjectNotFound(project_id) => {
                    MembershipServiceError::ProjectNotFound(project_id)
                }
                other @ AcceptanceStoreError::Persistence(_) => other.into(),
            })?;

        info!(
            invitation_id = %id,
            project_id = %project.id(),
            user_id = %requester,
            "invitation accepted"
        );
        publish_best_effort(
            &*self.notifications,
            ProjectEvent::MembershipChanged {
                project_id: project.id(),
                user_id: requester,
                change: MembershipChange::Joined { invitation_id: id },
            },
        );
        Ok(AcceptedInvitation {
            invitation,
            project,
        })
    }

    /// Rejects an invitation. Expired invitations may still be rejected.
    ///
    /// # Errors
    ///
    /// Returns [`MembershipServiceError::InvitationNotFound`],
    /// [`MembershipServiceError::NotInvitee`] or
    /// [`MembershipServiceError::AlreadyProcessed`] under the same
    /// conditions as [`Self::accept`].
    pub async fn reject(
        &self,
        id: InvitationId,
        requester: UserId,
    ) -> MembershipServiceResult<Invitation> {
        let mut invitation = self.load_for_invitee(id, requester).await?;
        ensure_pending(&invitation)?;

        invitation.reject(&*self.clock)?;
        match self.invitations.resolve(&invitation).await {
            Ok(()) => {}
            Err(InvitationRepositoryError::NotFound(_)) => {
                return Err(MembershipServiceError::InvitationNotFound(id));
            }
            Err(InvitationRepositoryError::NotPending(status)) => {
                return Err(MembershipServiceError::AlreadyProcessed { id, status });
            }
            Err(err) => return Err(err.into()),
        }
        info!(invitation_id = %id, user_id = %requester, "invitation rejected");
        Ok(invitation)
    }

    async fn load_for_invitee(
        &self,
        id: InvitationId,
        requester: UserId,
    ) -> MembershipServiceResult<Invitation> {
        let invitation = self
            .invitations
            .find_by_id(id)
            .await?
            .ok_or(MembershipServiceError::InvitationNotFound(id))?;
        if invitation.invitee() != requester {
            return Err(MembershipServiceError::NotInvitee);
        }
        Ok(invitation)
    }

    /// Re-drives the membership half of an acceptance. Failures are logged;
    /// the caller reports the conflict either way.
    async fn repair(&self, invitation: &Invitation) {
        match self.acceptance.repair_membership(invitation).await {
            Ok(true) => warn!(
                invitation_id = %invitation.id(),
                project_id = %invitation.project_id(),
                user_id = %invitation.invitee(),
                "restored missing membership for accepted invitation"
            ),
            Ok(false) => {}
            Err(err) => warn!(
                invitation_id = %invitation.id(),
                error = %err,
                "failed to restore membership for accepted invitation"
            ),
        }
    }
}

fn ensure_pending(invitation: &Invitation) -> MembershipServiceResult<()> {
    if invitation.is_pending() {
        Ok(())
    } else {
        Err(MembershipServiceError::AlreadyProcessed {
            id: invitation.id(),
            status: invitation.status(),
        })
    }
}
