//! Invitation aggregate root.

use super::{InvitationDomainError, InvitationId, InvitationMessage, InvitationStatus};
use crate::identity::domain::UserId;
use crate::project::domain::ProjectId;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Lifetime of an invitation, fixed at creation and never extended.
pub const INVITATION_TTL_DAYS: i64 = 7;

/// Invitation aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    id: InvitationId,
    project_id: ProjectId,
    inviter: UserId,
    invitee: UserId,
    status: InvitationStatus,
    message: InvitationMessage,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// Validated inputs for a new invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvitation {
    /// Project the invitee is asked to join.
    pub project_id: ProjectId,
    /// Project owner sending the invitation.
    pub inviter: UserId,
    /// User being invited.
    pub invitee: UserId,
    /// Message shown to the invitee.
    pub message: InvitationMessage,
}

/// Parameter object for reconstructing a persisted invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedInvitationData {
    /// Persisted identifier.
    pub id: InvitationId,
    /// Persisted project reference.
    pub project_id: ProjectId,
    /// Persisted inviter.
    pub inviter: UserId,
    /// Persisted invitee.
    pub invitee: UserId,
    /// Persisted status.
    pub status: InvitationStatus,
    /// Persisted message.
    pub message: InvitationMessage,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest transition timestamp.
    pub updated_at: DateTime<Utc>,
    /// Persisted expiry deadline.
    pub expires_at: DateTime<Utc>,
}

impl Invitation {
    /// Creates a pending invitation expiring [`INVITATION_TTL_DAYS`] days from
    /// now.
    #[must_use]
    pub fn new(params: NewInvitation, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: InvitationId::new(),
            project_id: params.project_id,
            inviter: params.inviter,
            invitee: params.invitee,
            status: InvitationStatus::Pending,
            message: params.message,
            created_at: timestamp,
            updated_at: timestamp,
            expires_at: timestamp + TimeDelta::days(INVITATION_TTL_DAYS),
        }
    }

    /// Reconstructs an invitation from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedInvitationData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            inviter: data.inviter,
            invitee: data.invitee,
            status: data.status,
            message: data.message,
            created_at: data.created_at,
            updated_at: data.updated_at,
            expires_at: data.expires_at,
        }
    }

    /// Returns the invitation identifier.
    #[must_use]
    pub const fn id(&self) -> InvitationId {
        self.id
    }

    /// Returns the project reference.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the inviter.
    #[must_use]
    pub const fn inviter(&self) -> UserId {
        self.inviter
    }

    /// Returns the invitee.
    #[must_use]
    pub const fn invitee(&self) -> UserId {
        self.invitee
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> InvitationStatus {
        self.status
    }

    /// Returns the message.
    #[must_use]
    pub const fn message(&self) -> &InvitationMessage {
        &self.message
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest transition timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the expiry deadline.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns `true` while the invitation awaits a decision.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == InvitationStatus::Pending
    }

    /// Returns `true` when `now` is strictly past the expiry deadline.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Transitions `pending → accepted`.
    ///
    /// Expiry is not checked here; the coordinator refuses expired
    /// acceptances before calling this.
    ///
    /// # Errors
    ///
    /// Returns [`InvitationDomainError::AlreadyProcessed`] when the
    /// invitation is no longer pending.
    pub fn accept(&mut self, clock: &impl Clock) -> Result<(), InvitationDomainError> {
        self.resolve(InvitationStatus::Accepted, clock)
    }

    /// Transitions `pending → rejected`. Allowed after expiry.
    ///
    /// # Errors
    ///
    /// Returns [`InvitationDomainError::AlreadyProcessed`] when the
    /// invitation is no longer pending.
    pub fn reject(&mut self, clock: &impl Clock) -> Result<(), InvitationDomainError> {
        self.resolve(InvitationStatus::Rejected, clock)
    }

    fn resolve(
        &mut self,
        target: InvitationStatus,
        clock: &impl Clock,
    ) -> Result<(), InvitationDomainError> {
        if self.status.is_terminal() {
            return Err(InvitationDomainError::AlreadyProcessed {
                id: self.id,
                status: self.status,
            });
        }
        self.status = target;
        self.updated_at = clock.utc();
        Ok(())
    }
}
