//! In-memory acceptance store over the in-memory project and invitation
//! repositories.

use crate::invitation::{adapters::memory::InMemoryInvitationRepository, domain::Invitation};
use crate::membership::ports::{AcceptanceStore, AcceptanceStoreError, AcceptanceStoreResult};
use crate::project::{adapters::memory::InMemoryProjectRepository, domain::Project};
use async_trait::async_trait;

/// Acceptance store sharing state with in-memory repositories.
///
/// Both tables are locked for the duration of a commit, projects first,
/// so no reader observes one write without the other.
#[derive(Debug, Clone)]
pub struct InMemoryAcceptanceStore {
    projects: InMemoryProjectRepository,
    invitations: InMemoryInvitationRepository,
}

impl InMemoryAcceptanceStore {
    /// Creates a store over the given repositories. The repositories are
    /// cheap handles onto shared state.
    #[must_use]
    pub const fn new(
        projects: InMemoryProjectRepository,
        invitations: InMemoryInvitationRepository,
    ) -> Self {
        Self {
            projects,
            invitations,
        }
    }
}

#[async_trait]
impl AcceptanceStore for InMemoryAcceptanceStore {
    async fn commit_acceptance(&self, invitation: &Invitation) -> AcceptanceStoreResult<Project> {
        let mut projects = self.projects.write_table()?;
        let mut invitations = self
            .invitations
            .write_table()
            .map_err(AcceptanceStoreError::persistence)?;

        let stored = invitations
            .get(invitation.id())
            .ok_or(AcceptanceStoreError::InvitationNotFound(invitation.id()))?;
        if !stored.is_pending() {
            return Err(AcceptanceStoreError::InvitationNotPending {
                id: invitation.id(),
                status: stored.status(),
            });
        }
        let mut project = projects
            .get(invitation.project_id())
            .cloned()
            .ok_or(AcceptanceStoreError::ProjectNotFound(invitation.project_id()))?;

        if project.add_member_at(invitation.invitee(), invitation.updated_at()) {
            let version = projects.commit(&project)?;
            project.record_commit(version);
        }
        invitations
            .resolve(invitation)
            .map_err(|err| AcceptanceStoreError::from_invitation(invitation, err))?;
        Ok(project)
    }

    async fn repair_membership(&self, invitation: &Invitation) -> AcceptanceStoreResult<bool> {
        let mut projects = self.projects.write_table()?;
        let mut project = projects
            .get(invitation.project_id())
            .cloned()
            .ok_or(AcceptanceStoreError::ProjectNotFound(invitation.project_id()))?;
        if !project.add_member_at(invitation.invitee(), invitation.updated_at()) {
            return Ok(false);
        }
        projects.commit(&project)?;
        Ok(true)
    }
}
