//! In-memory repository for invitation ledger tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::identity::domain::UserId;
use crate::invitation::{
    domain::{Invitation, InvitationId},
    ports::{InvitationRepository, InvitationRepositoryError, InvitationRepositoryResult},
};
use crate::project::domain::ProjectId;

/// Thread-safe in-memory invitation repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInvitationRepository {
    state: Arc<RwLock<InvitationTable>>,
}

/// Stored invitations plus the pending-uniqueness index.
#[derive(Debug, Default)]
pub(crate) struct InvitationTable {
    invitations: HashMap<InvitationId, Invitation>,
    pending: HashMap<(ProjectId, UserId), InvitationId>,
}

impl InvitationTable {
    /// Returns a stored invitation.
    pub(crate) fn get(&self, id: InvitationId) -> Option<&Invitation> {
        self.invitations.get(&id)
    }

    /// Writes the status of `invitation` if the stored record is pending.
    pub(crate) fn resolve(&mut self, invitation: &Invitation) -> InvitationRepositoryResult<()> {
        let stored = self
            .invitations
            .get_mut(&invitation.id())
            .ok_or(InvitationRepositoryError::NotFound(invitation.id()))?;
        if !stored.is_pending() {
            return Err(InvitationRepositoryError::NotPending(stored.status()));
        }
        *stored = invitation.clone();
        if !invitation.is_pending() {
            self.pending
                .remove(&(invitation.project_id(), invitation.invitee()));
        }
        Ok(())
    }

    fn remove(&mut self, id: InvitationId) -> Option<Invitation> {
        let removed = self.invitations.remove(&id)?;
        let key = (removed.project_id(), removed.invitee());
        if self.pending.get(&key) == Some(&id) {
            self.pending.remove(&key);
        }
        Some(removed)
    }

    fn pending_matching(&self, predicate: impl Fn(&Invitation) -> bool) -> Vec<Invitation> {
        let mut matches: Vec<Invitation> = self
            .invitations
            .values()
            .filter(|invitation| invitation.is_pending() && predicate(invitation))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        matches
    }
}

impl InMemoryInvitationRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the write lock on the invitation table.
    pub(crate) fn write_table(
        &self,
    ) -> InvitationRepositoryResult<RwLockWriteGuard<'_, InvitationTable>> {
        self.state.write().map_err(|err| {
            InvitationRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn read_table(&self) -> InvitationRepositoryResult<RwLockReadGuard<'_, InvitationTable>> {
        self.state.read().map_err(|err| {
            InvitationRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl InvitationRepository for InMemoryInvitationRepository {
    async fn store(&self, invitation: &Invitation) -> InvitationRepositoryResult<()> {
        let mut state = self.write_table()?;
        if state.invitations.contains_key(&invitation.id()) {
            return Err(InvitationRepositoryError::DuplicateInvitation(
                invitation.id(),
            ));
        }
        let key = (invitation.project_id(), invitation.invitee());
        if invitation.is_pending() {
            if state.pending.contains_key(&key) {
                return Err(InvitationRepositoryError::DuplicatePending {
                    project_id: key.0,
                    invitee: key.1,
                });
            }
            state.pending.insert(key, invitation.id());
        }
        state.invitations.insert(invitation.id(), invitation.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: InvitationId) -> InvitationRepositoryResult<Option<Invitation>> {
        let state = self.read_table()?;
        Ok(state.invitations.get(&id).cloned())
    }

    async fn list_pending_for_invitee(
        &self,
        invitee: UserId,
    ) -> InvitationRepositoryResult<Vec<Invitation>> {
        let state = self.read_table()?;
        Ok(state.pending_matching(|invitation| invitation.invitee() == invitee))
    }

    async fn list_pending_for_project(
        &self,
        project_id: ProjectId,
    ) -> InvitationRepositoryResult<Vec<Invitation>> {
        let state = self.read_table()?;
        Ok(state.pending_matching(|invitation| invitation.project_id() == project_id))
    }

    async fn resolve(&self, invitation: &Invitation) -> InvitationRepositoryResult<()> {
        let mut state = self.write_table()?;
        state.resolve(invitation)
    }

    async fn delete_pending(&self, id: InvitationId) -> InvitationRepositoryResult<()> {
        let mut state = self.write_table()?;
        let stored = state
            .invitations
            .get(&id)
            .ok_or(InvitationRepositoryError::NotFound(id))?;
        if !stored.is_pending() {
            return Err(InvitationRepositoryError::NotPending(stored.status()));
        }
        state.remove(id);
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> InvitationRepositoryResult<usize> {
        let mut state = self.write_table()?;
        let expired: Vec<InvitationId> = state
            .invitations
            .values()
            .filter(|invitation| invitation.expires_at() <= now)
            .map(Invitation::id)
            .collect();
        for id in &expired {
            state.remove(*id);
        }
        Ok(expired.len())
    }
}
