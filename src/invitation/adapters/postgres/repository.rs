//! `PostgreSQL` repository implementation for invitation storage.

use super::{
    models::{InvitationRow, NewInvitationRow},
    schema::invitations,
};
use crate::identity::domain::UserId;
use crate::invitation::{
    domain::{
        Invitation, InvitationId, InvitationMessage, InvitationStatus, PersistedInvitationData,
    },
    ports::{InvitationRepository, InvitationRepositoryError, InvitationRepositoryResult},
};
use crate::project::adapters::postgres::ProjectPgPool;
use crate::project::domain::ProjectId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// Partial unique index allowing one pending invitation per project and
/// invitee.
const PENDING_UNIQUE_INDEX: &str = "idx_invitations_pending_unique";

/// `PostgreSQL`-backed invitation repository.
#[derive(Debug, Clone)]
pub struct PostgresInvitationRepository {
    pool: ProjectPgPool,
}

impl PostgresInvitationRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: ProjectPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> InvitationRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> InvitationRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(InvitationRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(InvitationRepositoryError::persistence)?
    }
}

impl From<DieselError> for InvitationRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl InvitationRepository for PostgresInvitationRepository {
    async fn store(&self, invitation: &Invitation) -> InvitationRepositoryResult<()> {
        let id = invitation.id();
        let project_id = invitation.project_id();
        let invitee = invitation.invitee();
        let new_row = to_new_row(invitation);

        self.run_blocking(move |connection| {
            diesel::insert_into(invitations::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if info.constraint_name() == Some(PENDING_UNIQUE_INDEX) =>
                    {
                        InvitationRepositoryError::DuplicatePending {
                            project_id,
                            invitee,
                        }
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        InvitationRepositoryError::DuplicateInvitation(id)
                    }
                    _ => InvitationRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: InvitationId) -> InvitationRepositoryResult<Option<Invitation>> {
        self.run_blocking(move |connection| {
            let row = invitations::table
                .find(id.into_inner())
                .select(InvitationRow::as_select())
                .first::<InvitationRow>(connection)
                .optional()?;
            row.map(row_to_invitation).transpose()
        })
        .await
    }

    async fn list_pending_for_invitee(
        &self,
        invitee: UserId,
    ) -> InvitationRepositoryResult<Vec<Invitation>> {
        self.run_blocking(move |connection| {
            invitations::table
                .filter(invitations::invitee_id.eq(invitee.into_inner()))
                .filter(invitations::status.eq(InvitationStatus::Pending.as_str()))
                .order(invitations::created_at.desc())
                .select(InvitationRow::as_select())
                .load::<InvitationRow>(connection)?
                .into_iter()
                .map(row_to_invitation)
                .collect()
        })
        .await
    }

    async fn list_pending_for_project(
        &self,
        project_id: ProjectId,
    ) -> InvitationRepositoryResult<Vec<Invitation>> {
        self.run_blocking(move |connection| {
            invitations::table
                .filter(invitations::project_id.eq(project_id.into_inner()))
                .filter(invitations::status.eq(InvitationStatus::Pending.as_str()))
                .order(invitations::created_at.desc())
                .select(InvitationRow::as_select())
                .load::<InvitationRow>(connection)?
                .into_iter()
                .map(row_to_invitation)
                .collect()
        })
        .await
    }

    async fn resolve(&self, invitation: &Invitation) -> InvitationRepositoryResult<()> {
        let resolved = invitation.clone();
        self.run_blocking(move |connection| {
            connection.transaction::<_, InvitationRepositoryError, _>(|conn| {
                resolve_pending(conn, &resolved)
            })
        })
        .await
    }

    async fn delete_pending(&self, id: InvitationId) -> InvitationRepositoryResult<()> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, InvitationRepositoryError, _>(|conn| {
                let deleted = diesel::delete(
                    invitations::table
                        .filter(invitations::id.eq(id.into_inner()))
                        .filter(invitations::status.eq(InvitationStatus::Pending.as_str())),
                )
                .execute(conn)?;
                if deleted == 0 {
                    return Err(diagnose_missed_write(conn, id)?);
                }
                Ok(())
            })
        })
        .await
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> InvitationRepositoryResult<usize> {
        self.run_blocking(move |connection| {
            Ok(
                diesel::delete(invitations::table.filter(invitations::expires_at.le(now)))
                    .execute(connection)?,
            )
        })
        .await
    }
}

/// Compare-and-set write of the invitation status on a pending row.
///
/// Must run inside a transaction so the diagnosis of a missed write sees the
/// same snapshot as the update.
pub(crate) fn resolve_pending(
    connection: &mut PgConnection,
    invitation: &Invitation,
) -> InvitationRepositoryResult<()> {
    let id = invitation.id();
    let updated = diesel::update(
        invitations::table
            .filter(invitations::id.eq(id.into_inner()))
            .filter(invitations::status.eq(InvitationStatus::Pending.as_str())),
    )
    .set((
        invitations::status.eq(invitation.status().as_str()),
        invitations::updated_at.eq(invitation.updated_at()),
    ))
    .execute(connection)?;
    if updated == 0 {
        return Err(diagnose_missed_write(connection, id)?);
    }
    Ok(())
}

fn diagnose_missed_write(
    connection: &mut PgConnection,
    id: InvitationId,
) -> InvitationRepositoryResult<InvitationRepositoryError> {
    let status = invitations::table
        .find(id.into_inner())
        .select(invitations::status)
        .first::<String>(connection)
        .optional()?;
    Ok(match status {
        None => InvitationRepositoryError::NotFound(id),
        Some(raw) => InvitationRepositoryError::NotPending(
            InvitationStatus::try_from(raw.as_str())
                .map_err(InvitationRepositoryError::persistence)?,
        ),
    })
}

fn to_new_row(invitation: &Invitation) -> NewInvitationRow {
    NewInvitationRow {
        id: invitation.id().into_inner(),
        project_id: invitation.project_id().into_inner(),
        inviter_id: invitation.inviter().into_inner(),
        invitee_id: invitation.invitee().into_inner(),
        status: invitation.status().as_str().to_owned(),
        message: invitation.message().as_str().to_owned(),
        created_at: invitation.created_at(),
        updated_at: invitation.updated_at(),
        expires_at: invitation.expires_at(),
    }
}

fn row_to_invitation(row: InvitationRow) -> InvitationRepositoryResult<Invitation> {
    let InvitationRow {
        id,
        project_id,
        inviter_id,
        invitee_id,
        status,
        message,
        created_at,
        updated_at,
        expires_at,
    } = row;

    let data = PersistedInvitationData {
        id: InvitationId::from_uuid(id),
        project_id: ProjectId::from_uuid(project_id),
        inviter: UserId::from_uuid(inviter_id),
        invitee: UserId::from_uuid(invitee_id),
        status: InvitationStatus::try_from(status.as_str())
            .map_err(InvitationRepositoryError::persistence)?,
        message: InvitationMessage::new(message).map_err(InvitationRepositoryError::persistence)?,
        created_at,
        updated_at,
        expires_at,
    };
    Ok(Invitation::from_persisted(data))
}
