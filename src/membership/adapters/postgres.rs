//! `PostgreSQL` acceptance store running both writes in one transaction.

use crate::invitation::{adapters::postgres::resolve_pending, domain::Invitation};
use crate::membership::ports::{AcceptanceStore, AcceptanceStoreError, AcceptanceStoreResult};
use crate::project::{
    adapters::postgres::{
        ProjectPgPool, load_project, next_member_position,
        schema::{project_members, projects},
    },
    domain::Project,
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::Error as DieselError;

/// `PostgreSQL`-backed acceptance store.
#[derive(Debug, Clone)]
pub struct PostgresAcceptanceStore {
    pool: ProjectPgPool,
}

impl PostgresAcceptanceStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: ProjectPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> AcceptanceStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> AcceptanceStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(AcceptanceStoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(AcceptanceStoreError::persistence)?
    }
}

impl From<DieselError> for AcceptanceStoreError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl AcceptanceStore for PostgresAcceptanceStore {
    async fn commit_acceptance(&self, invitation: &Invitation) -> AcceptanceStoreResult<Project> {
        let accepted = invitation.clone();
        self.run_blocking(move |connection| {
            connection.transaction::<_, AcceptanceStoreError, _>(|conn| {
                resolve_pending(conn, &accepted)
                    .map_err(|err| AcceptanceStoreError::from_invitation(&accepted, err))?;
                add_member_and_bump(conn, &accepted)?;
                load_project(conn, accepted.project_id())?
                    .ok_or(AcceptanceStoreError::ProjectNotFound(accepted.project_id()))
            })
        })
        .await
    }

    async fn repair_membership(&self, invitation: &Invitation) -> AcceptanceStoreResult<bool> {
        let accepted = invitation.clone();
        self.run_blocking(move |connection| {
            connection.transaction::<_, AcceptanceStoreError, _>(|conn| {
                add_member_and_bump(conn, &accepted)
            })
        })
        .await
    }
}

/// Inserts the invitee as a member unless present, bumping the project
/// version so concurrent optimistic writers reload. Returns `true` when a
/// membership row was inserted.
fn add_member_and_bump(
    conn: &mut PgConnection,
    invitation: &Invitation,
) -> AcceptanceStoreResult<bool> {
    let project_id = invitation.project_id();
    let locked = projects::table
        .find(project_id.into_inner())
        .select(projects::id)
        .for_update()
        .first::<uuid::Uuid>(conn)
        .optional()?;
    if locked.is_none() {
        return Err(AcceptanceStoreError::ProjectNotFound(project_id));
    }

    let position = next_member_position(conn, project_id)?;
    let inserted = diesel::insert_into(project_members::table)
        .values((
            project_members::project_id.eq(project_id.into_inner()),
            project_members::user_id.eq(invitation.invitee().into_inner()),
            project_members::position.eq(position),
        ))
        .on_conflict_do_nothing()
        .execute(conn)?;
    if inserted == 0 {
        return Ok(false);
    }

    diesel::update(projects::table.filter(projects::id.eq(project_id.into_inner())))
        .set((
            projects::version.eq(projects::version + 1_i64),
            projects::updated_at.eq(invitation.updated_at()),
        ))
        .execute(conn)?;
    Ok(true)
}
