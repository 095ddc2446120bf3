//! `PostgreSQL` repository implementation for project storage.

use super::{
    models::{NewMemberRow, NewProjectRow, NewTaskRefRow, ProjectRow},
    schema::{project_members, project_tasks, projects},
};
use crate::identity::domain::UserId;
use crate::project::{
    domain::{
        PersistedProjectData, Project, ProjectChange, ProjectDescription, ProjectId, ProjectName,
    },
    ports::{AppliedChange, ProjectRepository, ProjectRepositoryError, ProjectRepositoryResult},
};
use crate::task::domain::TaskId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type shared by every adapter in the crate.
pub type ProjectPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed project repository.
#[derive(Debug, Clone)]
pub struct PostgresProjectRepository {
    pool: ProjectPgPool,
}

impl PostgresProjectRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: ProjectPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> ProjectRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ProjectRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(ProjectRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(ProjectRepositoryError::persistence)?
    }
}

impl From<DieselError> for ProjectRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl ProjectRepository for PostgresProjectRepository {
    async fn store(&self, project: &Project) -> ProjectRepositoryResult<()> {
        let project_id = project.id();
        let new_row = to_new_row(project)?;
        let member_rows = to_member_rows(project)?;
        let task_rows = to_task_rows(project)?;

        self.run_blocking(move |connection| {
            connection.transaction::<_, ProjectRepositoryError, _>(|conn| {
                diesel::insert_into(projects::table)
                    .values(&new_row)
                    .execute(conn)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            ProjectRepositoryError::DuplicateProject(project_id)
                        }
                        _ => ProjectRepositoryError::persistence(err),
                    })?;
                replace_children(conn, project_id, &member_rows, &task_rows)?;
                Ok(())
            })
        })
        .await
    }

    async fn update(&self, project: &Project) -> ProjectRepositoryResult<u64> {
        let project_id = project.id();
        let expected = project.version();
        let expected_i64 = i64::try_from(expected).map_err(ProjectRepositoryError::persistence)?;
        let next = expected
            .checked_add(1)
            .ok_or_else(|| ProjectRepositoryError::persistence(std::io::Error::other("version overflow")))?;
        let next_i64 = i64::try_from(next).map_err(ProjectRepositoryError::persistence)?;
        let name = project.name().as_str().to_owned();
        let description = project.description().map(|d| d.as_str().to_owned());
        let updated_at = project.updated_at();
        let member_rows = to_member_rows(project)?;
        let task_rows = to_task_rows(project)?;

        self.run_blocking(move |connection| {
            connection.transaction::<_, ProjectRepositoryError, _>(|conn| {
                let updated = diesel::update(
                    projects::table
                        .filter(projects::id.eq(project_id.into_inner()))
                        .filter(projects::version.eq(expected_i64)),
                )
                .set((
                    projects::name.eq(&name),
                    projects::description.eq(&description),
                    projects::version.eq(next_i64),
                    projects::updated_at.eq(updated_at),
                ))
                .execute(conn)?;

                if updated == 0 {
                    let actual = projects::table
                        .find(project_id.into_inner())
                        .select(projects::version)
                        .first::<i64>(conn)
                        .optional()?;
                    return Err(match actual {
                        None => ProjectRepositoryError::NotFound(project_id),
                        Some(stored) => ProjectRepositoryError::VersionConflict {
                            id: project_id,
                            expected,
                            actual: u64::try_from(stored)
                                .map_err(ProjectRepositoryError::persistence)?,
                        },
                    });
                }

                replace_children(conn, project_id, &member_rows, &task_rows)?;
                Ok(next)
            })
        })
        .await
    }

    async fn apply_change(
        &self,
        id: ProjectId,
        change: ProjectChange,
        at: DateTime<Utc>,
    ) -> ProjectRepositoryResult<AppliedChange> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, ProjectRepositoryError, _>(|conn| {
                let row = projects::table
                    .find(id.into_inner())
                    .select(ProjectRow::as_select())
                    .for_update()
                    .first::<ProjectRow>(conn)
                    .optional()?
                    .ok_or(ProjectRepositoryError::NotFound(id))?;
                let mut project = hydrate(conn, row)?;
                let changed = project.apply(change, at);
                if !changed {
                    return Ok(AppliedChange { project, changed });
                }

                write_change(conn, id, change)?;
                let version = diesel::update(projects::table.find(id.into_inner()))
                    .set((
                        projects::version.eq(projects::version + 1_i64),
                        projects::updated_at.eq(at),
                    ))
                    .returning(projects::version)
                    .get_result::<i64>(conn)?;
                project.record_commit(
                    u64::try_from(version).map_err(ProjectRepositoryError::persistence)?,
                );
                Ok(AppliedChange { project, changed })
            })
        })
        .await
    }

    async fn find_by_id(&self, id: ProjectId) -> ProjectRepositoryResult<Option<Project>> {
        self.run_blocking(move |connection| load_project(connection, id))
            .await
    }

    async fn list_for_member(&self, user: UserId) -> ProjectRepositoryResult<Vec<Project>> {
        self.run_blocking(move |connection| {
            let project_ids = project_members::table
                .filter(project_members::user_id.eq(user.into_inner()))
                .select(project_members::project_id)
                .load::<uuid::Uuid>(connection)?;
            let rows = projects::table
                .filter(projects::id.eq_any(&project_ids))
                .order(projects::updated_at.desc())
                .select(ProjectRow::as_select())
                .load::<ProjectRow>(connection)?;
            rows.into_iter()
                .map(|row| hydrate(connection, row))
                .collect()
        })
        .await
    }
}

/// Loads a project with its members and task references.
pub(crate) fn load_project(
    connection: &mut PgConnection,
    id: ProjectId,
) -> ProjectRepositoryResult<Option<Project>> {
    let row = projects::table
        .find(id.into_inner())
        .select(ProjectRow::as_select())
        .first::<ProjectRow>(connection)
        .optional()?;
    row.map(|found| hydrate(connection, found)).transpose()
}

/// Returns the display position for the next member of a project.
pub(crate) fn next_member_position(
    connection: &mut PgConnection,
    id: ProjectId,
) -> QueryResult<i32> {
    let current = project_members::table
        .filter(project_members::project_id.eq(id.into_inner()))
        .select(diesel::dsl::max(project_members::position))
        .first::<Option<i32>>(connection)?;
    Ok(current.map_or(0, |position| position.saturating_add(1)))
}

fn next_task_position(connection: &mut PgConnection, id: ProjectId) -> QueryResult<i32> {
    let current = project_tasks::table
        .filter(project_tasks::project_id.eq(id.into_inner()))
        .select(diesel::dsl::max(project_tasks::position))
        .first::<Option<i32>>(connection)?;
    Ok(current.map_or(0, |position| position.saturating_add(1)))
}

/// Writes the row-level delta of a change. The project row must already be
/// locked by the caller.
fn write_change(
    conn: &mut PgConnection,
    id: ProjectId,
    change: ProjectChange,
) -> ProjectRepositoryResult<()> {
    let project_id = id.into_inner();
    match change {
        ProjectChange::AddMember(user) => {
            let row = NewMemberRow {
                project_id,
                user_id: user.into_inner(),
                position: next_member_position(conn, id)?,
            };
            diesel::insert_into(project_members::table)
                .values(&row)
                .on_conflict_do_nothing()
                .execute(conn)?;
        }
        ProjectChange::RemoveMember(user) => {
            diesel::delete(
                project_members::table
                    .filter(project_members::project_id.eq(project_id))
                    .filter(project_members::user_id.eq(user.into_inner())),
            )
            .execute(conn)?;
        }
        ProjectChange::AddTaskRef(task_id) => {
            let row = NewTaskRefRow {
                project_id,
                task_id: task_id.into_inner(),
                position: next_task_position(conn, id)?,
            };
            diesel::insert_into(project_tasks::table)
                .values(&row)
                .on_conflict_do_nothing()
                .execute(conn)?;
        }
        ProjectChange::RemoveTaskRef(task_id) => {
            diesel::delete(
                project_tasks::table
                    .filter(project_tasks::project_id.eq(project_id))
                    .filter(project_tasks::task_id.eq(task_id.into_inner())),
            )
            .execute(conn)?;
        }
    }
    Ok(())
}

fn hydrate(connection: &mut PgConnection, row: ProjectRow) -> ProjectRepositoryResult<Project> {
    let members = project_members::table
        .filter(project_members::project_id.eq(row.id))
        .order(project_members::position.asc())
        .select(project_members::user_id)
        .load::<uuid::Uuid>(connection)?;
    let tasks = project_tasks::table
        .filter(project_tasks::project_id.eq(row.id))
        .order(project_tasks::position.asc())
        .select(project_tasks::task_id)
        .load::<uuid::Uuid>(connection)?;
    row_to_project(row, members, tasks)
}

fn replace_children(
    conn: &mut PgConnection,
    project_id: ProjectId,
    member_rows: &[NewMemberRow],
    task_rows: &[NewTaskRefRow],
) -> ProjectRepositoryResult<()> {
    let id = project_id.into_inner();
    diesel::delete(project_members::table.filter(project_members::project_id.eq(id)))
        .execute(conn)?;
    diesel::delete(project_tasks::table.filter(project_tasks::project_id.eq(id))).execute(conn)?;
    if !member_rows.is_empty() {
        diesel::insert_into(project_members::table)
            .values(member_rows)
            .execute(conn)?;
    }
    if !task_rows.is_empty() {
        diesel::insert_into(project_tasks::table)
            .values(task_rows)
            .execute(conn)?;
    }
    Ok(())
}

fn to_new_row(project: &Project) -> ProjectRepositoryResult<NewProjectRow> {
    Ok(NewProjectRow {
        id: project.id().into_inner(),
        name: project.name().as_str().to_owned(),
        description: project.description().map(|d| d.as_str().to_owned()),
        owner_id: project.owner().into_inner(),
        version: i64::try_from(project.version()).map_err(ProjectRepositoryError::persistence)?,
        created_at: project.created_at(),
        updated_at: project.updated_at(),
    })
}

fn to_member_rows(project: &Project) -> ProjectRepositoryResult<Vec<NewMemberRow>> {
    project
        .members()
        .iter()
        .enumerate()
        .map(|(index, member)| {
            Ok(NewMemberRow {
                project_id: project.id().into_inner(),
                user_id: member.into_inner(),
                position: i32::try_from(index).map_err(ProjectRepositoryError::persistence)?,
            })
        })
        .collect()
}

fn to_task_rows(project: &Project) -> ProjectRepositoryResult<Vec<NewTaskRefRow>> {
    project
        .tasks()
        .iter()
        .enumerate()
        .map(|(index, task)| {
            Ok(NewTaskRefRow {
                project_id: project.id().into_inner(),
                task_id: task.into_inner(),
                position: i32::try_from(index).map_err(ProjectRepositoryError::persistence)?,
            })
        })
        .collect()
}

fn row_to_project(
    row: ProjectRow,
    members: Vec<uuid::Uuid>,
    tasks: Vec<uuid::Uuid>,
) -> ProjectRepositoryResult<Project> {
    let ProjectRow {
        id,
        name,
        description,
        owner_id,
        version,
        created_at,
        updated_at,
    } = row;

    let data = PersistedProjectData {
        id: ProjectId::from_uuid(id),
        name: ProjectName::new(name).map_err(ProjectRepositoryError::persistence)?,
        description: description
            .map(ProjectDescription::new)
            .transpose()
            .map_err(ProjectRepositoryError::persistence)?
            .flatten(),
        owner: UserId::from_uuid(owner_id),
        members: members.into_iter().map(UserId::from_uuid).collect(),
        tasks: tasks.into_iter().map(TaskId::from_uuid).collect(),
        version: u64::try_from(version).map_err(ProjectRepositoryError::persistence)?,
        created_at,
        updated_at,
    };
    Project::from_persisted(data).map_err(ProjectRepositoryError::persistence)
}
