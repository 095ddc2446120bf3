//! Service layer for project creation, lookup, and membership upkeep.
//!
//! Membership and task-reference changes are set operations applied by the
//! repository in one atomic step, so they never conflict. Name and
//! description edits load, mutate and persist with a version check; a
//! version conflict reloads and retries, which is the only internally
//! retried failure in the crate.

use crate::{
    error::ErrorKind,
    identity::{
        domain::{IdentityDomainError, UserId, Username},
        ports::{IdentityDirectory, IdentityDirectoryError},
    },
    notification::{
        domain::{MembershipChange, ProjectEvent},
        ports::NotificationSink,
        publish_best_effort,
    },
    project::{
        domain::{
            Project, ProjectChange, ProjectDescription, ProjectDomainError, ProjectId,
            ProjectName,
        },
        ports::{AppliedChange, ProjectRepository, ProjectRepositoryError},
    },
    task::domain::TaskId,
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Maximum number of load-mutate-persist attempts for detail edits under
/// contention.
pub const MAX_UPDATE_ATTEMPTS: usize = 5;

/// Request payload for creating a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProjectRequest {
    name: String,
    description: Option<String>,
}

impl CreateProjectRequest {
    /// Creates a request with the required project name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    /// Sets the project description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Request payload for editing a project's name or description.
///
/// Fields left unset are kept. A blank description clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateProjectRequest {
    name: Option<String>,
    description: Option<String>,
}

impl UpdateProjectRequest {
    /// Creates a request that changes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the new project name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the new description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Service-level errors for project registry operations.
#[derive(Debug, Error)]
pub enum ProjectServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] ProjectDomainError),
    /// Identity input validation failed.
    #[error(transparent)]
    Identity(#[from] IdentityDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] ProjectRepositoryError),
    /// Identity lookup failed.
    #[error(transparent)]
    Directory(#[from] IdentityDirectoryError),
    /// The project does not exist.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),
    /// The caller is not a member of the project.
    #[error("access denied: user {user_id} is not a member of project {project_id}")]
    NotAMember {
        /// Project being accessed.
        project_id: ProjectId,
        /// Caller.
        user_id: UserId,
    },
    /// The caller does not own the project.
    #[error("only the project owner can {action}")]
    NotOwner {
        /// Refused action, for the message.
        action: &'static str,
    },
    /// No user has the given username.
    #[error("user not found: {0}")]
    UserNotFound(Username),
    /// The user already belongs to the project.
    #[error("user {0} is already a member")]
    AlreadyMember(UserId),
    /// Concurrent writers kept winning the version check.
    #[error("project {0} is too contended, giving up after {MAX_UPDATE_ATTEMPTS} attempts")]
    Contended(ProjectId),
}

impl ProjectServiceError {
    /// Classifies the error for the boundary.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_) | Self::Identity(_) => ErrorKind::Validation,
            Self::ProjectNotFound(_)
            | Self::UserNotFound(_)
            | Self::Repository(ProjectRepositoryError::NotFound(_)) => ErrorKind::NotFound,
            Self::NotAMember { .. } | Self::NotOwner { .. } => ErrorKind::Permission,
            Self::AlreadyMember(_)
            | Self::Contended(_)
            | Self::Repository(
                ProjectRepositoryError::DuplicateProject(_)
                | ProjectRepositoryError::VersionConflict { .. },
            ) => ErrorKind::Conflict,
            Self::Repository(ProjectRepositoryError::Persistence(_)) | Self::Directory(_) => {
                ErrorKind::Internal
            }
        }
    }
}

/// Result type for project registry service operations.
pub type ProjectServiceResult<T> = Result<T, ProjectServiceError>;

/// Project registry orchestration service.
pub struct ProjectRegistryService<P, D, N, C>
where
    P: ProjectRepository + ?Sized,
    D: IdentityDirectory + ?Sized,
    N: NotificationSink + ?Sized,
    C: Clock + Send + Sync,
{
    repository: Arc<P>,
    directory: Arc<D>,
    notifications: Arc<N>,
    clock: Arc<C>,
}

impl<P, D, N, C> Clone for ProjectRegistryService<P, D, N, C>
where
    P: ProjectRepository + ?Sized,
    D: IdentityDirectory + ?Sized,
    N: NotificationSink + ?Sized,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            directory: Arc::clone(&self.directory),
            notifications: Arc::clone(&self.notifications),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<P, D, N, C> ProjectRegistryService<P, D, N, C>
where
    P: ProjectRepository + ?Sized,
    D: IdentityDirectory + ?Sized,
    N: NotificationSink + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates a new project registry service.
    #[must_use]
    pub const fn new(
        repository: Arc<P>,
        directory: Arc<D>,
        notifications: Arc<N>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            repository,
            directory,
            notifications,
            clock,
        }
    }

    /// Creates a project owned by `owner`, who becomes its sole member.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::Domain`] when the name or description
    /// fails validation, or [`ProjectServiceError::Repository`] when
    /// persistence fails.
    pub async fn create_project(
        &self,
        owner: UserId,
        request: CreateProjectRequest,
    ) -> ProjectServiceResult<Project> {
        let CreateProjectRequest { name, description } = request;
        let project_name = ProjectName::new(name)?;
        let project_description = description
            .map(ProjectDescription::new)
            .transpose()?
            .flatten();

        let project = Project::new(owner, project_name, project_description, &*self.clock);
        self.repository.store(&project).await?;
        info!(project_id = %project.id(), owner = %owner, "project created");
        Ok(project)
    }

    /// Returns a project visible to `requester`.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::ProjectNotFound`] when the project does
    /// not exist or [`ProjectServiceError::NotAMember`] when the requester
    /// does not belong to it.
    pub async fn get_project(
        &self,
        id: ProjectId,
        requester: UserId,
    ) -> ProjectServiceResult<Project> {
        let project = self.find_or_error(id).await?;
        ensure_member(&project, requester)?;
        Ok(project)
    }

    /// Loads a project without an access check.
    ///
    /// Returns `Ok(None)` when the project does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::Repository`] when persistence lookup
    /// fails.
    pub async fn find(&self, id: ProjectId) -> ProjectServiceResult<Option<Project>> {
        Ok(self.repository.find_by_id(id).await?)
    }

    /// Returns every project `user` belongs to, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::Repository`] when persistence lookup
    /// fails.
    pub async fn list_for_member(&self, user: UserId) -> ProjectServiceResult<Vec<Project>> {
        Ok(self.repository.list_for_member(user).await?)
    }

    /// Adds the user named `username` to the project on behalf of its owner.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::NotOwner`] when `requester` does not own
    /// the project, [`ProjectServiceError::UserNotFound`] when the username
    /// is unknown, and [`ProjectServiceError::AlreadyMember`] when the user
    /// already belongs.
    pub async fn add_member_by_username(
        &self,
        id: ProjectId,
        requester: UserId,
        username: &str,
    ) -> ProjectServiceResult<Project> {
        let project = self.find_or_error(id).await?;
        if !project.is_owner(&requester) {
            return Err(ProjectServiceError::NotOwner {
                action: "add members",
            });
        }
        let name = Username::new(username)?;
        let user = self
            .directory
            .find_by_username(&name)
            .await?
            .ok_or(ProjectServiceError::UserNotFound(name))?;
        if project.is_member(&user) {
            return Err(ProjectServiceError::AlreadyMember(user.id()));
        }

        let AppliedChange {
            project: updated,
            changed,
        } = self.change(id, ProjectChange::AddMember(user.id())).await?;
        if !changed {
            return Err(ProjectServiceError::AlreadyMember(user.id()));
        }
        self.announce(id, user.id(), MembershipChange::Added);
        Ok(updated)
    }

    /// Adds `user` to the project. A no-op when the user already belongs.
    ///
    /// Authorization is the caller's responsibility.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::ProjectNotFound`] when the project does
    /// not exist, or a repository error when persistence fails.
    pub async fn add_member(&self, id: ProjectId, user: UserId) -> ProjectServiceResult<Project> {
        let AppliedChange { project, changed } =
            self.change(id, ProjectChange::AddMember(user)).await?;
        if changed {
            self.announce(id, user, MembershipChange::Added);
        }
        Ok(project)
    }

    /// Removes `user` from the project. Removing the owner is silently
    /// refused.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::ProjectNotFound`] when the project does
    /// not exist, or a repository error when persistence fails.
    pub async fn remove_member(
        &self,
        id: ProjectId,
        user: UserId,
    ) -> ProjectServiceResult<Project> {
        let AppliedChange { project, changed } =
            self.change(id, ProjectChange::RemoveMember(user)).await?;
        if changed {
            self.announce(id, user, MembershipChange::Removed);
        } else if project.is_owner(&user) {
            warn!(project_id = %id, "refused to remove project owner");
        }
        Ok(project)
    }

    /// Records a task reference on the project.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::ProjectNotFound`] when the project does
    /// not exist, or a repository error when persistence fails.
    pub async fn add_task_ref(
        &self,
        id: ProjectId,
        task_id: TaskId,
    ) -> ProjectServiceResult<Project> {
        Ok(self
            .change(id, ProjectChange::AddTaskRef(task_id))
            .await?
            .project)
    }

    /// Drops a task reference from the project. A no-op when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::ProjectNotFound`] when the project does
    /// not exist, or a repository error when persistence fails.
    pub async fn remove_task_ref(
        &self,
        id: ProjectId,
        task_id: TaskId,
    ) -> ProjectServiceResult<Project> {
        Ok(self
            .change(id, ProjectChange::RemoveTaskRef(task_id))
            .await?
            .project)
    }

    /// Renames the project or edits its description on behalf of its owner.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectServiceError::ProjectNotFound`] when the project does
    /// not exist, [`ProjectServiceError::NotOwner`] when `requester` does not
    /// own it, [`ProjectServiceError::Domain`] when a field fails validation,
    /// and [`ProjectServiceError::Contended`] when concurrent edits keep
    /// winning the version check.
    pub async fn update_details(
        &self,
        id: ProjectId,
        requester: UserId,
        request: UpdateProjectRequest,
    ) -> ProjectServiceResult<Project> {
        let project = self.find_or_error(id).await?;
        if !project.is_owner(&requester) {
            return Err(ProjectServiceError::NotOwner {
                action: "edit the project",
            });
        }
        let UpdateProjectRequest { name, description } = request;
        let new_name = name.map(ProjectName::new).transpose()?;
        let new_description = description.map(ProjectDescription::new).transpose()?;

        let (updated, changed) = self
            .modify(id, |draft, clock| {
                draft.rename(new_name.clone(), new_description.clone(), clock)
            })
            .await?;
        if changed {
            info!(project_id = %id, version = updated.version(), "project details updated");
        }
        Ok(updated)
    }

    async fn change(
        &self,
        id: ProjectId,
        change: ProjectChange,
    ) -> ProjectServiceResult<AppliedChange> {
        self.repository
            .apply_change(id, change, self.clock.utc())
            .await
            .map_err(|err| match err {
                ProjectRepositoryError::NotFound(_) => ProjectServiceError::ProjectNotFound(id),
                other => other.into(),
            })
    }

    /// Load, mutate, persist; retries on version conflicts.
    ///
    /// Returns the committed project and whether the mutator changed it.
    async fn modify<F>(&self, id: ProjectId, mutator: F) -> ProjectServiceResult<(Project, bool)>
    where
        F: Fn(&mut Project, &C) -> bool + Send + Sync,
    {
        for attempt in 1..=MAX_UPDATE_ATTEMPTS {
            let mut project = self.find_or_error(id).await?;
            if !mutator(&mut project, &*self.clock) {
                return Ok((project, false));
            }
            match self.repository.update(&project).await {
                Ok(version) => {
                    project.record_commit(version);
                    return Ok((project, true));
                }
                Err(ProjectRepositoryError::VersionConflict { .. }) => {
                    warn!(project_id = %id, attempt, "project version conflict, retrying");
                }
                Err(ProjectRepositoryError::NotFound(_)) => {
                    return Err(ProjectServiceError::ProjectNotFound(id));
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(ProjectServiceError::Contended(id))
    }

    async fn find_or_error(&self, id: ProjectId) -> ProjectServiceResult<Project> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(ProjectServiceError::ProjectNotFound(id))
    }

    fn announce(&self, project_id: ProjectId, user_id: UserId, change: MembershipChange) {
        info!(project_id = %project_id, user_id = %user_id, ?change, "project membership changed");
        publish_best_effort(
            &*self.notifications,
            ProjectEvent::MembershipChanged {
                project_id,
                user_id,
                change,
            },
        );
    }
}

/// Fails with [`ProjectServiceError::NotAMember`] unless `user` belongs to
/// `project`.
///
/// # Errors
///
/// Returns [`ProjectServiceError::NotAMember`] when `user` is not a member.
pub fn ensure_member(project: &Project, user: UserId) -> ProjectServiceResult<()> {
    if project.is_member(&user) {
        Ok(())
    } else {
        Err(ProjectServiceError::NotAMember {
            project_id: project.id(),
            user_id: user,
        })
    }
}
