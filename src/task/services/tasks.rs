//! Member-scoped task CRUD and project analytics.

use crate::{
    error::ErrorKind,
    identity::{
        domain::UserId,
        ports::{IdentityDirectory, IdentityDirectoryError},
    },
    notification::{domain::ProjectEvent, ports::NotificationSink, publish_best_effort},
    project::{
        domain::{Project, ProjectId},
        ports::ProjectRepository,
        services::{ProjectRegistryService, ProjectServiceError},
    },
    task::{
        domain::{
            NewTask, ProjectAnalytics, Task, TaskChanges, TaskDescription, TaskDomainError,
            TaskId, TaskPriority, TaskStatus, TaskTitle,
        },
        ports::{TaskRepository, TaskRepositoryError},
    },
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    title: String,
    description: Option<String>,
    priority: TaskPriority,
    due_date: Option<DateTime<Utc>>,
    assignee: Option<UserId>,
}

impl CreateTaskRequest {
    /// Creates a request with the required title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority: TaskPriority::default(),
            due_date: None,
            assignee: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Sets the assignee.
    #[must_use]
    pub const fn with_assignee(mut self, assignee: UserId) -> Self {
        self.assignee = Some(assignee);
        self
    }
}

/// Request payload for a partial task update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    title: Option<String>,
    description: Option<String>,
    status: Option<TaskStatus>,
    priority: Option<TaskPriority>,
    due_date: Option<Option<DateTime<Utc>>>,
    assignee: Option<Option<UserId>>,
}

impl UpdateTaskRequest {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Replaces the description; a blank value clears it.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replaces the status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Replaces the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Replaces or clears the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: Option<DateTime<Utc>>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Replaces or clears the assignee.
    #[must_use]
    pub const fn with_assignee(mut self, assignee: Option<UserId>) -> Self {
        self.assignee = Some(assignee);
        self
    }
}

/// Service-level errors for task operations.
#[derive(Debug, Error)]
pub enum TaskServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Task persistence failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// Project lookup, access check or reference upkeep failed.
    #[error(transparent)]
    Project(#[from] ProjectServiceError),
    /// Identity lookup failed.
    #[error(transparent)]
    Directory(#[from] IdentityDirectoryError),
    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// The task belongs to another project.
    #[error("task {task_id} does not belong to project {project_id}")]
    TaskNotInProject {
        /// Addressed task.
        task_id: TaskId,
        /// Addressed project.
        project_id: ProjectId,
    },
    /// The assignee does not exist.
    #[error("assigned user not found: {0}")]
    AssigneeNotFound(UserId),
    /// The assignee is not a project member.
    #[error("assigned user {0} is not a project member")]
    AssigneeNotMember(UserId),
}

impl TaskServiceError {
    /// Classifies the error for the boundary.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(_)
            | Self::TaskNotInProject { .. }
            | Self::AssigneeNotFound(_)
            | Self::AssigneeNotMember(_) => ErrorKind::Validation,
            Self::TaskNotFound(_) | Self::Repository(TaskRepositoryError::NotFound(_)) => {
                ErrorKind::NotFound
            }
            Self::Repository(TaskRepositoryError::DuplicateTask(_)) => ErrorKind::Conflict,
            Self::Project(err) => err.kind(),
            Self::Repository(TaskRepositoryError::Persistence(_)) | Self::Directory(_) => {
                ErrorKind::Internal
            }
        }
    }
}

/// Result type for task service operations.
pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// Task orchestration service.
pub struct TaskService<T, P, D, N, C>
where
    T: TaskRepository + ?Sized,
    P: ProjectRepository + ?Sized,
    D: IdentityDirectory + ?Sized,
    N: NotificationSink + ?Sized,
    C: Clock + Send + Sync,
{
    tasks: Arc<T>,
    projects: ProjectRegistryService<P, D, N, C>,
    directory: Arc<D>,
    notifications: Arc<N>,
    clock: Arc<C>,
}

impl<T, P, D, N, C> Clone for TaskService<T, P, D, N, C>
where
    T: TaskRepository + ?Sized,
    P: ProjectRepository + ?Sized,
    D: IdentityDirectory + ?Sized,
    N: NotificationSink + ?Sized,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            tasks: Arc::clone(&self.tasks),
            projects: self.projects.clone(),
            directory: Arc::clone(&self.directory),
            notifications: Arc::clone(&self.notifications),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<T, P, D, N, C> TaskService<T, P, D, N, C>
where
    T: TaskRepository + ?Sized,
    P: ProjectRepository + ?Sized,
    D: IdentityDirectory + ?Sized,
    N: NotificationSink + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates a new task service.
    #[must_use]
    pub const fn new(
        tasks: Arc<T>,
        projects: ProjectRegistryService<P, D, N, C>,
        directory: Arc<D>,
        notifications: Arc<N>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            tasks,
            projects,
            directory,
            notifications,
            clock,
        }
    }

    /// Files a new task under a project and references it from the project.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Project`] when the project is missing or
    /// `requester` is not a member, [`TaskServiceError::Domain`] for invalid
    /// text, and [`TaskServiceError::AssigneeNotFound`] or
    /// [`TaskServiceError::AssigneeNotMember`] for an invalid assignee.
    pub async fn create(
        &self,
        project_id: ProjectId,
        requester: UserId,
        request: CreateTaskRequest,
    ) -> TaskServiceResult<Task> {
        let CreateTaskRequest {
            title,
            description,
            priority,
            due_date,
            assignee,
        } = request;
        let project = self.projects.get_project(project_id, requester).await?;
        if let Some(user) = assignee {
            self.ensure_assignable(&project, user).await?;
        }

        let task = Task::new(
            NewTask {
                project_id,
                title: TaskTitle::new(title)?,
                description: description.map(TaskDescription::new).transpose()?.flatten(),
                priority,
                due_date,
                assignee,
                created_by: requester,
            },
            &*self.clock,
        );
        self.tasks.store(&task).await?;
        if let Err(err) = self.projects.add_task_ref(project_id, task.id()).await {
            warn!(task_id = %task.id(), project_id = %project_id, error = %err, "rolling back task without project reference");
            self.tasks.delete(task.id()).await?;
            return Err(err.into());
        }

        info!(task_id = %task.id(), project_id = %project_id, "task created");
        publish_best_effort(
            &*self.notifications,
            ProjectEvent::TaskCreated {
                project_id,
                task: task.clone(),
            },
        );
        Ok(task)
    }

    /// Applies a partial update to a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::TaskNotFound`] when the task does not
    /// exist and [`TaskServiceError::TaskNotInProject`] when it belongs to
    /// another project, in addition to the errors of [`Self::create`].
    pub async fn update(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        requester: UserId,
        request: UpdateTaskRequest,
    ) -> TaskServiceResult<Task> {
        let project = self.projects.get_project(project_id, requester).await?;
        let mut task = self.find_in_project(project_id, task_id).await?;
        if let Some(Some(user)) = request.assignee {
            self.ensure_assignable(&project, user).await?;
        }

        let UpdateTaskRequest {
            title,
            description,
            status,
            priority,
            due_date,
            assignee,
        } = request;
        let changes = TaskChanges {
            title: title.map(TaskTitle::new).transpose()?,
            description: description.map(TaskDescription::new).transpose()?,
            status,
            priority,
            due_date,
            assignee,
        };
        task.apply(changes, &*self.clock);
        self.tasks.update(&task).await?;

        info!(task_id = %task_id, project_id = %project_id, "task updated");
        publish_best_effort(
            &*self.notifications,
            ProjectEvent::TaskUpdated {
                project_id,
                task: task.clone(),
            },
        );
        Ok(task)
    }

    /// Deletes a task and drops its project reference.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::TaskNotFound`] or
    /// [`TaskServiceError::TaskNotInProject`] as for [`Self::update`].
    pub async fn delete(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        requester: UserId,
    ) -> TaskServiceResult<()> {
        self.projects.get_project(project_id, requester).await?;
        self.find_in_project(project_id, task_id).await?;
        self.tasks.delete(task_id).await?;
        self.projects.remove_task_ref(project_id, task_id).await?;

        info!(task_id = %task_id, project_id = %project_id, "task deleted");
        publish_best_effort(
            &*self.notifications,
            ProjectEvent::TaskDeleted {
                project_id,
                task_id,
            },
        );
        Ok(())
    }

    /// Lists a project's tasks for one of its members, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Project`] when the project is missing or
    /// `requester` is not a member.
    pub async fn list(
        &self,
        project_id: ProjectId,
        requester: UserId,
    ) -> TaskServiceResult<Vec<Task>> {
        self.projects.get_project(project_id, requester).await?;
        Ok(self.tasks.list_for_project(project_id).await?)
    }

    /// Computes task statistics for one of the project's members.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Project`] when the project is missing or
    /// `requester` is not a member.
    pub async fn analytics(
        &self,
        project_id: ProjectId,
        requester: UserId,
    ) -> TaskServiceResult<ProjectAnalytics> {
        let tasks = self.list(project_id, requester).await?;
        Ok(ProjectAnalytics::from_tasks(&tasks, self.clock.utc()))
    }

    async fn find_in_project(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
    ) -> TaskServiceResult<Task> {
        let task = self
            .tasks
            .find_by_id(task_id)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(task_id))?;
        if task.project_id() != project_id {
            return Err(TaskServiceError::TaskNotInProject {
                task_id,
                project_id,
            });
        }
        Ok(task)
    }

    async fn ensure_assignable(&self, project: &Project, user: UserId) -> TaskServiceResult<()> {
        if self.directory.find_by_id(user).await?.is_none() {
            return Err(TaskServiceError::AssigneeNotFound(user));
        }
        if !project.is_member(&user) {
            return Err(TaskServiceError::AssigneeNotMember(user));
        }
        Ok(())
    }
}
