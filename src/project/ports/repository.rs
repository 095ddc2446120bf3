//! Repository port for project persistence with optimistic concurrency.

use crate::identity::domain::UserId;
use crate::project::domain::{Project, ProjectChange, ProjectId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for project repository operations.
pub type ProjectRepositoryResult<T> = Result<T, ProjectRepositoryError>;

/// Project persistence contract.
///
/// Each project is persisted as one unit: no partial write of a project's
/// members or task references is ever observable.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Stores a new project.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectRepositoryError::DuplicateProject`] when the
    /// identifier already exists.
    async fn store(&self, project: &Project) -> ProjectRepositoryResult<()>;

    /// Persists the full state of an existing project.
    ///
    /// The write succeeds only when the stored version still equals
    /// `project.version()`; the stored version is then incremented and
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectRepositoryError::NotFound`] when the project does not
    /// exist or [`ProjectRepositoryError::VersionConflict`] when another
    /// writer committed first.
    async fn update(&self, project: &Project) -> ProjectRepositoryResult<u64>;

    /// Applies `change` to the currently stored project in one atomic step.
    ///
    /// Unlike [`ProjectRepository::update`] there is no version check: the
    /// change is applied to whatever state is current, so concurrent changes
    /// never conflict. The version is incremented only when the change had
    /// an effect.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectRepositoryError::NotFound`] when the project does not
    /// exist.
    async fn apply_change(
        &self,
        id: ProjectId,
        change: ProjectChange,
        at: DateTime<Utc>,
    ) -> ProjectRepositoryResult<AppliedChange>;

    /// Finds a project by identifier.
    ///
    /// Returns `None` when the project does not exist.
    async fn find_by_id(&self, id: ProjectId) -> ProjectRepositoryResult<Option<Project>>;

    /// Returns every project that lists `user` as a member, most recently
    /// updated first.
    async fn list_for_member(&self, user: UserId) -> ProjectRepositoryResult<Vec<Project>>;
}

/// Outcome of [`ProjectRepository::apply_change`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedChange {
    /// Project state after the change, with its committed version.
    pub project: Project,
    /// Whether the change had an effect.
    pub changed: bool,
}

/// Errors returned by project repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ProjectRepositoryError {
    /// A project with the same identifier already exists.
    #[error("duplicate project identifier: {0}")]
    DuplicateProject(ProjectId),

    /// The project was not found.
    #[error("project not found: {0}")]
    NotFound(ProjectId),

    /// The project was modified concurrently.
    #[error("project {id} was modified concurrently (expected version {expected}, found {actual})")]
    VersionConflict {
        /// Project being updated.
        id: ProjectId,
        /// Version the writer loaded.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ProjectRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
