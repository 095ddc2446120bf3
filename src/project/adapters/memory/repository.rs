//! In-memory repository for project registry tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use crate::identity::domain::UserId;
use crate::project::{
    domain::{Project, ProjectChange, ProjectId},
    ports::{AppliedChange, ProjectRepository, ProjectRepositoryError, ProjectRepositoryResult},
};
use chrono::{DateTime, Utc};

/// Thread-safe in-memory project repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProjectRepository {
    state: Arc<RwLock<ProjectTable>>,
}

/// Stored projects keyed by identifier.
#[derive(Debug, Default)]
pub(crate) struct ProjectTable {
    projects: HashMap<ProjectId, Project>,
}

impl ProjectTable {
    /// Returns a stored project.
    pub(crate) fn get(&self, id: ProjectId) -> Option<&Project> {
        self.projects.get(&id)
    }

    /// Applies the version check and stores `project` with the next version.
    pub(crate) fn commit(&mut self, project: &Project) -> ProjectRepositoryResult<u64> {
        let stored = self
            .projects
            .get(&project.id())
            .ok_or(ProjectRepositoryError::NotFound(project.id()))?;
        if stored.version() != project.version() {
            return Err(ProjectRepositoryError::VersionConflict {
                id: project.id(),
                expected: project.version(),
                actual: stored.version(),
            });
        }
        let next_version = stored.version() + 1;
        let mut committed = project.clone();
        committed.record_commit(next_version);
        self.projects.insert(project.id(), committed);
        Ok(next_version)
    }
}

impl InMemoryProjectRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the write lock on the project table.
    pub(crate) fn write_table(&self) -> ProjectRepositoryResult<RwLockWriteGuard<'_, ProjectTable>> {
        self.state.write().map_err(|err| {
            ProjectRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    /// Drops a project outright, simulating a concurrent deletion.
    #[cfg(test)]
    pub(crate) fn remove(&self, id: ProjectId) -> ProjectRepositoryResult<Option<Project>> {
        Ok(self.write_table()?.projects.remove(&id))
    }
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn store(&self, project: &Project) -> ProjectRepositoryResult<()> {
        let mut state = self.write_table()?;
        if state.projects.contains_key(&project.id()) {
            return Err(ProjectRepositoryError::DuplicateProject(project.id()));
        }
        state.projects.insert(project.id(), project.clone());
        Ok(())
    }

    async fn update(&self, project: &Project) -> ProjectRepositoryResult<u64> {
        let mut state = self.write_table()?;
        state.commit(project)
    }

    async fn apply_change(
        &self,
        id: ProjectId,
        change: ProjectChange,
        at: DateTime<Utc>,
    ) -> ProjectRepositoryResult<AppliedChange> {
        let mut state = self.write_table()?;
        let mut project = state
            .get(id)
            .cloned()
            .ok_or(ProjectRepositoryError::NotFound(id))?;
        let changed = project.apply(change, at);
        if changed {
            let version = state.commit(&project)?;
            project.record_commit(version);
        }
        Ok(AppliedChange { project, changed })
    }

    async fn find_by_id(&self, id: ProjectId) -> ProjectRepositoryResult<Option<Project>> {
        let state = self.state.read().map_err(|err| {
            ProjectRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(state.projects.get(&id).cloned())
    }

    async fn list_for_member(&self, user: UserId) -> ProjectRepositoryResult<Vec<Project>> {
        let state = self.state.read().map_err(|err| {
            ProjectRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let mut projects: Vec<Project> = state
            .projects
            .values()
            .filter(|project| project.is_member(&user))
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.updated_at().cmp(&a.updated_at()));
        Ok(projects)
    }
}
