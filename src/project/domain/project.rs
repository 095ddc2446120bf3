//! Project aggregate root.

use super::{ProjectChange, ProjectDescription, ProjectDomainError, ProjectId, ProjectName};
use crate::identity::domain::{AsUserId, UserId};
use crate::task::domain::TaskId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;

/// Project aggregate root.
///
/// Members keep insertion order for display; membership itself is a set.
/// The owner is immutable and always a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    id: ProjectId,
    name: ProjectName,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<ProjectDescription>,
    owner: UserId,
    members: Vec<UserId>,
    tasks: Vec<TaskId>,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted project aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedProjectData {
    /// Persisted project identifier.
    pub id: ProjectId,
    /// Persisted name.
    pub name: ProjectName,
    /// Persisted description, if any.
    pub description: Option<ProjectDescription>,
    /// Persisted owner.
    pub owner: UserId,
    /// Persisted members in insertion order.
    pub members: Vec<UserId>,
    /// Persisted task references.
    pub tasks: Vec<TaskId>,
    /// Persisted optimistic-concurrency version.
    pub version: u64,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Creates a new project owned by `owner`, who becomes its sole member.
    #[must_use]
    pub fn new(
        owner: UserId,
        name: ProjectName,
        description: Option<ProjectDescription>,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: ProjectId::new(),
            name,
            description,
            owner,
            members: vec![owner],
            tasks: Vec::new(),
            version: 0,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a project from persisted storage.
    ///
    /// Duplicate member and task entries are collapsed, keeping the first
    /// occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::OwnerNotMember`] when the stored member
    /// list does not contain the owner.
    pub fn from_persisted(data: PersistedProjectData) -> Result<Self, ProjectDomainError> {
        if !data.members.contains(&data.owner) {
            return Err(ProjectDomainError::OwnerNotMember(data.id));
        }
        Ok(Self {
            id: data.id,
            name: data.name,
            description: data.description,
            owner: data.owner,
            members: dedup_preserving_order(data.members),
            tasks: dedup_preserving_order(data.tasks),
            version: data.version,
            created_at: data.created_at,
            updated_at: data.updated_at,
        })
    }

    /// Returns the project identifier.
    #[must_use]
    pub const fn id(&self) -> ProjectId {
        self.id
    }

    /// Returns the project name.
    #[must_use]
    pub const fn name(&self) -> &ProjectName {
        &self.name
    }

    /// Returns the project description, if any.
    #[must_use]
    pub const fn description(&self) -> Option<&ProjectDescription> {
        self.description.as_ref()
    }

    /// Returns the owner.
    #[must_use]
    pub const fn owner(&self) -> UserId {
        self.owner
    }

    /// Returns the members in insertion order.
    #[must_use]
    pub fn members(&self) -> &[UserId] {
        &self.members
    }

    /// Returns the referenced task identifiers.
    #[must_use]
    pub fn tasks(&self) -> &[TaskId] {
        &self.tasks
    }

    /// Returns the number of members.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Returns the number of referenced tasks.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Returns the optimistic-concurrency version of the loaded state.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` when `user` is a member, whatever its representation.
    #[must_use]
    pub fn is_member(&self, user: &impl AsUserId) -> bool {
        let candidate = user.user_id();
        self.members.contains(&candidate)
    }

    /// Returns `true` when `user` owns the project.
    #[must_use]
    pub fn is_owner(&self, user: &impl AsUserId) -> bool {
        self.owner == user.user_id()
    }

    /// Adds a member. Returns `false` when the user already belongs.
    pub fn add_member(&mut self, user: UserId, clock: &impl Clock) -> bool {
        self.apply(ProjectChange::AddMember(user), clock.utc())
    }

    /// Adds a member with an explicit timestamp.
    ///
    /// Used when the change is committed together with another aggregate
    /// and must carry that aggregate's timestamp.
    pub fn add_member_at(&mut self, user: UserId, at: DateTime<Utc>) -> bool {
        self.apply(ProjectChange::AddMember(user), at)
    }

    /// Removes a member. The owner is never removed; returns `false` when
    /// nothing changed.
    pub fn remove_member(&mut self, user: UserId, clock: &impl Clock) -> bool {
        self.apply(ProjectChange::RemoveMember(user), clock.utc())
    }

    /// Adds a task reference. Returns `false` when already referenced.
    pub fn add_task_ref(&mut self, task_id: TaskId, clock: &impl Clock) -> bool {
        self.apply(ProjectChange::AddTaskRef(task_id), clock.utc())
    }

    /// Removes a task reference. Returns `false` when it was absent.
    pub fn remove_task_ref(&mut self, task_id: TaskId, clock: &impl Clock) -> bool {
        self.apply(ProjectChange::RemoveTaskRef(task_id), clock.utc())
    }

    /// Applies a set-valued change stamped at `at`. Returns `false` when the
    /// project already reflected it.
    pub fn apply(&mut self, change: ProjectChange, at: DateTime<Utc>) -> bool {
        self.mutate(at, |project| match change {
            ProjectChange::AddMember(user) => insert_unique(&mut project.members, user),
            ProjectChange::RemoveMember(user) => {
                user != project.owner && remove_value(&mut project.members, user)
            }
            ProjectChange::AddTaskRef(task_id) => insert_unique(&mut project.tasks, task_id),
            ProjectChange::RemoveTaskRef(task_id) => remove_value(&mut project.tasks, task_id),
        })
    }

    /// Replaces the name and, when given, the description.
    ///
    /// `description` of `Some(None)` clears it. Returns `false` when both
    /// already held the requested values.
    pub fn rename(
        &mut self,
        name: Option<ProjectName>,
        description: Option<Option<ProjectDescription>>,
        clock: &impl Clock,
    ) -> bool {
        self.mutate(clock.utc(), |project| {
            let mut changed = false;
            if let Some(new_name) = name.filter(|candidate| *candidate != project.name) {
                project.name = new_name;
                changed = true;
            }
            if let Some(new_description) =
                description.filter(|candidate| *candidate != project.description)
            {
                project.description = new_description;
                changed = true;
            }
            changed
        })
    }

    /// Records the version assigned by the repository after a successful
    /// update.
    pub const fn record_commit(&mut self, version: u64) {
        self.version = version;
    }

    /// Single entry point for every mutation: applies `change`, re-checks
    /// the owner-membership invariant and bumps `updated_at` on change.
    fn mutate(&mut self, at: DateTime<Utc>, change: impl FnOnce(&mut Self) -> bool) -> bool {
        let mut changed = change(self);
        if !self.members.contains(&self.owner) {
            self.members.insert(0, self.owner);
            changed = true;
        }
        if changed {
            self.updated_at = at;
        }
        changed
    }
}

fn insert_unique<T: PartialEq>(values: &mut Vec<T>, value: T) -> bool {
    if values.contains(&value) {
        return false;
    }
    values.push(value);
    true
}

fn remove_value<T: PartialEq>(values: &mut Vec<T>, value: T) -> bool {
    let before = values.len();
    values.retain(|existing| *existing != value);
    values.len() != before
}

fn dedup_preserving_order<T: PartialEq>(values: Vec<T>) -> Vec<T> {
    let mut unique: Vec<T> = Vec::with_capacity(values.len());
    for value in values {
        if !unique.contains(&value) {
            unique.push(value);
        }
    }
    unique
}
