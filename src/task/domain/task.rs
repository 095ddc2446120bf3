//! Task aggregate root.

use super::{TaskDescription, TaskId, TaskPriority, TaskStatus, TaskTitle};
use crate::identity::domain::UserId;
use crate::project::domain::ProjectId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: i64 = 86_400;

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: TaskId,
    project_id: ProjectId,
    title: TaskTitle,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<TaskDescription>,
    status: TaskStatus,
    priority: TaskPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee: Option<UserId>,
    created_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Validated inputs for a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Owning project.
    pub project_id: ProjectId,
    /// Title.
    pub title: TaskTitle,
    /// Optional description.
    pub description: Option<TaskDescription>,
    /// Priority.
    pub priority: TaskPriority,
    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Optional assignee.
    pub assignee: Option<UserId>,
    /// Creator.
    pub created_by: UserId,
}

/// Partial update of a task. `None` leaves a field untouched; for optional
/// fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    /// New title.
    pub title: Option<TaskTitle>,
    /// New description.
    pub description: Option<Option<TaskDescription>>,
    /// New status.
    pub status: Option<TaskStatus>,
    /// New priority.
    pub priority: Option<TaskPriority>,
    /// New due date.
    pub due_date: Option<Option<DateTime<Utc>>>,
    /// New assignee.
    pub assignee: Option<Option<UserId>>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted owning project.
    pub project_id: ProjectId,
    /// Persisted title.
    pub title: TaskTitle,
    /// Persisted description.
    pub description: Option<TaskDescription>,
    /// Persisted status.
    pub status: TaskStatus,
    /// Persisted priority.
    pub priority: TaskPriority,
    /// Persisted due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Persisted assignee.
    pub assignee: Option<UserId>,
    /// Persisted creator.
    pub created_by: UserId,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a task in the `To Do` state.
    #[must_use]
    pub fn new(params: NewTask, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            project_id: params.project_id,
            title: params.title,
            description: params.description,
            status: TaskStatus::default(),
            priority: params.priority,
            due_date: params.due_date,
            assignee: params.assignee,
            created_by: params.created_by,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            title: data.title,
            description: data.description,
            status: data.status,
            priority: data.priority,
            due_date: data.due_date,
            assignee: data.assignee,
            created_by: data.created_by,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the description, if any.
    #[must_use]
    pub const fn description(&self) -> Option<&TaskDescription> {
        self.description.as_ref()
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the due date, if any.
    #[must_use]
    pub const fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Returns the assignee, if any.
    #[must_use]
    pub const fn assignee(&self) -> Option<UserId> {
        self.assignee
    }

    /// Returns the creator.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` when the due date has passed and the task is not done.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status != TaskStatus::Done && self.due_date.is_some_and(|due| now > due)
    }

    /// Whole days until the due date, rounded up. Negative once overdue.
    #[must_use]
    pub fn days_until_due(&self, now: DateTime<Utc>) -> Option<i64> {
        self.due_date.map(|due| {
            let seconds = (due - now).num_seconds();
            let whole_days = seconds.div_euclid(SECONDS_PER_DAY);
            if seconds.rem_euclid(SECONDS_PER_DAY) > 0 {
                whole_days + 1
            } else {
                whole_days
            }
        })
    }

    /// Applies `changes`, bumping `updated_at`.
    pub fn apply(&mut self, changes: TaskChanges, clock: &impl Clock) {
        let TaskChanges {
            title,
            description,
            status,
            priority,
            due_date,
            assignee,
        } = changes;
        if let Some(value) = title {
            self.title = value;
        }
        if let Some(value) = description {
            self.description = value;
        }
        if let Some(value) = status {
            self.status = value;
        }
        if let Some(value) = priority {
            self.priority = value;
        }
        if let Some(value) = due_date {
            self.due_date = value;
        }
        if let Some(value) = assignee {
            self.assignee = value;
        }
        self.updated_at = clock.utc();
    }
}
