//! Diesel row models for project persistence.

use super::schema::{project_members, project_tasks, projects};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for project records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProjectRow {
    /// Project identifier.
    pub id: uuid::Uuid,
    /// Project name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Owner identifier.
    pub owner_id: uuid::Uuid,
    /// Optimistic-concurrency version.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for project records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = projects)]
pub struct NewProjectRow {
    /// Project identifier.
    pub id: uuid::Uuid,
    /// Project name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Owner identifier.
    pub owner_id: uuid::Uuid,
    /// Initial version.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for membership rows.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = project_members)]
pub struct NewMemberRow {
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Member user identifier.
    pub user_id: uuid::Uuid,
    /// Display position.
    pub position: i32,
}

/// Insert model for task reference rows.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = project_tasks)]
pub struct NewTaskRefRow {
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Referenced task.
    pub task_id: uuid::Uuid,
    /// Insertion order.
    pub position: i32,
}
