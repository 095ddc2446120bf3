//! Diesel row models for invitation persistence.

use super::schema::invitations;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for invitation records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = invitations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct InvitationRow {
    /// Invitation identifier.
    pub id: uuid::Uuid,
    /// Target project.
    pub project_id: uuid::Uuid,
    /// Inviter identifier.
    pub inviter_id: uuid::Uuid,
    /// Invitee identifier.
    pub invitee_id: uuid::Uuid,
    /// Status string.
    pub status: String,
    /// Message text.
    pub message: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest transition timestamp.
    pub updated_at: DateTime<Utc>,
    /// Expiry deadline.
    pub expires_at: DateTime<Utc>,
}

/// Insert model for invitation records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = invitations)]
pub struct NewInvitationRow {
    /// Invitation identifier.
    pub id: uuid::Uuid,
    /// Target project.
    pub project_id: uuid::Uuid,
    /// Inviter identifier.
    pub inviter_id: uuid::Uuid,
    /// Invitee identifier.
    pub invitee_id: uuid::Uuid,
    /// Status string.
    pub status: String,
    /// Message text.
    pub message: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest transition timestamp.
    pub updated_at: DateTime<Utc>,
    /// Expiry deadline.
    pub expires_at: DateTime<Utc>,
}
