//! Diesel schema for task persistence.

diesel::table! {
    /// Task records.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Owning project.
        project_id -> Uuid,
        /// Title.
        #[max_length = 200]
        title -> Varchar,
        /// Optional description.
        #[max_length = 1000]
        description -> Nullable<Varchar>,
        /// Status label.
        #[max_length = 16]
        status -> Varchar,
        /// Priority label.
        #[max_length = 16]
        priority -> Varchar,
        /// Optional due date.
        due_date -> Nullable<Timestamptz>,
        /// Optional assignee.
        assignee_id -> Nullable<Uuid>,
        /// Creator.
        created_by -> Uuid,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
