//! Diesel schema for project persistence.

diesel::table! {
    /// Project records.
    projects (id) {
        /// Project identifier.
        id -> Uuid,
        /// Project name.
        #[max_length = 100]
        name -> Varchar,
        /// Optional description.
        #[max_length = 500]
        description -> Nullable<Varchar>,
        /// Immutable owner.
        owner_id -> Uuid,
        /// Optimistic-concurrency version.
        version -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Project membership, one row per member.
    project_members (project_id, user_id) {
        /// Owning project.
        project_id -> Uuid,
        /// Member user identifier.
        user_id -> Uuid,
        /// Insertion order for display.
        position -> Int4,
    }
}

diesel::table! {
    /// Task references held by a project.
    project_tasks (project_id, task_id) {
        /// Owning project.
        project_id -> Uuid,
        /// Referenced task.
        task_id -> Uuid,
        /// Insertion order.
        position -> Int4,
    }
}

diesel::joinable!(project_members -> projects (project_id));
diesel::joinable!(project_tasks -> projects (project_id));
diesel::allow_tables_to_appear_in_same_query!(projects, project_members, project_tasks);
