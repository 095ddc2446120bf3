//! Diesel schema for invitation persistence.

diesel::table! {
    /// Invitation records.
    invitations (id) {
        /// Invitation identifier.
        id -> Uuid,
        /// Target project.
        project_id -> Uuid,
        /// Project owner who sent the invitation.
        inviter_id -> Uuid,
        /// Invited user.
        invitee_id -> Uuid,
        /// Lifecycle status.
        #[max_length = 16]
        status -> Varchar,
        /// Message shown to the invitee.
        #[max_length = 500]
        message -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Latest transition timestamp.
        updated_at -> Timestamptz,
        /// Expiry deadline.
        expires_at -> Timestamptz,
    }
}
